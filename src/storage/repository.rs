//! SQLite repository for F1 seasons, line-ups and results

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

use super::models::{
    Circuit, Driver, Event, NewCircuit, NewDriver, NewSession, NewSessionResult, NewTeam,
    RaceResultRow, Season, Session, SessionResult, SessionType, Team,
};
use super::schema::create_tables;
use crate::pagination::PageParams;

const SEASON_COLUMNS: &str = "id, year";
const TEAM_COLUMNS: &str = "id, ref, name";
const DRIVER_COLUMNS: &str = "id, ref, code, permanent_number, first_name, last_name, \
     date_of_birth, nationality, country_code";
const CIRCUIT_COLUMNS: &str = "id, ref, name, country_code, city, latitude, longitude";
const SESSION_COLUMNS: &str = "id, event_id, type, name, session_order, started_at";
const RESULT_COLUMNS: &str = "id, session_id, entry_id, position, points, status, time_ms, \
     gap_ms, laps, grid, classified";

fn season_from_row(row: &Row<'_>) -> rusqlite::Result<Season> {
    Ok(Season {
        id: row.get(0)?,
        year: row.get(1)?,
    })
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row.get(0)?,
        r#ref: row.get(1)?,
        name: row.get(2)?,
    })
}

fn driver_from_row(row: &Row<'_>) -> rusqlite::Result<Driver> {
    Ok(Driver {
        id: row.get(0)?,
        r#ref: row.get(1)?,
        code: row.get(2)?,
        permanent_number: row.get(3)?,
        first_name: row.get(4)?,
        last_name: row.get(5)?,
        date_of_birth: row.get(6)?,
        nationality: row.get(7)?,
        country_code: row.get(8)?,
    })
}

fn circuit_from_row(row: &Row<'_>) -> rusqlite::Result<Circuit> {
    Ok(Circuit {
        id: row.get(0)?,
        r#ref: row.get(1)?,
        name: row.get(2)?,
        country_code: row.get(3)?,
        city: row.get(4)?,
        latitude: row.get(5)?,
        longitude: row.get(6)?,
    })
}

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        season_id: row.get(1)?,
        circuit_id: row.get(2)?,
        round: row.get(3)?,
        name: row.get(4)?,
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        event_id: row.get(1)?,
        session_type: row.get(2)?,
        name: row.get(3)?,
        session_order: row.get(4)?,
        started_at: row.get(5)?,
    })
}

fn result_from_row(row: &Row<'_>) -> rusqlite::Result<SessionResult> {
    Ok(SessionResult {
        id: row.get(0)?,
        session_id: row.get(1)?,
        entry_id: row.get(2)?,
        position: row.get(3)?,
        points: row.get::<_, Option<f64>>(4)?.unwrap_or(0.0),
        status: row.get(5)?,
        time_ms: row.get(6)?,
        gap_ms: row.get(7)?,
        laps: row.get(8)?,
        grid: row.get(9)?,
        classified: row.get(10)?,
    })
}

/// Repository for F1 data
pub struct F1Repository {
    conn: Connection,
}

impl F1Repository {
    /// Create a new repository, initializing the database if needed
    pub fn new(db_path: &Path) -> Result<Self> {
        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create database directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open database")?;

        // Enable foreign keys
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        // Create tables if they don't exist
        create_tables(&conn)?;

        Ok(Self { conn })
    }

    /// Create an in-memory repository (for testing)
    #[cfg(test)]
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        create_tables(&conn)?;
        Ok(Self { conn })
    }

    // ==================== Seeding Operations ====================
    //
    // Each helper inserts the row unless its natural key already exists and
    // returns the id of the stored row either way.

    /// Get or create a season by year
    pub fn get_or_create_season(&self, year: i32) -> Result<i64> {
        self.conn
            .execute("INSERT OR IGNORE INTO seasons (year) VALUES (?1)", [year])?;
        let id = self
            .conn
            .query_row("SELECT id FROM seasons WHERE year = ?1", [year], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    /// Get or create a team by ref
    pub fn get_or_create_team(&self, team: &NewTeam) -> Result<i64> {
        self.conn.execute(
            "INSERT OR IGNORE INTO teams (ref, name) VALUES (?1, ?2)",
            params![team.r#ref, team.name],
        )?;
        let id = self
            .conn
            .query_row("SELECT id FROM teams WHERE ref = ?1", [&team.r#ref], |row| {
                row.get(0)
            })?;
        Ok(id)
    }

    /// Get or create a driver by ref
    pub fn get_or_create_driver(&self, driver: &NewDriver) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO drivers
            (ref, code, permanent_number, first_name, last_name, date_of_birth,
             nationality, country_code)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                driver.r#ref,
                driver.code,
                driver.permanent_number,
                driver.first_name,
                driver.last_name,
                driver.date_of_birth,
                driver.nationality,
                driver.country_code,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM drivers WHERE ref = ?1",
            [&driver.r#ref],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get or create a season line-up entry
    pub fn get_or_create_entry(
        &self,
        season_id: i64,
        team_id: i64,
        driver_id: i64,
        car_number: Option<i32>,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO entries (season_id, team_id, driver_id, car_number)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![season_id, team_id, driver_id, car_number],
        )?;
        // A driver already entered for another team this season is left untouched.
        let id = self
            .conn
            .query_row(
                "SELECT id FROM entries WHERE season_id = ?1 AND team_id = ?2 AND driver_id = ?3",
                params![season_id, team_id, driver_id],
                |row| row.get(0),
            )
            .with_context(|| {
                format!(
                    "Driver {} already has a different entry in season {}",
                    driver_id, season_id
                )
            })?;
        Ok(id)
    }

    /// Get or create a circuit by ref
    pub fn get_or_create_circuit(&self, circuit: &NewCircuit) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO circuits
            (ref, name, country_code, city, latitude, longitude)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                circuit.r#ref,
                circuit.name,
                circuit.country_code,
                circuit.city,
                circuit.latitude,
                circuit.longitude,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM circuits WHERE ref = ?1",
            [&circuit.r#ref],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get or create an event by (season, round)
    pub fn get_or_create_event(
        &self,
        season_id: i64,
        circuit_id: i64,
        round: i32,
        name: &str,
    ) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO events (season_id, circuit_id, round, name)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![season_id, circuit_id, round, name],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM events WHERE season_id = ?1 AND round = ?2",
            params![season_id, round],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get or create a session by (event, type, order)
    pub fn get_or_create_session(&self, session: &NewSession) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO sessions (event_id, type, name, session_order, started_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                session.event_id,
                session.session_type,
                session.name,
                session.session_order,
                session.started_at,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM sessions WHERE event_id = ?1 AND type = ?2 AND session_order = ?3",
            params![session.event_id, session.session_type, session.session_order],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// Get or create a result by (session, entry)
    pub fn get_or_create_session_result(&self, result: &NewSessionResult) -> Result<i64> {
        self.conn.execute(
            r#"
            INSERT OR IGNORE INTO session_results
            (session_id, entry_id, position, points, status, time_ms, gap_ms,
             laps, grid, classified)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                result.session_id,
                result.entry_id,
                result.position,
                result.points,
                result.status,
                result.time_ms,
                result.gap_ms,
                result.laps,
                result.grid,
                result.classified,
            ],
        )?;
        let id = self.conn.query_row(
            "SELECT id FROM session_results WHERE session_id = ?1 AND entry_id = ?2",
            params![result.session_id, result.entry_id],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    // ==================== Query Operations ====================

    fn count(&self, sql: &str, params: impl rusqlite::Params) -> Result<u64> {
        let count: i64 = self.conn.query_row(sql, params, |row| row.get(0))?;
        Ok(count as u64)
    }

    /// List seasons ordered by year, with the total count
    pub fn list_seasons(&self, page: PageParams) -> Result<(Vec<Season>, u64)> {
        let total = self.count("SELECT COUNT(*) FROM seasons", [])?;

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM seasons ORDER BY year LIMIT ?1 OFFSET ?2",
            SEASON_COLUMNS
        ))?;
        let seasons = stmt
            .query_map(params![page.limit, page.offset], season_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((seasons, total))
    }

    /// Get a season by id
    pub fn get_season(&self, id: i64) -> Result<Option<Season>> {
        let season = self
            .conn
            .query_row(
                &format!("SELECT {} FROM seasons WHERE id = ?1", SEASON_COLUMNS),
                [id],
                season_from_row,
            )
            .optional()?;
        Ok(season)
    }

    /// Resolve a season by its year
    pub fn find_season_by_year(&self, year: i32) -> Result<Option<Season>> {
        let season = self
            .conn
            .query_row(
                &format!("SELECT {} FROM seasons WHERE year = ?1", SEASON_COLUMNS),
                [year],
                season_from_row,
            )
            .optional()?;
        Ok(season)
    }

    /// List teams ordered by name, optionally filtered by ref
    pub fn list_teams(&self, team_ref: Option<&str>, page: PageParams) -> Result<(Vec<Team>, u64)> {
        let total = self.count(
            "SELECT COUNT(*) FROM teams WHERE (?1 IS NULL OR ref = ?1)",
            [team_ref],
        )?;

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM teams
            WHERE (?1 IS NULL OR ref = ?1)
            ORDER BY name, id
            LIMIT ?2 OFFSET ?3
            "#,
            TEAM_COLUMNS
        ))?;
        let teams = stmt
            .query_map(params![team_ref, page.limit, page.offset], team_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((teams, total))
    }

    /// Get a team by id
    pub fn get_team(&self, id: i64) -> Result<Option<Team>> {
        let team = self
            .conn
            .query_row(
                &format!("SELECT {} FROM teams WHERE id = ?1", TEAM_COLUMNS),
                [id],
                team_from_row,
            )
            .optional()?;
        Ok(team)
    }

    /// List drivers ordered by last then first name, optionally filtered by ref and code
    pub fn list_drivers(
        &self,
        driver_ref: Option<&str>,
        code: Option<&str>,
        page: PageParams,
    ) -> Result<(Vec<Driver>, u64)> {
        let total = self.count(
            r#"
            SELECT COUNT(*) FROM drivers
            WHERE (?1 IS NULL OR ref = ?1) AND (?2 IS NULL OR code = ?2)
            "#,
            [driver_ref, code],
        )?;

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM drivers
            WHERE (?1 IS NULL OR ref = ?1) AND (?2 IS NULL OR code = ?2)
            ORDER BY last_name, first_name, id
            LIMIT ?3 OFFSET ?4
            "#,
            DRIVER_COLUMNS
        ))?;
        let drivers = stmt
            .query_map(
                params![driver_ref, code, page.limit, page.offset],
                driver_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((drivers, total))
    }

    /// Get a driver by id
    pub fn get_driver(&self, id: i64) -> Result<Option<Driver>> {
        let driver = self
            .conn
            .query_row(
                &format!("SELECT {} FROM drivers WHERE id = ?1", DRIVER_COLUMNS),
                [id],
                driver_from_row,
            )
            .optional()?;
        Ok(driver)
    }

    /// List circuits ordered by name, optionally filtered by ref
    pub fn list_circuits(
        &self,
        circuit_ref: Option<&str>,
        page: PageParams,
    ) -> Result<(Vec<Circuit>, u64)> {
        let total = self.count(
            "SELECT COUNT(*) FROM circuits WHERE (?1 IS NULL OR ref = ?1)",
            [circuit_ref],
        )?;

        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM circuits
            WHERE (?1 IS NULL OR ref = ?1)
            ORDER BY name, id
            LIMIT ?2 OFFSET ?3
            "#,
            CIRCUIT_COLUMNS
        ))?;
        let circuits = stmt
            .query_map(
                params![circuit_ref, page.limit, page.offset],
                circuit_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((circuits, total))
    }

    /// Get a circuit by id
    pub fn get_circuit(&self, id: i64) -> Result<Option<Circuit>> {
        let circuit = self
            .conn
            .query_row(
                &format!("SELECT {} FROM circuits WHERE id = ?1", CIRCUIT_COLUMNS),
                [id],
                circuit_from_row,
            )
            .optional()?;
        Ok(circuit)
    }

    /// List events ordered by round, optionally restricted to one season year
    pub fn list_events(
        &self,
        season_year: Option<i32>,
        page: PageParams,
    ) -> Result<(Vec<Event>, u64)> {
        let total = self.count(
            r#"
            SELECT COUNT(*)
            FROM events e
            JOIN seasons s ON s.id = e.season_id
            WHERE (?1 IS NULL OR s.year = ?1)
            "#,
            [season_year],
        )?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT e.id, e.season_id, e.circuit_id, e.round, e.name
            FROM events e
            JOIN seasons s ON s.id = e.season_id
            WHERE (?1 IS NULL OR s.year = ?1)
            ORDER BY e.round, s.year, e.id
            LIMIT ?2 OFFSET ?3
            "#,
        )?;
        let events = stmt
            .query_map(params![season_year, page.limit, page.offset], event_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok((events, total))
    }

    /// Get an event by id
    pub fn get_event(&self, id: i64) -> Result<Option<Event>> {
        let event = self
            .conn
            .query_row(
                "SELECT id, season_id, circuit_id, round, name FROM events WHERE id = ?1",
                [id],
                event_from_row,
            )
            .optional()?;
        Ok(event)
    }

    /// Get sessions of an event in running order
    pub fn sessions_for_event(&self, event_id: i64) -> Result<Vec<Session>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM sessions WHERE event_id = ?1 ORDER BY session_order, id",
            SESSION_COLUMNS
        ))?;
        let sessions = stmt
            .query_map([event_id], session_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(sessions)
    }

    /// Get a session by id
    pub fn get_session(&self, id: i64) -> Result<Option<Session>> {
        let session = self
            .conn
            .query_row(
                &format!("SELECT {} FROM sessions WHERE id = ?1", SESSION_COLUMNS),
                [id],
                session_from_row,
            )
            .optional()?;
        Ok(session)
    }

    /// Get results of a session, classified finishers first
    pub fn results_for_session(&self, session_id: i64) -> Result<Vec<SessionResult>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {}
            FROM session_results
            WHERE session_id = ?1
            ORDER BY position IS NULL, position, id
            "#,
            RESULT_COLUMNS
        ))?;
        let results = stmt
            .query_map([session_id], result_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(results)
    }

    /// Get every race-session result of a season joined with driver and team
    pub fn race_results_for_season(&self, season_id: i64) -> Result<Vec<RaceResultRow>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT d.id, d.ref, d.code, d.first_name, d.last_name,
                   t.id, t.ref, t.name,
                   sr.points, sr.position
            FROM session_results sr
            JOIN entries en ON en.id = sr.entry_id
            JOIN drivers d ON d.id = en.driver_id
            JOIN teams t ON t.id = en.team_id
            JOIN sessions s ON s.id = sr.session_id
            WHERE en.season_id = ?1 AND s.type = ?2
            ORDER BY sr.id
            "#,
        )?;

        let rows = stmt
            .query_map(params![season_id, SessionType::Race], |row| {
                Ok(RaceResultRow {
                    driver_id: row.get(0)?,
                    driver_ref: row.get(1)?,
                    driver_code: row.get(2)?,
                    driver_first_name: row.get(3)?,
                    driver_last_name: row.get(4)?,
                    team_id: row.get(5)?,
                    team_ref: row.get(6)?,
                    team_name: row.get(7)?,
                    points: row.get(8)?,
                    position: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
