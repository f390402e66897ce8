//! SQLite schema definitions for F1 data
//!
//! Tables:
//! - seasons: Championship years
//! - teams: Constructors
//! - drivers: Driver biographies
//! - entries: Season line-ups (season, team, driver)
//! - circuits: Venues
//! - events: Grands Prix within a season
//! - sessions: Practice, qualifying and race sessions of an event
//! - session_results: Classified order and points per session entry

use rusqlite::{Connection, Result};

/// Create all tables in the database
pub fn create_tables(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS seasons (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            year INTEGER NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_seasons_year UNIQUE(year)
        );

        CREATE TABLE IF NOT EXISTS teams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ref TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_teams_ref UNIQUE(ref)
        );

        CREATE TABLE IF NOT EXISTS drivers (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ref TEXT NOT NULL,
            code TEXT,
            permanent_number INTEGER,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            nationality TEXT,
            country_code TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_drivers_ref UNIQUE(ref)
        );

        CREATE TABLE IF NOT EXISTS entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season_id INTEGER NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
            team_id INTEGER NOT NULL REFERENCES teams(id),
            driver_id INTEGER NOT NULL REFERENCES drivers(id),
            car_number INTEGER,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_entries_season_driver UNIQUE(season_id, driver_id),
            CONSTRAINT uq_entries_season_team_driver UNIQUE(season_id, team_id, driver_id)
        );

        CREATE TABLE IF NOT EXISTS circuits (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ref TEXT NOT NULL,
            name TEXT NOT NULL,
            country_code TEXT,
            city TEXT,
            latitude REAL,
            longitude REAL,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_circuits_ref UNIQUE(ref)
        );

        CREATE TABLE IF NOT EXISTS events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            season_id INTEGER NOT NULL REFERENCES seasons(id) ON DELETE CASCADE,
            circuit_id INTEGER NOT NULL REFERENCES circuits(id),
            round INTEGER NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_events_season_round UNIQUE(season_id, round)
        );

        CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            event_id INTEGER NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            type TEXT NOT NULL CHECK (type IN ('FP', 'Q', 'RACE')),
            name TEXT NOT NULL,
            session_order INTEGER NOT NULL DEFAULT 1,
            started_at TEXT,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_sessions_event_type_order UNIQUE(event_id, type, session_order)
        );

        CREATE TABLE IF NOT EXISTS session_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            session_id INTEGER NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
            entry_id INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
            position INTEGER,
            points REAL DEFAULT 0,
            status TEXT,
            time_ms INTEGER,
            gap_ms INTEGER,
            laps INTEGER,
            grid INTEGER,
            classified INTEGER NOT NULL DEFAULT 1,
            created_at TEXT DEFAULT (datetime('now')),
            CONSTRAINT uq_results_session_entry UNIQUE(session_id, entry_id)
        );

        CREATE INDEX IF NOT EXISTS ix_entries_season ON entries(season_id);
        CREATE INDEX IF NOT EXISTS ix_events_season ON events(season_id);
        CREATE INDEX IF NOT EXISTS ix_sessions_event ON sessions(event_id);
        CREATE INDEX IF NOT EXISTS ix_results_session ON session_results(session_id);
        CREATE INDEX IF NOT EXISTS ix_results_session_pos ON session_results(session_id, position);
        CREATE INDEX IF NOT EXISTS ix_results_entry ON session_results(entry_id);
        "#,
    )
}
