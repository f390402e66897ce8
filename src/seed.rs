//! Minimal reference dataset.
//!
//! Season 2024 opener: Red Bull's two drivers at Bahrain with a practice,
//! qualifying and race session and a 1-2 race result.

use anyhow::{Context, Result};
use chrono::NaiveDate;

use crate::storage::models::{
    NewCircuit, NewDriver, NewSession, NewSessionResult, NewTeam, SessionType,
};
use crate::storage::F1Repository;

/// Counts of what the seed touched, for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedSummary {
    pub season_id: i64,
    pub race_session_id: i64,
    pub results: usize,
}

fn at(date: (i32, u32, u32), hour: u32) -> Option<chrono::NaiveDateTime> {
    NaiveDate::from_ymd_opt(date.0, date.1, date.2).and_then(|d| d.and_hms_opt(hour, 0, 0))
}

/// Seed the 2024 Bahrain Grand Prix. Safe to run repeatedly.
pub fn seed_minimal_2024(repo: &F1Repository) -> Result<SeedSummary> {
    let season_id = repo.get_or_create_season(2024)?;

    let rbr = repo.get_or_create_team(&NewTeam {
        r#ref: "red_bull_racing".to_string(),
        name: "Red Bull Racing".to_string(),
    })?;

    let max = repo.get_or_create_driver(&NewDriver {
        r#ref: "max_verstappen".to_string(),
        code: Some("VER".to_string()),
        permanent_number: Some(1),
        first_name: "Max".to_string(),
        last_name: "Verstappen".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1997, 9, 30).context("Invalid birth date")?,
        nationality: Some("Dutch".to_string()),
        country_code: Some("NLD".to_string()),
    })?;

    let checo = repo.get_or_create_driver(&NewDriver {
        r#ref: "sergio_perez".to_string(),
        code: Some("PER".to_string()),
        permanent_number: Some(11),
        first_name: "Sergio".to_string(),
        last_name: "Pérez".to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 26).context("Invalid birth date")?,
        nationality: Some("Mexican".to_string()),
        country_code: Some("MEX".to_string()),
    })?;

    let e_max = repo.get_or_create_entry(season_id, rbr, max, Some(1))?;
    let e_checo = repo.get_or_create_entry(season_id, rbr, checo, Some(11))?;

    let sakhir = repo.get_or_create_circuit(&NewCircuit {
        r#ref: "sakhir".to_string(),
        name: "Bahrain International Circuit".to_string(),
        country_code: Some("BHR".to_string()),
        city: Some("Sakhir".to_string()),
        latitude: None,
        longitude: None,
    })?;

    let bahrain = repo.get_or_create_event(season_id, sakhir, 1, "Bahrain Grand Prix")?;

    let sessions = [
        (SessionType::Practice, 1, "Practice", at((2024, 2, 29), 12)),
        (SessionType::Qualifying, 2, "Qualifying", at((2024, 3, 1), 18)),
        (SessionType::Race, 3, "Race", at((2024, 3, 2), 18)),
    ];
    let mut race_session_id = 0;
    for (session_type, session_order, name, started_at) in sessions {
        let id = repo.get_or_create_session(&NewSession {
            event_id: bahrain,
            session_type,
            session_order,
            name: name.to_string(),
            started_at,
        })?;
        if session_type == SessionType::Race {
            race_session_id = id;
        }
    }

    let results = [
        (e_max, 1, 25.0, 1),
        (e_checo, 2, 18.0, 5),
    ];
    for &(entry_id, position, points, grid) in &results {
        repo.get_or_create_session_result(&NewSessionResult {
            session_id: race_session_id,
            entry_id,
            position: Some(position),
            points,
            status: Some("FINISHED".to_string()),
            laps: Some(57),
            grid: Some(grid),
            classified: true,
            ..Default::default()
        })?;
    }

    tracing::info!(season_id, race_session_id, "Seeded 2024 Bahrain Grand Prix");

    Ok(SeedSummary {
        season_id,
        race_session_id,
        results: results.len(),
    })
}
