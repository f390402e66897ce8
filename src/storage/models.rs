//! Row types for the F1 schema.
//!
//! Records are read-only views of a table row and serialize directly into
//! API responses. `New*` types carry the natural key and attributes used by
//! the seeding helpers.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Kind of on-track session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SessionType {
    #[serde(rename = "FP")]
    Practice,
    #[serde(rename = "Q")]
    Qualifying,
    #[serde(rename = "RACE")]
    Race,
}

impl SessionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionType::Practice => "FP",
            SessionType::Qualifying => "Q",
            SessionType::Race => "RACE",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SessionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FP" => Ok(SessionType::Practice),
            "Q" => Ok(SessionType::Qualifying),
            "RACE" => Ok(SessionType::Race),
            other => Err(format!("unknown session type: {}", other)),
        }
    }
}

impl ToSql for SessionType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for SessionType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Season {
    pub id: i64,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Team {
    pub id: i64,
    pub r#ref: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Driver {
    pub id: i64,
    pub r#ref: String,
    pub code: Option<String>,
    pub permanent_number: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Circuit {
    pub id: i64,
    pub r#ref: String,
    pub name: String,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Event {
    pub id: i64,
    pub season_id: i64,
    pub circuit_id: i64,
    pub round: i32,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub id: i64,
    pub event_id: i64,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub name: String,
    pub session_order: i32,
    pub started_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResult {
    pub id: i64,
    pub session_id: i64,
    pub entry_id: i64,
    pub position: Option<i32>,
    pub points: f64,
    pub status: Option<String>,
    pub time_ms: Option<i64>,
    pub gap_ms: Option<i64>,
    pub laps: Option<i32>,
    pub grid: Option<i32>,
    pub classified: bool,
}

/// A joined race result row feeding the standings aggregation.
///
/// `points` stays nullable here; callers decide how to treat a missing value.
#[derive(Debug, Clone, PartialEq)]
pub struct RaceResultRow {
    pub driver_id: i64,
    pub driver_ref: String,
    pub driver_code: Option<String>,
    pub driver_first_name: String,
    pub driver_last_name: String,
    pub team_id: i64,
    pub team_ref: String,
    pub team_name: String,
    pub points: Option<f64>,
    pub position: Option<i32>,
}

// ==================== Seeding inputs ====================

#[derive(Debug, Clone)]
pub struct NewTeam {
    pub r#ref: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct NewDriver {
    pub r#ref: String,
    pub code: Option<String>,
    pub permanent_number: Option<i32>,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: NaiveDate,
    pub nationality: Option<String>,
    pub country_code: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewCircuit {
    pub r#ref: String,
    pub name: String,
    pub country_code: Option<String>,
    pub city: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct NewSession {
    pub event_id: i64,
    pub session_type: SessionType,
    pub session_order: i32,
    pub name: String,
    pub started_at: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, Default)]
pub struct NewSessionResult {
    pub session_id: i64,
    pub entry_id: i64,
    pub position: Option<i32>,
    pub points: f64,
    pub status: Option<String>,
    pub time_ms: Option<i64>,
    pub gap_ms: Option<i64>,
    pub laps: Option<i32>,
    pub grid: Option<i32>,
    pub classified: bool,
}
