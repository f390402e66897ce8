//! Championship standings aggregated from race results.
//!
//! Both tables are built the same way: group the season's race-session
//! results, total the points and count the wins, sort, cut the requested
//! window and number it.

use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::pagination::PageParams;
use crate::storage::models::RaceResultRow;
use crate::storage::F1Repository;

/// Errors raised while computing standings
#[derive(Debug, Error)]
pub enum StandingsError {
    #[error("Season {0} not found")]
    SeasonNotFound(i32),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Driver championship standing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverStanding {
    pub position: u64,
    pub driver_id: i64,
    pub driver_ref: String,
    pub driver_code: Option<String>,
    pub driver_first_name: String,
    pub driver_last_name: String,
    pub team_id: i64,
    pub team_name: String,
    pub points: f64,
    pub wins: u32,
}

/// Constructor (team) championship standing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorStanding {
    pub position: u64,
    pub team_id: i64,
    pub team_ref: String,
    pub team_name: String,
    pub points: f64,
    pub wins: u32,
}

/// Position of the `index`-th row of a window starting at `offset`.
///
/// Positions follow sort order, so rows level on points still get distinct
/// numbers. A shared-rank scheme would replace this function.
pub fn window_position(offset: u32, index: usize) -> u64 {
    u64::from(offset) + index as u64 + 1
}

/// Running totals for one group of results
#[derive(Debug, Default)]
struct Tally {
    points: f64,
    wins: u32,
}

impl Tally {
    fn add(&mut self, row: &RaceResultRow) {
        // A missing points value counts as zero
        self.points += row.points.unwrap_or(0.0);
        if row.position == Some(1) {
            self.wins += 1;
        }
    }
}

/// Sort, cut the window and attach positions.
fn rank<T, F>(mut rows: Vec<T>, page: PageParams, compare: F) -> impl Iterator<Item = (u64, T)>
where
    F: FnMut(&T, &T) -> Ordering,
{
    rows.sort_by(compare);
    rows.into_iter()
        .skip(page.offset as usize)
        .take(page.limit as usize)
        .enumerate()
        .map(move |(i, row)| (window_position(page.offset, i), row))
}

/// Build the driver table from a season's race results.
///
/// Rows are grouped per (driver, team), so a driver who changed teams during
/// the season appears once per team. Sorted by points descending, then last
/// name ascending.
pub fn aggregate_driver_standings(rows: &[RaceResultRow], page: PageParams) -> Vec<DriverStanding> {
    let mut groups: BTreeMap<(i64, i64), (&RaceResultRow, Tally)> = BTreeMap::new();
    for row in rows {
        groups
            .entry((row.driver_id, row.team_id))
            .or_insert_with(|| (row, Tally::default()))
            .1
            .add(row);
    }

    let tallies: Vec<_> = groups.into_values().collect();
    rank(tallies, page, |(a, ta), (b, tb)| {
        tb.points
            .total_cmp(&ta.points)
            .then_with(|| a.driver_last_name.cmp(&b.driver_last_name))
    })
    .map(|(position, (row, tally))| DriverStanding {
        position,
        driver_id: row.driver_id,
        driver_ref: row.driver_ref.clone(),
        driver_code: row.driver_code.clone(),
        driver_first_name: row.driver_first_name.clone(),
        driver_last_name: row.driver_last_name.clone(),
        team_id: row.team_id,
        team_name: row.team_name.clone(),
        points: tally.points,
        wins: tally.wins,
    })
    .collect()
}

/// Build the constructor table from a season's race results.
///
/// Sorted by points descending, then team name ascending.
pub fn aggregate_constructor_standings(
    rows: &[RaceResultRow],
    page: PageParams,
) -> Vec<ConstructorStanding> {
    let mut groups: BTreeMap<i64, (&RaceResultRow, Tally)> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.team_id)
            .or_insert_with(|| (row, Tally::default()))
            .1
            .add(row);
    }

    let tallies: Vec<_> = groups.into_values().collect();
    rank(tallies, page, |(a, ta), (b, tb)| {
        tb.points
            .total_cmp(&ta.points)
            .then_with(|| a.team_name.cmp(&b.team_name))
    })
    .map(|(position, (row, tally))| ConstructorStanding {
        position,
        team_id: row.team_id,
        team_ref: row.team_ref.clone(),
        team_name: row.team_name.clone(),
        points: tally.points,
        wins: tally.wins,
    })
    .collect()
}

fn season_race_results(
    repo: &F1Repository,
    season_year: i32,
) -> Result<Vec<RaceResultRow>, StandingsError> {
    let season = repo
        .find_season_by_year(season_year)?
        .ok_or(StandingsError::SeasonNotFound(season_year))?;
    Ok(repo.race_results_for_season(season.id)?)
}

/// Driver standings for a season year.
pub fn driver_standings(
    repo: &F1Repository,
    season_year: i32,
    page: PageParams,
) -> Result<Vec<DriverStanding>, StandingsError> {
    let rows = season_race_results(repo, season_year)?;
    tracing::debug!(season_year, rows = rows.len(), "Aggregating driver standings");
    Ok(aggregate_driver_standings(&rows, page))
}

/// Constructor standings for a season year.
pub fn constructor_standings(
    repo: &F1Repository,
    season_year: i32,
    page: PageParams,
) -> Result<Vec<ConstructorStanding>, StandingsError> {
    let rows = season_race_results(repo, season_year)?;
    tracing::debug!(season_year, rows = rows.len(), "Aggregating constructor standings");
    Ok(aggregate_constructor_standings(&rows, page))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_minimal_2024;

    fn result(
        driver: (i64, &str, &str),
        team: (i64, &str),
        points: Option<f64>,
        position: Option<i32>,
    ) -> RaceResultRow {
        RaceResultRow {
            driver_id: driver.0,
            driver_ref: driver.1.to_lowercase(),
            driver_code: Some(driver.1.to_string()),
            driver_first_name: "First".to_string(),
            driver_last_name: driver.2.to_string(),
            team_id: team.0,
            team_ref: team.1.to_lowercase().replace(' ', "_"),
            team_name: team.1.to_string(),
            points,
            position,
        }
    }

    const VER: (i64, &str, &str) = (1, "VER", "Verstappen");
    const PER: (i64, &str, &str) = (2, "PER", "Perez");
    const NOR: (i64, &str, &str) = (3, "NOR", "Norris");
    const PIA: (i64, &str, &str) = (4, "PIA", "Piastri");
    const RBR: (i64, &str) = (10, "Red Bull Racing");
    const MCL: (i64, &str) = (11, "McLaren");

    fn all() -> PageParams {
        PageParams::default()
    }

    #[test]
    fn test_window_position() {
        assert_eq!(window_position(0, 0), 1);
        assert_eq!(window_position(0, 4), 5);
        assert_eq!(window_position(10, 0), 11);
    }

    #[test]
    fn test_single_race_driver_and_constructor() {
        let rows = vec![
            result(VER, RBR, Some(25.0), Some(1)),
            result(PER, RBR, Some(18.0), Some(2)),
        ];

        let drivers = aggregate_driver_standings(&rows, all());
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].position, 1);
        assert_eq!(drivers[0].driver_code.as_deref(), Some("VER"));
        assert_eq!(drivers[0].points, 25.0);
        assert_eq!(drivers[0].wins, 1);
        assert_eq!(drivers[1].position, 2);
        assert_eq!(drivers[1].driver_code.as_deref(), Some("PER"));
        assert_eq!(drivers[1].points, 18.0);
        assert_eq!(drivers[1].wins, 0);

        let teams = aggregate_constructor_standings(&rows, all());
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].position, 1);
        assert_eq!(teams[0].team_ref, "red_bull_racing");
        assert_eq!(teams[0].points, 43.0);
        assert_eq!(teams[0].wins, 1);
    }

    #[test]
    fn test_multi_race_accumulation() {
        let ver_results = [
            (25.0, 1),
            (25.0, 1),
            (18.0, 2),
            (25.0, 1),
            (0.0, 11),
            (25.0, 1),
        ];
        let rows: Vec<_> = ver_results
            .iter()
            .map(|&(pts, pos)| result(VER, RBR, Some(pts), Some(pos)))
            .collect();

        let drivers = aggregate_driver_standings(&rows, all());
        assert_eq!(drivers.len(), 1);
        assert_eq!(drivers[0].points, 118.0);
        assert_eq!(drivers[0].wins, 4);
    }

    #[test]
    fn test_empty_results() {
        assert!(aggregate_driver_standings(&[], all()).is_empty());
        assert!(aggregate_constructor_standings(&[], all()).is_empty());
    }

    #[test]
    fn test_ties_broken_by_last_name_with_distinct_positions() {
        let rows = vec![
            result(PIA, MCL, Some(10.0), Some(4)),
            result(NOR, MCL, Some(10.0), Some(5)),
            result(VER, RBR, Some(25.0), Some(1)),
        ];

        let drivers = aggregate_driver_standings(&rows, all());
        let names: Vec<&str> = drivers.iter().map(|d| d.driver_last_name.as_str()).collect();
        assert_eq!(names, vec!["Verstappen", "Norris", "Piastri"]);
        let positions: Vec<u64> = drivers.iter().map(|d| d.position).collect();
        assert_eq!(positions, vec![1, 2, 3]);
    }

    #[test]
    fn test_constructor_ties_broken_by_team_name() {
        let rows = vec![
            result(VER, RBR, Some(15.0), Some(3)),
            result(NOR, MCL, Some(15.0), Some(2)),
        ];

        let teams = aggregate_constructor_standings(&rows, all());
        assert_eq!(teams[0].team_name, "McLaren");
        assert_eq!(teams[1].team_name, "Red Bull Racing");
        assert_eq!(teams[1].position, 2);
    }

    #[test]
    fn test_window_positions_follow_offset() {
        let rows = vec![
            result(VER, RBR, Some(25.0), Some(1)),
            result(NOR, MCL, Some(18.0), Some(2)),
            result(PER, RBR, Some(15.0), Some(3)),
            result(PIA, MCL, Some(12.0), Some(4)),
        ];

        let page = PageParams {
            limit: 2,
            offset: 1,
        };
        let drivers = aggregate_driver_standings(&rows, page);
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].position, 2);
        assert_eq!(drivers[0].driver_last_name, "Norris");
        assert_eq!(drivers[1].position, 3);
        assert_eq!(drivers[1].driver_last_name, "Perez");

        let past_end = aggregate_driver_standings(
            &rows,
            PageParams {
                limit: 10,
                offset: 4,
            },
        );
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_null_points_count_as_zero() {
        let rows = vec![
            result(VER, RBR, None, None),
            result(VER, RBR, Some(8.0), Some(5)),
        ];

        let drivers = aggregate_driver_standings(&rows, all());
        assert_eq!(drivers[0].points, 8.0);
        assert_eq!(drivers[0].wins, 0);
    }

    #[test]
    fn test_team_change_splits_driver_rows() {
        let rows = vec![
            result(PER, RBR, Some(18.0), Some(2)),
            result(PER, MCL, Some(6.0), Some(7)),
        ];

        let drivers = aggregate_driver_standings(&rows, all());
        assert_eq!(drivers.len(), 2);
        assert!(drivers.iter().all(|d| d.driver_id == PER.0));
        assert_eq!(drivers[0].team_name, "Red Bull Racing");
        assert_eq!(drivers[1].team_name, "McLaren");
    }

    #[test]
    fn test_sorted_and_wins_bounded() {
        let rows = vec![
            result(VER, RBR, Some(25.0), Some(1)),
            result(NOR, MCL, Some(18.0), Some(2)),
            result(PIA, MCL, Some(15.0), Some(3)),
            result(NOR, MCL, Some(25.0), Some(1)),
            result(VER, RBR, Some(18.0), Some(2)),
            result(PIA, MCL, Some(15.0), Some(3)),
            result(PER, RBR, None, None),
        ];

        let drivers = aggregate_driver_standings(&rows, all());
        for pair in drivers.windows(2) {
            assert!(pair[0].points >= pair[1].points);
            if pair[0].points == pair[1].points {
                assert!(pair[0].driver_last_name <= pair[1].driver_last_name);
            }
            assert_eq!(pair[1].position, pair[0].position + 1);
        }
        for d in &drivers {
            let races = rows
                .iter()
                .filter(|r| r.driver_id == d.driver_id && r.team_id == d.team_id)
                .count() as u32;
            assert!(d.wins <= races);
        }
        // Verstappen and Norris both on 43; Norris sorts first
        assert_eq!(drivers[0].driver_last_name, "Norris");
        assert_eq!(drivers[1].driver_last_name, "Verstappen");
    }

    #[test]
    fn test_points_serialized_as_float() {
        let rows = vec![result(VER, RBR, Some(25.0), Some(1))];
        let drivers = aggregate_driver_standings(&rows, all());
        let json = serde_json::to_string(&drivers[0]).unwrap();
        assert!(json.contains("\"points\":25.0"));
    }

    #[test]
    fn test_unknown_season_is_not_found() {
        let repo = F1Repository::in_memory().unwrap();
        seed_minimal_2024(&repo).unwrap();

        let err = driver_standings(&repo, 1999, all()).unwrap_err();
        assert!(matches!(err, StandingsError::SeasonNotFound(1999)));
        let err = constructor_standings(&repo, 1999, all()).unwrap_err();
        assert!(matches!(err, StandingsError::SeasonNotFound(1999)));
    }

    #[test]
    fn test_season_without_results_is_empty() {
        let repo = F1Repository::in_memory().unwrap();
        repo.get_or_create_season(2025).unwrap();

        assert!(driver_standings(&repo, 2025, all()).unwrap().is_empty());
        assert!(constructor_standings(&repo, 2025, all()).unwrap().is_empty());
    }

    #[test]
    fn test_seeded_season_standings() {
        let repo = F1Repository::in_memory().unwrap();
        seed_minimal_2024(&repo).unwrap();

        let drivers = driver_standings(&repo, 2024, all()).unwrap();
        assert_eq!(drivers.len(), 2);
        assert_eq!(drivers[0].driver_code.as_deref(), Some("VER"));
        assert_eq!(drivers[0].points, 25.0);
        assert_eq!(drivers[0].wins, 1);
        assert_eq!(drivers[1].driver_code.as_deref(), Some("PER"));
        assert_eq!(drivers[1].position, 2);

        let teams = constructor_standings(&repo, 2024, all()).unwrap();
        assert_eq!(teams.len(), 1);
        assert_eq!(teams[0].team_ref, "red_bull_racing");
        assert_eq!(teams[0].points, 43.0);
    }
}
