//! CLI commands for f1-api.
//!
//! Runs the API server, seeds the reference dataset, or prints standings
//! straight from the database.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

use crate::config::AppConfig;
use crate::pagination::{PageParams, DEFAULT_LIMIT, MAX_LIMIT};
use crate::seed::seed_minimal_2024;
use crate::standings::{self, ConstructorStanding, DriverStanding};
use crate::storage::F1Repository;

#[derive(Parser)]
#[command(name = "f1-api")]
#[command(version, about = "F1 API: seasons, results and championship standings", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the API server
    Serve {
        /// Host to bind to (overrides config)
        #[arg(short = 'H', long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Load the minimal 2024 dataset (idempotent)
    Seed {
        /// Database path override
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Print championship standings for a season
    Standings {
        /// Season year
        #[arg(short, long)]
        season_year: i32,

        /// Which table to print
        #[arg(short, long, value_enum, default_value_t = StandingsKind::Drivers)]
        kind: StandingsKind,

        /// Maximum rows
        #[arg(short, long, default_value_t = DEFAULT_LIMIT,
              value_parser = clap::value_parser!(u32).range(1..=MAX_LIMIT as i64))]
        limit: u32,

        /// Rows to skip
        #[arg(short, long, default_value_t = 0)]
        offset: u32,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Database path override
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StandingsKind {
    Drivers,
    Constructors,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
}

fn open_repository(config: &AppConfig, database: Option<PathBuf>) -> anyhow::Result<F1Repository> {
    let path = database.unwrap_or_else(|| PathBuf::from(&config.database.path));
    eprintln!("Opening database: {}", path.display());
    F1Repository::new(Path::new(&path))
}

/// Seed the database.
pub fn run_seed(config: &AppConfig, database: Option<PathBuf>) -> anyhow::Result<()> {
    let repo = open_repository(config, database)?;
    let summary = seed_minimal_2024(&repo)?;
    eprintln!(
        "Seeded season 2024 (season id {}, {} race results)",
        summary.season_id, summary.results
    );
    Ok(())
}

/// Print standings for a season.
pub fn run_standings(
    config: &AppConfig,
    season_year: i32,
    kind: StandingsKind,
    page: PageParams,
    format: OutputFormat,
    database: Option<PathBuf>,
) -> anyhow::Result<()> {
    let repo = open_repository(config, database)?;

    match kind {
        StandingsKind::Drivers => {
            let rows = standings::driver_standings(&repo, season_year, page)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Table => print_driver_table(season_year, &rows),
            }
        }
        StandingsKind::Constructors => {
            let rows = standings::constructor_standings(&repo, season_year, page)?;
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
                OutputFormat::Table => print_constructor_table(season_year, &rows),
            }
        }
    }

    Ok(())
}

fn print_driver_table(season_year: i32, rows: &[DriverStanding]) {
    println!("\n=== {} Drivers' Championship ===\n", season_year);
    println!(
        "{:>4}  {:<4}  {:<24}  {:<24}  {:>7}  {:>4}",
        "Pos", "Code", "Driver", "Team", "Points", "Wins"
    );
    println!("{}", "-".repeat(77));
    for row in rows {
        let name = format!("{} {}", row.driver_first_name, row.driver_last_name);
        println!(
            "{:>4}  {:<4}  {:<24}  {:<24}  {:>7.1}  {:>4}",
            row.position,
            row.driver_code.as_deref().unwrap_or("-"),
            name,
            row.team_name,
            row.points,
            row.wins
        );
    }
    if rows.is_empty() {
        println!("(no race results)");
    }
}

fn print_constructor_table(season_year: i32, rows: &[ConstructorStanding]) {
    println!("\n=== {} Constructors' Championship ===\n", season_year);
    println!("{:>4}  {:<28}  {:>7}  {:>4}", "Pos", "Team", "Points", "Wins");
    println!("{}", "-".repeat(49));
    for row in rows {
        println!(
            "{:>4}  {:<28}  {:>7.1}  {:>4}",
            row.position, row.team_name, row.points, row.wins
        );
    }
    if rows.is_empty() {
        println!("(no race results)");
    }
}
