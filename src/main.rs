//! F1 API
//!
//! REST API and CLI for Formula 1 seasons, results and championship standings.

mod cli;
mod config;
mod error;
mod pagination;
mod params;
mod routes;
mod seed;
mod standings;
mod storage;
mod types;

use clap::Parser;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Commands};
use crate::config::AppConfig;
use crate::pagination::PageParams;
use crate::routes::AppState;
use crate::storage::F1Repository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = AppConfig::load()?;
    init_tracing(&config);

    match cli.command {
        Commands::Serve { host, port } => run_server(config, host, port).await,
        Commands::Seed { database } => cli::run_seed(&config, database),
        Commands::Standings {
            season_year,
            kind,
            limit,
            offset,
            format,
            database,
        } => cli::run_standings(
            &config,
            season_year,
            kind,
            PageParams { limit, offset },
            format,
            database,
        ),
    }
}

/// Initialize logging. `RUST_LOG` wins over the configured filter.
fn init_tracing(config: &AppConfig) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Run the API server.
async fn run_server(
    mut config: AppConfig,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    // Override with CLI args
    if let Some(h) = host {
        config.server.host = h;
    }
    if let Some(p) = port {
        config.server.port = p;
    }

    tracing::info!("Configuration loaded (env: {})", config.app.env);
    tracing::info!("Database path: {}", config.database.path);

    let repo = F1Repository::new(Path::new(&config.database.path))?;
    tracing::info!("Database ready");

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);
    let state = Arc::new(AppState::new(repo, config));
    let app = routes::build_router(state);

    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
