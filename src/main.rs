//! taskr
//!
//! A single-user task list served over HTTP, gated by one configured
//! credential pair and stored in SQLite.

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use taskr::cli::{Cli, Command, InitDbArgs};
use taskr::config::Config;
use taskr::db::Database;
use taskr::logging::{self, LogTarget};
use taskr::web::{AppState, start_server};
use tracing::info;

/// Load configuration and apply CLI overrides.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::load_or_default(cli.config.as_deref())?;

    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.clone();
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    Ok(config)
}

fn open_database(config: &Config) -> Result<Database> {
    config
        .ensure_db_dir()
        .with_context(|| format!("creating directory for {}", config.server.db_path.display()))?;
    Database::open(&config.server.db_path)
        .with_context(|| format!("opening database {}", config.server.db_path.display()))
}

fn init_db(config: &Config, args: &InitDbArgs) -> Result<()> {
    let db = open_database(config)?;
    info!(path = %db.path().display(), "Database ready");

    if args.seed {
        let inserted = db.seed_example_tasks()?;
        if inserted == 0 {
            info!("Table already has tasks; skipped seeding");
        } else {
            info!(inserted, "Inserted example tasks");
        }
    }
    Ok(())
}

async fn serve(config: &Config) -> Result<()> {
    let db = Arc::new(open_database(config)?);
    let state = AppState::from_config(db, config)?;

    let handle = start_server(state, &config.server.host, config.server.port).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl+C");
    handle.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    let config = load_config(&cli)?;
    info!(db_path = %config.server.db_path.display(), "Configuration loaded");

    match &cli.command {
        Some(Command::InitDb(args)) => init_db(&config, args),
        Some(Command::Serve) | None => serve(&config).await,
    }
}
