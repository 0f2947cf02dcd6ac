use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pulse_service::config::Config;
use pulse_service::database::{self, Database, DatabaseImpl};
use pulse_service::live::BroadcastRegistry;
use pulse_service::monitoring::MonitorEngine;
use pulse_service::pool::{DbManager, DbPool};

#[derive(Parser)]
#[command(name = "pulse-service", about = "Endpoint monitoring engine", version)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the database path from the config file
    #[arg(short, long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_config(cli.config.as_ref())?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }
    info!("{config}");

    let db = libsql::Builder::new_local(&config.database.path).build().await?;
    let pool = DbPool::builder(DbManager::new(db)).build()?;

    let conn = pool.get().await?;
    database::initialize_database(&conn).await?;
    drop(conn);

    let database: Arc<dyn Database> = Arc::new(DatabaseImpl::new_from_pool(pool));
    let registry = Arc::new(BroadcastRegistry::new());

    let engine = MonitorEngine::start(database, registry, config.engine_settings())?;
    info!("pulse-service started, press Ctrl-C to stop");

    tokio::signal::ctrl_c().await?;
    engine.stop().await;
    info!("shutdown complete");

    Ok(())
}
