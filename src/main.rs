mod config;
mod db;
mod routes;
mod services;
mod state;

use std::sync::Arc;

use clap::{Parser, Subcommand};
use time::OffsetDateTime;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

const DEFAULT_LOG_FILTER: &str = "stickyboard=info,tower_http=info";

#[derive(Parser, Debug)]
#[command(name = "stickyboard", about = "StickyBoard API server and maintenance jobs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    /// Run the HTTP server with the overdue scan and avatar worker.
    Serve,
    /// Run one overdue scan and exit.
    GenerateOverdue,
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("database init failed: {0}")]
    Database(#[from] sqlx::Error),
    #[error("overdue scan failed: {0}")]
    Scan(#[from] services::overdue::ScanError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let cli = Cli::parse();
    let result = match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve().await,
        Command::GenerateOverdue => generate_overdue().await,
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "stickyboard exited with error");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn serve() -> Result<(), StartupError> {
    let config = Arc::new(AppConfig::from_env()?);
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;

    tokio::fs::create_dir_all(config.tmp_dir()).await?;
    tokio::fs::create_dir_all(config.avatar_dir()).await?;

    let _overdue = services::overdue::spawn_overdue_task(
        pool.clone(),
        config.overdue_scan_interval_secs,
        config.overdue_scan_batch_size,
    );
    let avatar_tx = services::avatar::spawn_avatar_worker(pool.clone(), Arc::clone(&config));

    let port = config.port;
    let state = state::AppState::new(pool, config, Some(avatar_tx));
    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}")).await?;

    tracing::info!(%port, "stickyboard listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn generate_overdue() -> Result<(), StartupError> {
    let config = AppConfig::from_env()?;
    let pool = db::init_pool(&config.database_url, config.db_max_connections).await?;
    let report = services::overdue::run_scan(&pool, OffsetDateTime::now_utc(), config.overdue_scan_batch_size).await?;
    tracing::info!(batches = report.batches, notified = report.notified, "generate-overdue finished");
    Ok(())
}
