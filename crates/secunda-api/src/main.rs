//! # secunda-api: Binary Entry Point
//!
//! `secunda-api serve` (the default) starts the HTTP server.
//! `secunda-api seed` loads the demo dataset and exits.

use anyhow::Context;
use clap::{Parser, Subcommand};

use secunda_api::state::{AppConfig, AppState};

#[derive(Debug, Parser)]
#[command(name = "secunda-api", version, about = "Organization directory API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Load the demo dataset. Safe to run repeatedly.
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::debug!(?config, "configuration loaded");

    let db = secunda_api::db::connect(
        config.database_url.as_deref(),
        config.database_max_connections,
    )
    .await
    .context("database initialization failed")?;
    tracing::info!(backend = db.backend_name(), "store ready");

    let state = AppState::with_config(config, db);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(state).await,
        Command::Seed => {
            secunda_api::seed::seed(&state)
                .await
                .context("seeding failed")?;
            Ok(())
        }
    }
}

async fn serve(state: AppState) -> anyhow::Result<()> {
    if state.config.api_key.is_none() {
        tracing::warn!("API_KEY is not set, authentication is disabled");
    }

    let addr = state.config.bind_address();
    let app = secunda_api::app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("secunda-api listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` sets the filter (default
/// `info`); `LOG_FORMAT=json` switches to JSON lines.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
