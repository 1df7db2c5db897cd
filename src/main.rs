use anyhow::Context;
use tracing::info;

use manim_orchestrator::{app, logging, AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();
    logging::init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    info!("Starting manim orchestrator in {:?} mode", config.environment);

    let state = AppState::from_config(config)
        .await
        .context("failed to initialise application state")?;

    app::serve(state).await
}
