pub mod api;
pub mod assistant;
pub mod backfill; // CSV backfill for the workbench-ingest binary
pub mod config;
pub mod core_state;
pub mod db;
pub mod intake; // Submission document intake
pub mod llm;
pub mod models;
pub mod production; // Monthly production workbook import
pub mod reinsurance;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .try_init();
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Load configuration, prepare the database and serve until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    init_tracing();
    let config = config::WorkbenchConfig::from_env()?;

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let bind_addr = config.bind_addr;
    let core = Arc::new(core_state::CoreState::new(config));
    core.initialize_database()?;
    if core.config.ai.api_key.is_none() {
        tracing::warn!("AI_API_KEY not set; chat and document extraction are disabled");
    }

    let mut server = api::start_server(core, bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening");

    tokio::signal::ctrl_c().await.map_err(RunError::Signal)?;
    server.shutdown();
    server.stopped().await;
    Ok(())
}
