pub mod classifier;
pub mod commands;
pub mod config;
pub mod db;
pub mod enforcer;
pub mod goals;
pub mod llm;
pub mod mileage;
pub mod models;
pub mod pipeline;
pub mod plan_parser;
pub mod reconcile;
pub mod recovery;

#[cfg(test)]
mod test_utils;

use config::{ConfigError, EngineConfig};
use db::{AppState, DbError};
use llm::ClaudeClient;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Error)]
pub enum StartupError {
  #[error(transparent)]
  Config(#[from] ConfigError),

  #[error(transparent)]
  Db(#[from] DbError),
}

/// Install the stderr log subscriber; later calls are no-ops
pub fn init_tracing(filter: &str) {
  let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_target(false)
    .with_writer(std::io::stderr)
    .try_init();
}

/// Load configuration, start logging, open the database
pub async fn init() -> Result<AppState, StartupError> {
  let config = EngineConfig::load()?;
  init_tracing(&config.log_filter);
  init_with_config(&config).await
}

pub async fn init_with_config(config: &EngineConfig) -> Result<AppState, StartupError> {
  let pool = db::initialize_db(&config.database_url).await?;

  let llm = match ClaudeClient::from_config(config) {
    Ok(client) => Some(client),
    Err(e) => {
      tracing::warn!(error = %e, "plan generator unavailable");
      None
    }
  };

  tracing::info!(plan_generator = llm.is_some(), "engine ready");
  Ok(AppState::new(pool, llm))
}
