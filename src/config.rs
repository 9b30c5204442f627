//! Engine configuration from environment variables

use serde::Serialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://plan-engine.db?mode=rwc";
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com/v1/messages";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Error, Debug, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum ConfigError {
  #[error("Invalid URL in {0}: {1}")]
  InvalidUrl(String, String),

  #[error("Invalid value for {0}: {1}")]
  InvalidValue(String, String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
  pub database_url: String,
  /// Absent key means plan generation is unavailable
  pub api_key: Option<String>,
  pub api_url: String,
  pub model: String,
  pub max_tokens: u32,
  pub log_filter: String,
}

impl Default for EngineConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      api_key: None,
      api_url: DEFAULT_API_URL.to_string(),
      model: DEFAULT_MODEL.to_string(),
      max_tokens: DEFAULT_MAX_TOKENS,
      log_filter: DEFAULT_LOG_FILTER.to_string(),
    }
  }
}

impl EngineConfig {
  /// Load `.env` (if present) and read the environment
  pub fn load() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();
    Self::from_env()
  }

  /// Read configuration from the process environment only
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let api_url = var("PLAN_ENGINE_API_URL").unwrap_or(defaults.api_url);
    Url::parse(&api_url)
      .map_err(|e| ConfigError::InvalidUrl("PLAN_ENGINE_API_URL".into(), e.to_string()))?;

    let max_tokens = match var("PLAN_ENGINE_MAX_TOKENS") {
      Some(raw) => raw
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| ConfigError::InvalidValue("PLAN_ENGINE_MAX_TOKENS".into(), raw))?,
      None => defaults.max_tokens,
    };

    Ok(Self {
      database_url: var("PLAN_ENGINE_DATABASE_URL").unwrap_or(defaults.database_url),
      api_key: var("ANTHROPIC_API_KEY"),
      api_url,
      model: var("PLAN_ENGINE_MODEL").unwrap_or(defaults.model),
      max_tokens,
      log_filter: var("PLAN_ENGINE_LOG").unwrap_or(defaults.log_filter),
    })
  }
}

/// Set and non-blank
fn var(name: &str) -> Option<String> {
  std::env::var(name)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  const VARS: [&str; 6] = [
    "PLAN_ENGINE_DATABASE_URL",
    "ANTHROPIC_API_KEY",
    "PLAN_ENGINE_API_URL",
    "PLAN_ENGINE_MODEL",
    "PLAN_ENGINE_MAX_TOKENS",
    "PLAN_ENGINE_LOG",
  ];

  /// Every engine variable, unset unless overridden
  fn env_with(overrides: &[(&'static str, &'static str)]) -> Vec<(&'static str, Option<&'static str>)> {
    VARS
      .iter()
      .map(|name| {
        let value = overrides.iter().find(|(k, _)| k == name).map(|(_, v)| *v);
        (*name, value)
      })
      .collect()
  }

  #[test]
  #[serial]
  fn test_defaults_when_unset() {
    temp_env::with_vars(env_with(&[]), || {
      let config = EngineConfig::from_env().unwrap();
      assert_eq!(config, EngineConfig::default());
      assert!(config.api_key.is_none());
    });
  }

  #[test]
  #[serial]
  fn test_reads_overrides() {
    let vars = env_with(&[
      ("PLAN_ENGINE_DATABASE_URL", "sqlite::memory:"),
      ("ANTHROPIC_API_KEY", "sk-test"),
      ("PLAN_ENGINE_API_URL", "http://127.0.0.1:9999/v1/messages"),
      ("PLAN_ENGINE_MAX_TOKENS", "2000"),
      ("PLAN_ENGINE_LOG", "debug"),
    ]);
    temp_env::with_vars(vars, || {
      let config = EngineConfig::from_env().unwrap();
      assert_eq!(config.database_url, "sqlite::memory:");
      assert_eq!(config.api_key.as_deref(), Some("sk-test"));
      assert_eq!(config.api_url, "http://127.0.0.1:9999/v1/messages");
      assert_eq!(config.max_tokens, 2000);
      assert_eq!(config.log_filter, "debug");
      assert_eq!(config.model, DEFAULT_MODEL);
    });
  }

  #[test]
  #[serial]
  fn test_blank_key_is_missing() {
    let vars = env_with(&[("ANTHROPIC_API_KEY", "   ")]);
    temp_env::with_vars(vars, || {
      assert!(EngineConfig::from_env().unwrap().api_key.is_none());
    });
  }

  #[test]
  #[serial]
  fn test_invalid_url_rejected() {
    let vars = env_with(&[("PLAN_ENGINE_API_URL", "not a url")]);
    temp_env::with_vars(vars, || {
      assert!(matches!(
        EngineConfig::from_env(),
        Err(ConfigError::InvalidUrl(..))
      ));
    });
  }

  #[test]
  #[serial]
  fn test_invalid_max_tokens_rejected() {
    for bad in ["zero", "0", "-5"] {
      let vars = env_with(&[("PLAN_ENGINE_MAX_TOKENS", bad)]);
      temp_env::with_vars(vars, || {
        assert!(matches!(
          EngineConfig::from_env(),
          Err(ConfigError::InvalidValue(..))
        ));
      });
    }
  }
}
