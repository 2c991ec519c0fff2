use std::env;
use std::time::Duration;

use crate::sink::{RemoteConfig, SinkError};

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DEFAULT_DATABASE_URL: &str = "sqlite://active-workout.db?mode=rwc";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Invalid value for {key}: {value}")]
  InvalidValue { key: String, value: String },

  #[error(transparent)]
  Remote(#[from] SinkError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
  pub database_url: String,
  pub presence_poll_interval: Duration,
  /// None runs without a remote sink
  pub remote: Option<RemoteConfig>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      presence_poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
      remote: None,
    }
  }
}

impl AppConfig {
  /// Load from the environment, reading a `.env` file first if there is one
  pub fn from_env() -> Result<Self, ConfigError> {
    dotenvy::dotenv().ok();

    let database_url =
      env::var("ACTIVE_WORKOUT_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

    let presence_poll_interval = match env::var("ACTIVE_WORKOUT_POLL_INTERVAL_SECS") {
      Ok(raw) => match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
          return Err(ConfigError::InvalidValue {
            key: "ACTIVE_WORKOUT_POLL_INTERVAL_SECS".into(),
            value: raw,
          })
        }
      },
      Err(_) => Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
    };

    // Neither variable set means offline; only one set is a mistake
    let remote = if env::var("WORKOUT_API_URL").is_err() && env::var("WORKOUT_API_KEY").is_err() {
      None
    } else {
      Some(RemoteConfig::from_env()?)
    };

    Ok(Self {
      database_url,
      presence_poll_interval,
      remote,
    })
  }
}
