pub mod active_workout;
pub mod commands;
pub mod config;
pub mod db;
pub mod finalize;
pub mod models;
pub mod pending;
pub mod presence;
pub mod session;
pub mod sink;
pub mod storage;

#[cfg(test)]
mod test_utils;

pub use active_workout::{ActiveWorkoutStore, ClearOutcome};
pub use config::AppConfig;
pub use db::AppState;
pub use finalize::{build_completed_record, finalize_workout, FinalizeError};
pub use pending::{PendingSelection, PendingSelections};
pub use sink::{CompletedWorkoutSink, RestWorkoutSink, SinkError};
pub use storage::{KeyValueStore, StorageError};

use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber, honouring `RUST_LOG` (default `info`).
/// Safe to call more than once.
pub fn init_tracing() {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
  let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Load configuration and build the shared app context, as the mobile shell
/// does on launch
pub async fn start() -> Result<std::sync::Arc<AppState>, config::ConfigError> {
  init_tracing();

  let config = AppConfig::from_env()?;
  let state = AppState::initialize(config).await;

  let in_progress = state.workout.has_in_progress().await;
  tracing::info!(remote = state.sink.is_some(), in_progress, "Active workout core ready");

  Ok(state)
}
