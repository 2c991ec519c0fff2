use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::sync::Arc;

use crate::active_workout::ActiveWorkoutStore;
use crate::config::AppConfig;
use crate::pending::PendingSelections;
use crate::session::SessionHandle;
use crate::sink::{CompletedWorkoutSink, RestWorkoutSink};
use crate::storage::{KeyValueStore, MemoryKeyValueStore, SqliteKeyValueStore};

pub type DbPool = SqlitePool;

/// Process-wide context shared by every screen
pub struct AppState {
  pub db: Option<DbPool>,
  pub workout: Arc<ActiveWorkoutStore>,
  pub pending: Arc<PendingSelections>,
  pub sink: Option<Arc<dyn CompletedWorkoutSink>>,
  pub session: SessionHandle,
  pub config: AppConfig,
}

impl AppState {
  /// Open device storage and wire up the store, hand-off buffers and sink.
  ///
  /// If the database cannot be opened the workout is kept in memory only.
  pub async fn initialize(config: AppConfig) -> Arc<Self> {
    let session = SessionHandle::new();
    let pending = Arc::new(PendingSelections::new());

    let db = match initialize_db(&config.database_url).await {
      Ok(pool) => {
        tracing::info!("Database ready");
        Some(pool)
      }
      Err(e) => {
        tracing::error!(error = %e, "Failed to initialize database; active workout will not survive restarts");
        None
      }
    };

    let kv: Arc<dyn KeyValueStore> = match &db {
      Some(pool) => Arc::new(SqliteKeyValueStore::new(pool.clone())),
      None => Arc::new(MemoryKeyValueStore::new()),
    };

    let sink: Option<Arc<dyn CompletedWorkoutSink>> = match &config.remote {
      Some(remote) => match RestWorkoutSink::new(remote.clone(), session.clone()) {
        Ok(sink) => Some(Arc::new(sink)),
        Err(e) => {
          tracing::error!(error = %e, "Failed to create remote workout sink");
          None
        }
      },
      None => None,
    };

    let mut store = ActiveWorkoutStore::new(kv, pending.clone());
    if let Some(sink) = &sink {
      store = store.with_legacy_cleanup(sink.clone(), session.clone());
    }

    Arc::new(Self {
      db,
      workout: Arc::new(store),
      pending,
      sink,
      session,
      config,
    })
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(db_url: &str) -> Result<DbPool, sqlx::Error> {
  tracing::info!(%db_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(db_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  Ok(pool)
}
