//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Database setup/teardown
//! - Mock data factories
//! - Failure-injecting storage and sink doubles
//! - Helper assertions

use async_trait::async_trait;
use sqlx::SqlitePool;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::models::{
  CompletedWorkoutRecord, ExerciseKind, ExerciseSet, Visibility, WorkoutExercise,
};
use crate::session::{AuthSession, AuthUser};
use crate::sink::{CompletedWorkoutSink, SinkError};
use crate::storage::{KeyValueStore, MemoryKeyValueStore, StorageError};

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

/// Weighted exercise with one set per `(weight, reps, completed)` tuple
pub fn mock_exercise(name: &str, sets: &[(f64, u32, bool)]) -> WorkoutExercise {
  let mut exercise = WorkoutExercise::new(name, ExerciseKind::Weighted)
    .expect("Valid exercise name")
    .with_muscles("chest", &["triceps"])
    .with_rest_timer(90);

  for &(weight, reps, completed) in sets {
    let mut set = ExerciseSet::new(Some(weight), Some(reps)).expect("Valid set");
    set.completed = completed;
    exercise.sets.push(set);
  }

  exercise
}

pub fn mock_completed_record(title: &str) -> CompletedWorkoutRecord {
  let exercise = mock_exercise("Bench Press", &[(60.0, 8, true)]);
  CompletedWorkoutRecord {
    title: title.to_string(),
    description: String::new(),
    visibility: Visibility::Everyone,
    duration: 1800,
    volume: 480.0,
    total_sets: 1,
    exercises: vec![exercise],
    created_at: chrono::Utc::now(),
  }
}

pub fn mock_auth_session(user_id: &str) -> AuthSession {
  AuthSession {
    access_token: format!("token-{}", user_id),
    user: AuthUser {
      id: user_id.to_string(),
      email: format!("{}@example.com", user_id),
    },
  }
}

/// ---------------------------------------------------------------------------
/// Storage Double
/// ---------------------------------------------------------------------------

/// In-memory store whose operations can be made to fail or stall
#[derive(Default)]
pub struct FlakyKeyValueStore {
  inner: MemoryKeyValueStore,
  fail_reads: AtomicBool,
  fail_writes: AtomicBool,
  fail_remove_many: AtomicBool,
  fail_remove: AtomicBool,
  latency: Mutex<Option<Duration>>,
  read_latency: Mutex<Option<Duration>>,
}

impl FlakyKeyValueStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_reads(&self, fail: bool) {
    self.fail_reads.store(fail, Ordering::SeqCst);
  }

  pub fn fail_writes(&self, fail: bool) {
    self.fail_writes.store(fail, Ordering::SeqCst);
  }

  pub fn fail_remove_many(&self, fail: bool) {
    self.fail_remove_many.store(fail, Ordering::SeqCst);
  }

  pub fn fail_remove(&self, fail: bool) {
    self.fail_remove.store(fail, Ordering::SeqCst);
  }

  pub fn set_latency(&self, latency: Option<Duration>) {
    *self.latency.lock().unwrap() = latency;
  }

  /// Delay applied after a read has taken its snapshot, so the caller holds
  /// stale data for that long
  pub fn set_read_latency(&self, latency: Option<Duration>) {
    *self.read_latency.lock().unwrap() = latency;
  }

  async fn stall(&self) {
    let latency = *self.latency.lock().unwrap();
    if let Some(latency) = latency {
      tokio::time::sleep(latency).await;
    }
  }

  fn check(flag: &AtomicBool, op: &str) -> Result<(), StorageError> {
    if flag.load(Ordering::SeqCst) {
      return Err(StorageError::Unavailable(format!("injected {} failure", op)));
    }
    Ok(())
  }
}

#[async_trait]
impl KeyValueStore for FlakyKeyValueStore {
  async fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<String>>, StorageError> {
    self.stall().await;
    Self::check(&self.fail_reads, "read")?;
    let values = self.inner.get_many(keys).await?;

    let read_latency = *self.read_latency.lock().unwrap();
    if let Some(latency) = read_latency {
      tokio::time::sleep(latency).await;
    }
    Ok(values)
  }

  async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
    self.stall().await;
    Self::check(&self.fail_writes, "write")?;
    self.inner.set_many(entries).await
  }

  async fn remove(&self, key: &str) -> Result<(), StorageError> {
    self.stall().await;
    Self::check(&self.fail_remove, "remove")?;
    self.inner.remove(key).await
  }

  async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
    self.stall().await;
    Self::check(&self.fail_remove_many, "remove_many")?;
    self.inner.remove_many(keys).await
  }
}

/// ---------------------------------------------------------------------------
/// Sink Double
/// ---------------------------------------------------------------------------

/// Records every call; commits get ids `workout-1`, `workout-2`, ...
#[derive(Default)]
pub struct RecordingSink {
  commits: Mutex<Vec<(CompletedWorkoutRecord, Option<String>)>>,
  legacy_deletes: Mutex<Vec<String>>,
  next_commit_error: Mutex<Option<SinkError>>,
  fail_legacy_deletes: AtomicBool,
}

impl RecordingSink {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn fail_next_commit(&self, err: SinkError) {
    *self.next_commit_error.lock().unwrap() = Some(err);
  }

  pub fn fail_legacy_deletes(&self, fail: bool) {
    self.fail_legacy_deletes.store(fail, Ordering::SeqCst);
  }

  pub fn commits(&self) -> Vec<(CompletedWorkoutRecord, Option<String>)> {
    self.commits.lock().unwrap().clone()
  }

  pub fn legacy_deletes(&self) -> Vec<String> {
    self.legacy_deletes.lock().unwrap().clone()
  }
}

#[async_trait]
impl CompletedWorkoutSink for RecordingSink {
  async fn commit(
    &self,
    record: &CompletedWorkoutRecord,
    user_id: Option<&str>,
  ) -> Result<String, SinkError> {
    let count = {
      let mut commits = self.commits.lock().unwrap();
      commits.push((record.clone(), user_id.map(String::from)));
      commits.len()
    };

    if user_id.is_none() {
      return Err(SinkError::NotAuthenticated);
    }
    if let Some(err) = self.next_commit_error.lock().unwrap().take() {
      return Err(err);
    }

    Ok(format!("workout-{}", count))
  }

  async fn delete_legacy_active_record(&self, user_id: &str) -> Result<(), SinkError> {
    self.legacy_deletes.lock().unwrap().push(user_id.to_string());

    if self.fail_legacy_deletes.load(Ordering::SeqCst) {
      return Err(SinkError::RemoteWrite("injected delete failure".into()));
    }
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Test Macros
/// ---------------------------------------------------------------------------

/// Assert two floats are approximately equal within a tolerance
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $tolerance:expr) => {
    let diff = ($left - $right).abs();
    assert!(
      diff < $tolerance,
      "Values not approximately equal: {} vs {} (diff: {}, tolerance: {})",
      $left,
      $right,
      diff,
      $tolerance
    );
  };
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_setup_db_creates_schema() {
    let pool = setup_test_db().await;

    let tables: Vec<(String,)> =
      sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = 'kv_store'")
        .fetch_all(&pool)
        .await
        .expect("Failed to query tables");

    assert_eq!(tables.len(), 1, "Expected kv_store table");

    teardown_test_db(pool).await;
  }

  #[test]
  fn test_mock_factories_create_valid_data() {
    let exercise = mock_exercise("Squat", &[(100.0, 5, true), (100.0, 5, false)]);
    assert_eq!(exercise.sets.len(), 2);
    assert!(exercise.validate().is_ok());
    assert_eq!(exercise.completed_sets().count(), 1);

    let record = mock_completed_record("Legs");
    assert_eq!(record.total_sets, 1);
    crate::assert_approx_eq!(record.volume, 480.0, 1e-9);
  }

  #[tokio::test]
  async fn test_flaky_store_injects_failures() {
    let store = FlakyKeyValueStore::new();
    store.set_many(&[("k", "v".to_string())]).await.unwrap();

    store.fail_reads(true);
    assert!(store.get_many(&["k"]).await.is_err());

    store.fail_reads(false);
    assert_eq!(store.get_many(&["k"]).await.unwrap(), vec![Some("v".to_string())]);
  }
}
