//! Active Workout Store
//!
//! Keeps the workout currently being logged durable across restarts and
//! crashes until it is either handed off as a completed workout or discarded.
//!
//! Key principles:
//! - Exercises and duration are written and read as one unit
//! - Reads never fail: missing or corrupt data reads as "no active workout"
//! - Write failures are logged and swallowed; the screen keeps its in-memory copy
//! - Writes are serialized, so a clear issued after a save always wins
//! - An empty exercise list is indistinguishable from no workout

use serde::de::IgnoredAny;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::futures::Notified;
use tokio::sync::{Mutex, Notify};

use crate::models::{ActiveWorkoutState, WorkoutExercise};
use crate::pending::PendingSelections;
use crate::session::SessionHandle;
use crate::sink::CompletedWorkoutSink;
use crate::storage::KeyValueStore;

pub const EXERCISES_KEY: &str = "current_workout_exercises";
pub const DURATION_KEY: &str = "current_workout_duration";

const EMPTY_EXERCISES: &str = "[]";

/// How far `clear` had to go to remove the persisted workout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearOutcome {
  /// Both slots removed in one atomic write
  Cleared,
  /// The atomic write failed but every slot was removed individually
  ClearedPerKey,
  /// At least one slot could not be removed
  Incomplete,
}

/// Enough of an exercise to tell a real entry from junk, without decoding sets
#[derive(Deserialize)]
struct ExerciseProbe {
  #[serde(rename = "id")]
  _id: IgnoredAny,
  #[serde(rename = "name")]
  _name: IgnoredAny,
}

struct LegacyCleanup {
  sink: Arc<dyn CompletedWorkoutSink>,
  session: SessionHandle,
}

pub struct ActiveWorkoutStore {
  kv: Arc<dyn KeyValueStore>,
  pending: Arc<PendingSelections>,
  legacy: Option<LegacyCleanup>,
  write_gate: Mutex<()>,
  changed: Notify,
}

impl ActiveWorkoutStore {
  pub fn new(kv: Arc<dyn KeyValueStore>, pending: Arc<PendingSelections>) -> Self {
    Self {
      kv,
      pending,
      legacy: None,
      write_gate: Mutex::new(()),
      changed: Notify::new(),
    }
  }

  /// Also delete the signed-in user's server-side active workout on `clear`
  pub fn with_legacy_cleanup(mut self, sink: Arc<dyn CompletedWorkoutSink>, session: SessionHandle) -> Self {
    self.legacy = Some(LegacyCleanup { sink, session });
    self
  }

  pub fn pending(&self) -> &Arc<PendingSelections> {
    &self.pending
  }

  /// Resolves after the next save or clear
  pub async fn changed(&self) {
    self.changed.notified().await;
  }

  /// Un-polled wait for the next save or clear. Call `enable` on the pinned
  /// future to register before reading, so a change that lands during the
  /// read is not lost.
  pub fn changes(&self) -> Notified<'_> {
    self.changed.notified()
  }

  // ---------------------------------------------------------------------------
  // Persistence
  // ---------------------------------------------------------------------------

  /// Overwrite the persisted workout with `exercises` and `duration`.
  /// Failures are logged, never returned.
  pub async fn save(&self, exercises: &[WorkoutExercise], duration: u64) {
    let _guard = self.write_gate.lock().await;

    let encoded = match serde_json::to_string(exercises) {
      Ok(json) => json,
      Err(e) => {
        tracing::warn!(error = %e, "Failed to encode active workout; not persisted");
        return;
      }
    };

    let entries = [(EXERCISES_KEY, encoded), (DURATION_KEY, duration.to_string())];

    match self.kv.set_many(&entries).await {
      Ok(()) => {
        tracing::debug!(exercises = exercises.len(), duration, "Active workout saved");
        self.changed.notify_waiters();
      }
      Err(e) => {
        tracing::warn!(
          error = %e,
          exercises = exercises.len(),
          "Failed to persist active workout; continuing in memory"
        );
      }
    }
  }

  /// The last persisted workout, or an empty one if there is nothing usable
  pub async fn load(&self) -> ActiveWorkoutState {
    let Some((exercises_json, duration_raw)) = self.read_slots().await else {
      return ActiveWorkoutState::default();
    };

    let duration = match duration_raw.trim().parse::<u64>() {
      Ok(duration) => duration,
      Err(e) => {
        tracing::warn!(error = %e, raw = %duration_raw, "Corrupt active workout duration; ignoring");
        return ActiveWorkoutState::default();
      }
    };

    match serde_json::from_str::<Vec<WorkoutExercise>>(&exercises_json) {
      Ok(exercises) => ActiveWorkoutState::new(exercises, duration),
      Err(e) => {
        tracing::warn!(error = %e, "Corrupt active workout exercises; ignoring");
        ActiveWorkoutState::default()
      }
    }
  }

  /// True when a non-empty exercise list is persisted alongside its duration
  pub async fn has_in_progress(&self) -> bool {
    let Some((exercises_json, duration_raw)) = self.read_slots().await else {
      return false;
    };

    let exercises_json = exercises_json.trim();
    if exercises_json == EMPTY_EXERCISES || duration_raw.trim().parse::<u64>().is_err() {
      return false;
    }

    serde_json::from_str::<Vec<ExerciseProbe>>(exercises_json)
      .map(|exercises| !exercises.is_empty())
      .unwrap_or(false)
  }

  /// Both raw slots from one snapshot, or None if either is absent or unreadable
  async fn read_slots(&self) -> Option<(String, String)> {
    let values = match self.kv.get_many(&[EXERCISES_KEY, DURATION_KEY]).await {
      Ok(values) => values,
      Err(e) => {
        tracing::warn!(error = %e, "Failed to read active workout; treating as none");
        return None;
      }
    };

    let mut values = values.into_iter();
    match (values.next().flatten(), values.next().flatten()) {
      (Some(exercises), Some(duration)) => Some((exercises, duration)),
      _ => None,
    }
  }

  // ---------------------------------------------------------------------------
  // Clearing
  // ---------------------------------------------------------------------------

  /// Remove the persisted workout and drain the pending hand-off buffers.
  ///
  /// The buffers are drained before touching storage, so even a clear that
  /// cannot reach storage leaves nothing behind for the next workout.
  pub async fn clear(&self) -> ClearOutcome {
    self.pending.clear_all();

    let outcome = {
      let _guard = self.write_gate.lock().await;
      self.clear_slots().await
    };
    self.changed.notify_waiters();

    self.delete_legacy_record().await;

    outcome
  }

  async fn clear_slots(&self) -> ClearOutcome {
    let err = match self.kv.remove_many(&[EXERCISES_KEY, DURATION_KEY]).await {
      Ok(()) => return ClearOutcome::Cleared,
      Err(e) => e,
    };

    tracing::warn!(error = %err, "Failed to clear active workout; retrying key by key");

    // Either slot missing already reads as "no workout", so remove the
    // duration first and keep going even if it fails.
    let mut failed = 0;
    for key in [DURATION_KEY, EXERCISES_KEY] {
      if let Err(e) = self.kv.remove(key).await {
        tracing::error!(key, error = %e, "Failed to remove active workout key");
        failed += 1;
      }
    }

    if failed == 0 {
      ClearOutcome::ClearedPerKey
    } else {
      ClearOutcome::Incomplete
    }
  }

  async fn delete_legacy_record(&self) {
    let Some(legacy) = &self.legacy else {
      return;
    };
    let Some(user_id) = legacy.session.user_id() else {
      return;
    };

    match legacy.sink.delete_legacy_active_record(&user_id).await {
      Ok(()) => tracing::debug!(%user_id, "Legacy remote active workout removed"),
      Err(e) => tracing::warn!(%user_id, error = %e, "Failed to remove legacy remote active workout"),
    }
  }
}
