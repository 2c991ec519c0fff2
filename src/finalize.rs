//! Completed-workout hand-off
//!
//! Turns the active workout into a permanent record: keep only completed
//! sets, drop exercises left without any, total up volume and sets, submit
//! once, then clear local state whatever the submission did.

use chrono::Utc;
use thiserror::Error;

use crate::active_workout::ActiveWorkoutStore;
use crate::models::{ActiveWorkoutState, CompletedWorkoutRecord, WorkoutDraft, WorkoutExercise};
use crate::sink::{CompletedWorkoutSink, SinkError};

#[derive(Debug, Error)]
pub enum FinalizeError {
  #[error("Workout has no completed sets")]
  NothingToSave,

  #[error(transparent)]
  Sink(#[from] SinkError),
}

/// Build the record the sink persists. Volume and set count only cover
/// completed sets.
pub fn build_completed_record(state: &ActiveWorkoutState, draft: &WorkoutDraft) -> CompletedWorkoutRecord {
  let exercises: Vec<WorkoutExercise> = state
    .exercises
    .iter()
    .filter_map(|exercise| {
      let sets: Vec<_> = exercise.completed_sets().cloned().collect();
      if sets.is_empty() {
        return None;
      }
      Some(WorkoutExercise {
        sets,
        ..exercise.clone()
      })
    })
    .collect();

  let volume: f64 = exercises
    .iter()
    .flat_map(|e| &e.sets)
    .map(|s| s.volume())
    .sum();

  let total_sets = exercises.iter().map(|e| e.sets.len()).sum();

  CompletedWorkoutRecord {
    title: draft.title.trim().to_string(),
    description: draft.description.trim().to_string(),
    visibility: draft.visibility,
    duration: state.duration,
    volume,
    total_sets,
    exercises,
    created_at: Utc::now(),
  }
}

/// Submit `state` as a completed workout, then clear the active workout.
///
/// A workout with no completed sets is rejected before anything is sent and
/// stays active. Otherwise the record is committed exactly once and local
/// state is cleared even when the commit fails; the commit error is still
/// returned so the caller can warn that the workout may not be backed up.
pub async fn finalize_workout(
  store: &ActiveWorkoutStore,
  sink: &dyn CompletedWorkoutSink,
  user_id: Option<&str>,
  state: &ActiveWorkoutState,
  draft: &WorkoutDraft,
) -> Result<String, FinalizeError> {
  let record = build_completed_record(state, draft);
  if record.total_sets == 0 {
    return Err(FinalizeError::NothingToSave);
  }

  let result = sink.commit(&record, user_id).await;

  store.clear().await;

  match result {
    Ok(id) => {
      tracing::info!(workout_id = %id, volume = record.volume, "Workout finalized");
      Ok(id)
    }
    Err(e) => {
      tracing::error!(error = %e, total_sets = record.total_sets, "Workout submission failed after local clear");
      Err(e.into())
    }
  }
}
