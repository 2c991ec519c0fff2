//! Screen-facing commands for the workout logging flow
//!
//! Errors are flattened to strings for the UI bridge.

use crate::db::AppState;
use crate::finalize::finalize_workout;
use crate::models::{ActiveWorkoutState, WorkoutDraft, WorkoutExercise};
use crate::presence::{presence_snapshot, PresenceSnapshot};
use crate::sink::SinkError;

/// Persist the workout being edited. Called after every change.
///
/// Invalid exercises are rejected; storage failures are not reported.
pub async fn save_active_workout(
  state: &AppState,
  exercises: Vec<WorkoutExercise>,
  duration: u64,
) -> Result<(), String> {
  for exercise in &exercises {
    exercise
      .validate()
      .map_err(|e| format!("Invalid exercise: {}", e))?;
  }

  state.workout.save(&exercises, duration).await;
  Ok(())
}

pub async fn load_active_workout(state: &AppState) -> Result<ActiveWorkoutState, String> {
  Ok(state.workout.load().await)
}

pub async fn has_workout_in_progress(state: &AppState) -> Result<bool, String> {
  Ok(state.workout.has_in_progress().await)
}

pub async fn get_workout_presence(state: &AppState) -> Result<PresenceSnapshot, String> {
  Ok(presence_snapshot(&state.workout).await)
}

/// Throw away the active workout
pub async fn discard_active_workout(state: &AppState) -> Result<(), String> {
  let outcome = state.workout.clear().await;
  tracing::info!(?outcome, "Active workout discarded");
  Ok(())
}

/// Save the active workout as a completed workout for the signed-in user
pub async fn finish_active_workout(state: &AppState, draft: WorkoutDraft) -> Result<String, String> {
  let sink = state
    .sink
    .clone()
    .ok_or_else(|| SinkError::MissingConfig("WORKOUT_API_URL".into()).to_string())?;

  let active = state.workout.load().await;
  let user_id = state.session.user_id();

  finalize_workout(&state.workout, sink.as_ref(), user_id.as_deref(), &active, &draft)
    .await
    .map_err(|e| format!("Failed to save workout: {}", e))
}

/// ---------------------------------------------------------------------------
/// Exercise Picker Hand-off
/// ---------------------------------------------------------------------------

pub async fn select_exercises(state: &AppState, exercises: Vec<WorkoutExercise>) -> Result<(), String> {
  state.pending.added.set_pending(exercises);
  Ok(())
}

pub async fn take_selected_exercises(state: &AppState) -> Result<Vec<WorkoutExercise>, String> {
  Ok(state.pending.added.consume_pending())
}

pub async fn select_replacement_exercise(state: &AppState, exercise: WorkoutExercise) -> Result<(), String> {
  state.pending.replacement.set_pending(vec![exercise]);
  Ok(())
}

pub async fn take_replacement_exercise(state: &AppState) -> Result<Option<WorkoutExercise>, String> {
  Ok(state.pending.replacement.consume_pending().into_iter().next())
}
