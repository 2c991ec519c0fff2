use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::workout::WorkoutExercise;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
  #[default]
  Everyone,
  Private,
}

/// What the user enters on the finish screen before saving
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorkoutDraft {
  pub title: String,
  #[serde(default)]
  pub description: String,
  #[serde(default)]
  pub visibility: Visibility,
}

impl WorkoutDraft {
  pub fn new(title: &str) -> Self {
    Self {
      title: title.to_string(),
      ..Self::default()
    }
  }

  pub fn with_description(mut self, description: &str) -> Self {
    self.description = description.to_string();
    self
  }

  pub fn with_visibility(mut self, visibility: Visibility) -> Self {
    self.visibility = visibility;
    self
  }
}

/// A finalized workout as handed to the remote sink.
/// Only completed sets are kept, and exercises without any are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedWorkoutRecord {
  pub title: String,
  pub description: String,
  pub visibility: Visibility,
  pub duration: u64,
  pub volume: f64,
  pub total_sets: usize,
  pub exercises: Vec<WorkoutExercise>,
  pub created_at: DateTime<Utc>,
}
