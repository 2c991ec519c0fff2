use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// ---------------------------------------------------------------------------
/// Validation
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
  #[error("Weight must be a finite, non-negative number (got {0})")]
  InvalidWeight(f64),

  #[error("RPE must be between 0 and 10 (got {0})")]
  InvalidRpe(f64),

  #[error("Rep range minimum {min} exceeds maximum {max}")]
  InvalidRepRange { min: u32, max: u32 },

  #[error("Exercise name must not be empty")]
  EmptyName,

  #[error("Completed set {set_number} of '{exercise}' has neither reps nor a rep range")]
  MissingReps { exercise: String, set_number: usize },
}

fn check_weight(weight: Option<f64>) -> Result<(), ValidationError> {
  match weight {
    Some(w) if !w.is_finite() || w < 0.0 => Err(ValidationError::InvalidWeight(w)),
    _ => Ok(()),
  }
}

fn check_rpe(rpe: Option<f64>) -> Result<(), ValidationError> {
  match rpe {
    Some(r) if !r.is_finite() || !(0.0..=10.0).contains(&r) => Err(ValidationError::InvalidRpe(r)),
    _ => Ok(()),
  }
}

/// ---------------------------------------------------------------------------
/// Set Types
/// ---------------------------------------------------------------------------

/// Informational tag on a set. `Working` is the numbered top set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetType {
  #[serde(rename = "warm-up")]
  WarmUp,
  #[serde(rename = "1")]
  Working,
  #[serde(rename = "failure")]
  Failure,
  #[serde(rename = "drop-set")]
  DropSet,
}

/// How sets of an exercise are measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
  #[default]
  Weighted,
  Bodyweight,
  Timed,
}

impl ExerciseKind {
  /// Completed sets of this kind need a rep count or target
  pub fn requires_reps(&self) -> bool {
    matches!(self, ExerciseKind::Weighted)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepRange {
  pub min: u32,
  pub max: u32,
}

impl RepRange {
  pub fn new(min: u32, max: u32) -> Result<Self, ValidationError> {
    if min > max {
      return Err(ValidationError::InvalidRepRange { min, max });
    }
    Ok(Self { min, max })
  }
}

/// ---------------------------------------------------------------------------
/// Exercise Sets
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseSet {
  pub id: String,
  #[serde(default)]
  pub weight: Option<f64>,
  #[serde(default)]
  pub reps: Option<u32>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub rep_range: Option<RepRange>,
  #[serde(default)]
  pub rpe: Option<f64>,
  #[serde(default)]
  pub completed: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub set_type: Option<SetType>,
}

impl ExerciseSet {
  /// Create a not-yet-completed set with a fresh id
  pub fn new(weight: Option<f64>, reps: Option<u32>) -> Result<Self, ValidationError> {
    check_weight(weight)?;
    Ok(Self {
      id: Uuid::new_v4().to_string(),
      weight,
      reps,
      rep_range: None,
      rpe: None,
      completed: false,
      set_type: None,
    })
  }

  /// Empty placeholder row, as added by the "add set" button
  pub fn blank() -> Self {
    Self {
      id: Uuid::new_v4().to_string(),
      weight: None,
      reps: None,
      rep_range: None,
      rpe: None,
      completed: false,
      set_type: None,
    }
  }

  pub fn with_rpe(mut self, rpe: f64) -> Result<Self, ValidationError> {
    check_rpe(Some(rpe))?;
    self.rpe = Some(rpe);
    Ok(self)
  }

  pub fn with_rep_range(mut self, range: RepRange) -> Self {
    self.rep_range = Some(range);
    self
  }

  pub fn with_set_type(mut self, set_type: SetType) -> Self {
    self.set_type = Some(set_type);
    self
  }

  pub fn completed(mut self) -> Self {
    self.completed = true;
    self
  }

  /// weight × reps; missing values contribute nothing
  pub fn volume(&self) -> f64 {
    match (self.weight, self.reps) {
      (Some(weight), Some(reps)) => weight * reps as f64,
      _ => 0.0,
    }
  }

  fn validate_values(&self) -> Result<(), ValidationError> {
    check_weight(self.weight)?;
    check_rpe(self.rpe)?;
    if let Some(range) = self.rep_range {
      RepRange::new(range.min, range.max)?;
    }
    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Workout Exercises
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutExercise {
  pub id: String,
  pub name: String,
  #[serde(default)]
  pub kind: ExerciseKind,
  #[serde(default)]
  pub primary_muscle: String,
  #[serde(default)]
  pub secondary_muscles: Vec<String>,
  /// Seconds between sets
  #[serde(default)]
  pub rest_timer: u32,
  #[serde(default)]
  pub notes: String,
  /// Order defines set numbering
  #[serde(default)]
  pub sets: Vec<ExerciseSet>,
}

impl WorkoutExercise {
  pub fn new(name: &str, kind: ExerciseKind) -> Result<Self, ValidationError> {
    let name = name.trim();
    if name.is_empty() {
      return Err(ValidationError::EmptyName);
    }
    Ok(Self {
      id: Uuid::new_v4().to_string(),
      name: name.to_string(),
      kind,
      primary_muscle: String::new(),
      secondary_muscles: Vec::new(),
      rest_timer: 0,
      notes: String::new(),
      sets: Vec::new(),
    })
  }

  pub fn with_muscles(mut self, primary: &str, secondary: &[&str]) -> Self {
    self.primary_muscle = primary.to_string();
    self.secondary_muscles = secondary.iter().map(|m| m.to_string()).collect();
    self
  }

  pub fn with_rest_timer(mut self, seconds: u32) -> Self {
    self.rest_timer = seconds;
    self
  }

  pub fn with_set(mut self, set: ExerciseSet) -> Self {
    self.sets.push(set);
    self
  }

  pub fn completed_sets(&self) -> impl Iterator<Item = &ExerciseSet> {
    self.sets.iter().filter(|s| s.completed)
  }

  /// Check every set, applying the reps rule only to completed sets so that
  /// half-filled rows can still be persisted while the workout is running.
  pub fn validate(&self) -> Result<(), ValidationError> {
    if self.name.trim().is_empty() {
      return Err(ValidationError::EmptyName);
    }

    for (idx, set) in self.sets.iter().enumerate() {
      set.validate_values()?;

      if set.completed && self.kind.requires_reps() && set.reps.is_none() && set.rep_range.is_none() {
        return Err(ValidationError::MissingReps {
          exercise: self.name.clone(),
          set_number: idx + 1,
        });
      }
    }

    Ok(())
  }
}

/// ---------------------------------------------------------------------------
/// Active Workout State
/// ---------------------------------------------------------------------------

/// The workout currently being logged on this device
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActiveWorkoutState {
  pub exercises: Vec<WorkoutExercise>,
  /// Elapsed seconds
  pub duration: u64,
}

impl ActiveWorkoutState {
  pub fn new(exercises: Vec<WorkoutExercise>, duration: u64) -> Self {
    Self { exercises, duration }
  }

  /// An empty exercise list is the same as no workout at all
  pub fn is_in_progress(&self) -> bool {
    !self.exercises.is_empty()
  }
}
