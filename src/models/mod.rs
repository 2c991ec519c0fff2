pub mod completed;
pub mod workout;

pub use completed::{CompletedWorkoutRecord, Visibility, WorkoutDraft};
pub use workout::{
  ActiveWorkoutState, ExerciseKind, ExerciseSet, RepRange, SetType, ValidationError, WorkoutExercise,
};
