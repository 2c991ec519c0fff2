//! Single-slot hand-off buffers between screens
//!
//! A picker screen fills a slot with its selection and the workout screen
//! drains it when it regains focus. Each slot is take-once: the first
//! `consume_pending` returns everything, the next returns nothing. Only one
//! producer may fill a slot at a time; a second `set_pending` before the
//! consumer drains silently replaces the first selection.

use std::sync::{Mutex, PoisonError};

use crate::models::WorkoutExercise;

pub struct PendingSelection<T> {
  slot: Mutex<Vec<T>>,
}

impl<T> Default for PendingSelection<T> {
  fn default() -> Self {
    Self {
      slot: Mutex::new(Vec::new()),
    }
  }
}

impl<T> PendingSelection<T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Replace whatever is in the slot
  pub fn set_pending(&self, items: Vec<T>) {
    let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
    *slot = items;
  }

  /// Take the contents and leave the slot empty, under one lock
  pub fn consume_pending(&self) -> Vec<T> {
    let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
    std::mem::take(&mut *slot)
  }

  pub fn is_empty(&self) -> bool {
    self.slot.lock().unwrap_or_else(PoisonError::into_inner).is_empty()
  }

  pub fn clear(&self) {
    self.consume_pending();
  }
}

/// Process-wide hand-off slots used by the workout logging flow
#[derive(Default)]
pub struct PendingSelections {
  /// Exercises picked to be appended to the active workout
  pub added: PendingSelection<WorkoutExercise>,
  /// Exercise picked to replace one already in the workout
  pub replacement: PendingSelection<WorkoutExercise>,
}

impl PendingSelections {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn clear_all(&self) {
    self.added.clear();
    self.replacement.clear();
  }
}
