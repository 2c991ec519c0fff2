//! Resume/discard banner feed
//!
//! The overlay only needs to know whether a workout is in progress and a
//! short summary of it. A background task re-checks the store on a fixed
//! interval and also right after every save or clear, publishing the latest
//! snapshot on a watch channel. The task stops once every receiver is gone.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::active_workout::ActiveWorkoutStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceSnapshot {
  pub in_progress: bool,
  pub exercise_count: usize,
  pub duration: u64,
}

/// Read-only view of the store for the overlay
pub async fn presence_snapshot(store: &ActiveWorkoutStore) -> PresenceSnapshot {
  if !store.has_in_progress().await {
    return PresenceSnapshot::default();
  }

  let state = store.load().await;
  PresenceSnapshot {
    in_progress: state.is_in_progress(),
    exercise_count: state.exercises.len(),
    duration: state.duration,
  }
}

pub fn spawn_presence_poller(
  store: Arc<ActiveWorkoutStore>,
  interval: Duration,
) -> (watch::Receiver<PresenceSnapshot>, JoinHandle<()>) {
  let (tx, rx) = watch::channel(PresenceSnapshot::default());

  let handle = tokio::spawn(async move {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // First tick is immediate; the loop already starts with a snapshot
    ticker.tick().await;

    loop {
      // Registered before the snapshot so a save or clear during the read
      // still wakes the next wait
      let changed = store.changes();
      tokio::pin!(changed);
      changed.as_mut().enable();

      let next = presence_snapshot(&store).await;
      tx.send_if_modified(|current| {
        if *current == next {
          return false;
        }
        *current = next;
        true
      });

      tokio::select! {
        _ = ticker.tick() => {}
        _ = &mut changed => {}
        _ = tx.closed() => break,
      }
    }

    tracing::debug!("Presence poller stopped");
  });

  (rx, handle)
}
