//! Callback watchdog timer.
//!
//! Bounds the time the user can be stuck on the callback screen. One slot:
//! arming replaces any prior timer, canceling is idempotent, and a due timer
//! fires exactly once (`fire_if_due` consumes the slot). The liveness of the
//! whole session machine rests on this; a hung OAuth exchange would otherwise
//! be a permanent dead end.

use std::time::{Duration, Instant};

use crate::services::time_source::SharedTimeSource;

#[derive(Debug)]
struct ArmedTimer {
    deadline: Instant,
    generation: u64,
}

/// A one-slot cancelable deadline driven by a [`TimeSource`].
///
/// [`TimeSource`]: crate::services::time_source::TimeSource
#[derive(Debug)]
pub struct CallbackWatchdog {
    time: SharedTimeSource,
    timeout: Duration,
    armed: Option<ArmedTimer>,
    generation: u64,
}

impl CallbackWatchdog {
    pub fn new(time: SharedTimeSource, timeout: Duration) -> Self {
        Self {
            time,
            timeout,
            armed: None,
            generation: 0,
        }
    }

    /// Start (or restart) the timer. A prior armed timer is implicitly
    /// canceled; there is never more than one instance.
    pub fn arm(&mut self) {
        self.generation += 1;
        let deadline = self.time.deadline_in(self.timeout);
        tracing::debug!(
            generation = self.generation,
            timeout_ms = self.timeout.as_millis() as u64,
            "Arming callback watchdog"
        );
        self.armed = Some(ArmedTimer {
            deadline,
            generation: self.generation,
        });
    }

    /// Cancel the timer. No-op when nothing is armed or it already fired.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.armed.take() {
            tracing::debug!(generation = timer.generation, "Canceled callback watchdog");
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Time left until the deadline, if armed. Saturates at zero.
    pub fn remaining(&self) -> Option<Duration> {
        self.armed
            .as_ref()
            .map(|t| t.deadline.saturating_duration_since(self.time.now()))
    }

    /// Consume the slot if the deadline has passed. Returns true at most
    /// once per arming.
    pub fn fire_if_due(&mut self) -> bool {
        let due = self
            .armed
            .as_ref()
            .is_some_and(|t| self.time.now() >= t.deadline);
        if due {
            let timer = self.armed.take();
            tracing::info!(
                generation = timer.map(|t| t.generation).unwrap_or_default(),
                "Callback watchdog fired"
            );
        }
        due
    }
}
