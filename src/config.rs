//! Controller configuration

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// What the loop runner does between iterations.
///
/// Pacing only inserts a pause between a finished iteration and the next
/// one; it never reorders hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Pacing {
    /// Yield the thread to the scheduler
    #[default]
    Yield,
    /// Go straight into the next iteration
    Spin,
    /// Sleep for a fixed interval
    Sleep {
        /// Milliseconds to sleep
        interval_ms: u64,
    },
}

impl Pacing {
    /// Sleep pacing with the given interval, saturating at `u64::MAX` ms
    pub fn sleep(interval: Duration) -> Self {
        Pacing::Sleep {
            interval_ms: u64::try_from(interval.as_millis()).unwrap_or(u64::MAX),
        }
    }

    pub(crate) fn between_iterations(&self) {
        match self {
            Pacing::Yield => thread::yield_now(),
            Pacing::Spin => {}
            Pacing::Sleep { interval_ms } => thread::sleep(Duration::from_millis(*interval_ms)),
        }
    }
}

/// Configuration for a [`Controller`](crate::Controller)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Between-iteration pacing
    pub pacing: Pacing,
}

impl ControllerConfig {
    /// Set the pacing
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }
}
