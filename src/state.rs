//! Observable lifecycle state derived from the controller flags

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::flags::LifecycleFlags;

/// Where the controller is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleState {
    /// Constructed but `initialize()` not yet called
    Uninitialized,
    /// Initialized, no loop iterating
    Idle,
    /// Loop iterating with `play_tick`
    Running,
    /// Loop iterating with `pause_tick`
    Paused,
    /// stop or quit issued, iteration in flight finishing
    Stopping,
    /// quit() called; terminal
    Retired,
}

impl LifecycleState {
    /// Derive the state from a snapshot of the flags.
    ///
    /// Each flag is read separately, so a state observed while commands are
    /// landing may be one transition behind.
    pub fn from_flags(flags: &LifecycleFlags) -> Self {
        if flags.in_loop() {
            if !flags.is_running() {
                LifecycleState::Stopping
            } else if flags.is_paused() {
                LifecycleState::Paused
            } else {
                LifecycleState::Running
            }
        } else if flags.is_retired() {
            LifecycleState::Retired
        } else if flags.is_initialized() {
            LifecycleState::Idle
        } else {
            LifecycleState::Uninitialized
        }
    }

    /// Whether a loop is iterating in this state
    pub fn is_looping(&self) -> bool {
        matches!(
            self,
            LifecycleState::Running | LifecycleState::Paused | LifecycleState::Stopping
        )
    }

    /// Whether no further transitions are possible
    pub fn is_terminal(&self) -> bool {
        matches!(self, LifecycleState::Retired)
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Uninitialized => "uninitialized",
            LifecycleState::Idle => "idle",
            LifecycleState::Running => "running",
            LifecycleState::Paused => "paused",
            LifecycleState::Stopping => "stopping",
            LifecycleState::Retired => "retired",
        };
        f.write_str(name)
    }
}
