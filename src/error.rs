//! Error types for mainloop
//!
//! Centralized error handling using thiserror. Failures raised by payload
//! hooks travel inside [`LifecycleError::Hook`] without being converted.

use thiserror::Error;

use crate::payload::HookKind;

/// All error types a controller command can return.
///
/// `E` is the payload's own error type.
#[derive(Debug, Error)]
pub enum LifecycleError<E> {
    /// A payload hook returned an error
    #[error("{hook} hook failed: {source}")]
    Hook {
        /// Which hook failed
        hook: HookKind,
        /// The payload's error, unmodified
        #[source]
        source: E,
    },

    /// A play session (or initialize) is already in progress
    #[error("Controller already has an active play session")]
    AlreadyPlaying,

    /// quit() has retired the controller
    #[error("Controller has been retired by quit")]
    Retired,

    /// A hook panicked while the payload was locked
    #[error("Payload lock poisoned by a panicking hook")]
    Poisoned,
}

impl<E> LifecycleError<E> {
    pub(crate) fn hook(hook: HookKind, source: E) -> Self {
        Self::Hook { hook, source }
    }

    /// The hook that failed, if this is a hook failure
    pub fn failed_hook(&self) -> Option<HookKind> {
        match self {
            Self::Hook { hook, .. } => Some(*hook),
            _ => None,
        }
    }

    /// Unwrap the payload's error, if this is a hook failure
    pub fn into_hook_error(self) -> Option<E> {
        match self {
            Self::Hook { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result type alias for controller commands
pub type Result<T, E> = std::result::Result<T, LifecycleError<E>>;
