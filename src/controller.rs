//! Lifecycle controller - the play/pause/stop/quit state machine.
//!
//! The controller owns the payload and runs its hooks. `play()` runs the loop
//! on the caller's thread and blocks until it exits; `pause()`, `stop()` and
//! `quit()` are issued from other threads:
//!
//! - `stop()` and `quit()` take effect at the end of the iteration in flight.
//!   Once `running=false` is visible, at most one more tick + variant pair
//!   runs.
//! - A `stop()` issued while `play()` is still in `pre_loop` is kept until
//!   the loop is entered; the loop then runs no iterations.
//! - `quit()` returns only after the play session (loop plus `post_loop`)
//!   has finished, and retires the controller.

use std::fmt;
use std::sync::{Mutex, MutexGuard, TryLockError};
use std::thread;

use log::{debug, info, trace, warn};

use crate::config::ControllerConfig;
use crate::error::{LifecycleError, Result};
use crate::flags::{LifecycleFlags, PlaySession, SessionGuard};
use crate::payload::{HookKind, Payload};
use crate::state::LifecycleState;
use crate::stats::{LoopStats, StatsRecorder};

/// Drives a [`Payload`] through the lifecycle.
///
/// Share it between the loop thread and command threads with an `Arc`.
pub struct Controller<P: Payload> {
    payload: Mutex<P>,
    flags: LifecycleFlags,
    session: PlaySession,
    stats: StatsRecorder,
    config: ControllerConfig,
}

/// Clears `in_loop` and records the loop exit on drop, so a failing or
/// panicking hook still leaves the flags consistent.
struct InLoopGuard<'a> {
    flags: &'a LifecycleFlags,
    stats: &'a StatsRecorder,
}

impl<'a> InLoopGuard<'a> {
    fn enter(flags: &'a LifecycleFlags, stats: &'a StatsRecorder) -> Self {
        flags.enter_loop();
        stats.loop_started();
        Self { flags, stats }
    }
}

impl Drop for InLoopGuard<'_> {
    fn drop(&mut self) {
        self.stats.loop_finished();
        self.flags.exit_loop();
    }
}

impl<P: Payload> Controller<P> {
    /// Create a controller with default configuration
    pub fn new(payload: P) -> Self {
        Self::with_config(payload, ControllerConfig::default())
    }

    /// Create a controller with custom configuration
    pub fn with_config(payload: P, config: ControllerConfig) -> Self {
        Self {
            payload: Mutex::new(payload),
            flags: LifecycleFlags::new(),
            session: PlaySession::new(),
            stats: StatsRecorder::default(),
            config,
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Reset the flags and statistics, then run the payload's `init` hook.
    ///
    /// Meant to be called once before any other command.
    pub fn initialize(&self) -> Result<(), P::Error> {
        let _session = self.claim_session()?;

        self.flags.reset();
        self.stats.reset();

        let mut payload = self.lock_payload()?;
        payload
            .init()
            .map_err(|e| LifecycleError::hook(HookKind::Init, e))?;
        self.flags.mark_initialized();

        debug!("Controller initialized");
        Ok(())
    }

    /// Run one play session: `pre_loop`, the loop, then `post_loop`.
    ///
    /// Blocks until the loop exits after `stop()` or `quit()` from another
    /// thread, or until a hook fails. A failure inside the loop skips
    /// `post_loop`.
    pub fn play(&self) -> Result<(), P::Error> {
        let _session = self.claim_session()?;
        let mut payload = self.lock_payload()?;

        info!("Play session started");
        payload
            .pre_loop()
            .map_err(|e| LifecycleError::hook(HookKind::PreLoop, e))?;

        self.run_loop(&mut payload)?;

        payload
            .post_loop()
            .map_err(|e| LifecycleError::hook(HookKind::PostLoop, e))?;
        info!("Play session finished");
        Ok(())
    }

    /// Toggle the pause state and return the new value.
    ///
    /// Before a loop starts this sets the pause state the loop starts in.
    pub fn pause(&self) -> bool {
        let paused = self.flags.toggle_paused();
        debug!("Pause toggled: paused={}", paused);
        paused
    }

    /// Ask the loop to exit after the iteration in flight. Does not wait.
    pub fn stop(&self) {
        // Recorded before the store so run_loop sees one or the other
        let pending = self.session.request_stop();
        self.flags.set_running(false);
        debug!("Stop requested (session active={})", pending);
    }

    /// Stop the loop, wait until the play session has fully finished, and
    /// retire the controller.
    ///
    /// Returns immediately when no play session is active. Calling it from a
    /// hook cannot wait for the loop it is running in, so it only sets the
    /// flags in that case.
    pub fn quit(&self) {
        let first = self.flags.retire();
        self.flags.set_running(false);

        if self.session.is_owned_by(thread::current().id()) {
            warn!("quit() called from the loop thread; not waiting for the loop to exit");
            return;
        }

        self.session.wait_finished();
        if first {
            info!("Controller retired");
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        LifecycleState::from_flags(&self.flags)
    }

    pub fn is_running(&self) -> bool {
        self.flags.is_running()
    }

    pub fn is_paused(&self) -> bool {
        self.flags.is_paused()
    }

    /// Whether a play session is in progress, from before `pre_loop` until
    /// after `post_loop`
    pub fn is_playing(&self) -> bool {
        self.session.is_active()
    }

    /// Whether the loop runner is executing right now
    pub fn in_loop(&self) -> bool {
        self.flags.in_loop()
    }

    pub fn is_retired(&self) -> bool {
        self.flags.is_retired()
    }

    /// Snapshot of the loop statistics
    pub fn stats(&self) -> LoopStats {
        self.stats.snapshot()
    }

    /// Borrow the payload.
    ///
    /// Blocks while a play session holds the payload.
    pub fn with_payload<R>(&self, f: impl FnOnce(&P) -> R) -> Result<R, P::Error> {
        let payload = self.lock_payload()?;
        Ok(f(&payload))
    }

    /// Borrow the payload if no play session holds it.
    ///
    /// Returns `Ok(None)` instead of blocking.
    pub fn try_with_payload<R>(&self, f: impl FnOnce(&P) -> R) -> Result<Option<R>, P::Error> {
        match self.payload.try_lock() {
            Ok(payload) => Ok(Some(f(&payload))),
            Err(TryLockError::WouldBlock) => Ok(None),
            Err(TryLockError::Poisoned(_)) => Err(LifecycleError::Poisoned),
        }
    }

    /// Consume the controller and hand back the payload
    pub fn into_payload(self) -> Result<P, P::Error> {
        self.payload.into_inner().map_err(|_| LifecycleError::Poisoned)
    }

    /// Claim the play session, then check retirement under it. A quit()
    /// that retired first is seen here; one that retires later finds the
    /// session active and waits for it.
    fn claim_session(&self) -> Result<SessionGuard<'_>, P::Error> {
        let Some(session) = self.session.claim() else {
            warn!("Rejected: a play session is already active");
            return Err(LifecycleError::AlreadyPlaying);
        };
        if self.flags.is_retired() {
            return Err(LifecycleError::Retired);
        }
        Ok(session)
    }

    fn lock_payload(&self) -> Result<MutexGuard<'_, P>, P::Error> {
        self.payload.lock().map_err(|_| LifecycleError::Poisoned)
    }

    fn run_loop(&self, payload: &mut P) -> Result<(), P::Error> {
        self.flags.set_running(true);
        // A stop() or quit() issued during pre_loop must not be overwritten
        // by the store above.
        let stop_pending = self.session.take_stop_request();
        if stop_pending || self.flags.is_retired() {
            self.flags.set_running(false);
            debug!("Stop requested before loop entry, skipping loop");
            return Ok(());
        }

        let _in_loop = InLoopGuard::enter(&self.flags, &self.stats);
        debug!("Loop entered (paused={})", self.flags.is_paused());

        loop {
            payload
                .tick()
                .map_err(|e| LifecycleError::hook(HookKind::Tick, e))?;

            let paused = self.flags.is_paused();
            if paused {
                payload
                    .pause_tick()
                    .map_err(|e| LifecycleError::hook(HookKind::PauseTick, e))?;
            } else {
                payload
                    .play_tick()
                    .map_err(|e| LifecycleError::hook(HookKind::PlayTick, e))?;
            }
            self.stats.iteration(paused);
            trace!("Iteration done (paused={})", paused);

            if !self.flags.is_running() {
                break;
            }
            self.config.pacing.between_iterations();
        }

        debug!("Loop exited");
        Ok(())
    }
}

impl<P: Payload> fmt::Debug for Controller<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Controller")
            .field("state", &self.state())
            .field("flags", &self.flags)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
