//! Shared lifecycle flags and the play-session monitor
//!
//! The flags are written by command threads and read by the loop thread once
//! per iteration. All accesses use `SeqCst` so a write is visible to the loop
//! at its next check.
//!
//! [`PlaySession`] marks the span of one `play()` call and is what `quit()`
//! blocks on.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

/// The boolean signals shared between the loop thread and command threads
#[derive(Debug, Default)]
pub struct LifecycleFlags {
    running: AtomicBool,
    paused: AtomicBool,
    in_loop: AtomicBool,
    retired: AtomicBool,
    initialized: AtomicBool,
}

impl LifecycleFlags {
    /// Create flags with every signal cleared
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear `running`, `paused` and `in_loop`
    pub fn reset(&self) {
        self.running.store(false, Ordering::SeqCst);
        self.paused.store(false, Ordering::SeqCst);
        self.in_loop.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Flip `paused` and return the new value
    pub fn toggle_paused(&self) -> bool {
        !self.paused.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn in_loop(&self) -> bool {
        self.in_loop.load(Ordering::SeqCst)
    }

    pub(crate) fn enter_loop(&self) {
        self.in_loop.store(true, Ordering::SeqCst);
    }

    pub(crate) fn exit_loop(&self) {
        self.in_loop.store(false, Ordering::SeqCst);
    }

    pub fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    /// Mark as retired; returns true only for the first call
    pub fn retire(&self) -> bool {
        !self.retired.swap(true, Ordering::SeqCst)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }
}

/// Monitor guarding "a play session is in progress".
///
/// Holds the id of the thread that owns the session so `quit()` can tell
/// when it is being called from inside a hook, and a stop request made
/// before the loop was entered.
#[derive(Debug, Default)]
pub struct PlaySession {
    state: Mutex<SessionState>,
    finished: Condvar,
}

#[derive(Debug, Default)]
struct SessionState {
    owner: Option<ThreadId>,
    stop_requested: bool,
}

impl PlaySession {
    pub fn new() -> Self {
        Self::default()
    }

    // The mutex is never held across payload code, so a poisoned lock still
    // holds a consistent state.
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the session for the current thread.
    ///
    /// Returns `None` if another session is active. The session ends when the
    /// returned guard is dropped.
    pub fn claim(&self) -> Option<SessionGuard<'_>> {
        let mut state = self.lock();
        if state.owner.is_some() {
            return None;
        }
        state.owner = Some(thread::current().id());
        state.stop_requested = false;
        Some(SessionGuard { session: self })
    }

    pub fn is_active(&self) -> bool {
        self.lock().owner.is_some()
    }

    /// Whether the given thread owns the active session
    pub fn is_owned_by(&self, id: ThreadId) -> bool {
        self.lock().owner == Some(id)
    }

    /// Record a stop for the active session.
    ///
    /// Returns false, recording nothing, when no session is active.
    pub fn request_stop(&self) -> bool {
        let mut state = self.lock();
        if state.owner.is_none() {
            return false;
        }
        state.stop_requested = true;
        true
    }

    /// Take the pending stop request, clearing it
    pub fn take_stop_request(&self) -> bool {
        std::mem::take(&mut self.lock().stop_requested)
    }

    /// Block until no session is active. Returns immediately if none is.
    pub fn wait_finished(&self) {
        let mut state = self.lock();
        while state.owner.is_some() {
            state = self
                .finished
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn release(&self) {
        let mut state = self.lock();
        state.owner = None;
        state.stop_requested = false;
        self.finished.notify_all();
    }
}

/// Ends the play session on drop, including during unwinding.
#[derive(Debug)]
pub struct SessionGuard<'a> {
    session: &'a PlaySession,
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        self.session.release();
    }
}
