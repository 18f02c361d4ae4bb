//! Payload hooks driven by the controller
//!
//! A payload supplies the per-iteration work. Every hook has a no-op default,
//! so implementors override only what they need. [`Hooks`] builds a payload
//! out of closures instead of a dedicated type.

use std::convert::Infallible;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifies one of the six payload hooks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    /// Once, from `initialize()`
    Init,
    /// Before each loop
    PreLoop,
    /// After each loop
    PostLoop,
    /// Every iteration, regardless of pause state
    Tick,
    /// Every iteration while paused
    PauseTick,
    /// Every iteration while not paused
    PlayTick,
}

impl HookKind {
    /// Stable lowercase name of the hook
    pub fn as_str(&self) -> &'static str {
        match self {
            HookKind::Init => "init",
            HookKind::PreLoop => "pre_loop",
            HookKind::PostLoop => "post_loop",
            HookKind::Tick => "tick",
            HookKind::PauseTick => "pause_tick",
            HookKind::PlayTick => "play_tick",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-iteration work plugged into a [`Controller`](crate::Controller).
///
/// Hooks run on the thread that called `play()` (or `initialize()` for
/// [`init`](Payload::init)). An error returned from any hook propagates to
/// that caller; an error inside the loop ends the loop.
///
/// Hooks are expected to return promptly: `stop()` and `quit()` only take
/// effect between iterations.
pub trait Payload: Send {
    /// Error type the hooks can fail with
    type Error: std::error::Error + Send + Sync + 'static;

    /// Called once from `initialize()`
    fn init(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called by `play()` before the loop starts
    fn pre_loop(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called by `play()` after the loop exits
    fn post_loop(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called every iteration, paused or not
    fn tick(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after `tick` on iterations where the controller is paused
    fn pause_tick(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Called after `tick` on iterations where the controller is not paused
    fn play_tick(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Payload whose hooks all do nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPayload;

impl Payload for NoopPayload {
    type Error = Infallible;
}

type HookFn<E> = Box<dyn FnMut() -> Result<(), E> + Send>;

/// Payload assembled from optional callbacks.
///
/// ```
/// use std::convert::Infallible;
/// use mainloop::{Hooks, Payload};
///
/// let mut frames = 0;
/// let mut hooks: Hooks<Infallible> = Hooks::new().on_play_tick(move || {
///     frames += 1;
///     Ok(())
/// });
/// hooks.play_tick().unwrap();
/// assert!(hooks.is_set(mainloop::HookKind::PlayTick));
/// ```
pub struct Hooks<E> {
    init: Option<HookFn<E>>,
    pre_loop: Option<HookFn<E>>,
    post_loop: Option<HookFn<E>>,
    tick: Option<HookFn<E>>,
    pause_tick: Option<HookFn<E>>,
    play_tick: Option<HookFn<E>>,
}

impl<E> Hooks<E> {
    /// Create a set with no callbacks installed
    pub fn new() -> Self {
        Self {
            init: None,
            pre_loop: None,
            post_loop: None,
            tick: None,
            pause_tick: None,
            play_tick: None,
        }
    }

    /// Install the `init` callback
    pub fn on_init(mut self, f: impl FnMut() -> Result<(), E> + Send + 'static) -> Self {
        self.init = Some(Box::new(f));
        self
    }

    /// Install the `pre_loop` callback
    pub fn on_pre_loop(mut self, f: impl FnMut() -> Result<(), E> + Send + 'static) -> Self {
        self.pre_loop = Some(Box::new(f));
        self
    }

    /// Install the `post_loop` callback
    pub fn on_post_loop(mut self, f: impl FnMut() -> Result<(), E> + Send + 'static) -> Self {
        self.post_loop = Some(Box::new(f));
        self
    }

    /// Install the `tick` callback
    pub fn on_tick(mut self, f: impl FnMut() -> Result<(), E> + Send + 'static) -> Self {
        self.tick = Some(Box::new(f));
        self
    }

    /// Install the `pause_tick` callback
    pub fn on_pause_tick(mut self, f: impl FnMut() -> Result<(), E> + Send + 'static) -> Self {
        self.pause_tick = Some(Box::new(f));
        self
    }

    /// Install the `play_tick` callback
    pub fn on_play_tick(mut self, f: impl FnMut() -> Result<(), E> + Send + 'static) -> Self {
        self.play_tick = Some(Box::new(f));
        self
    }

    /// Whether a callback is installed for the given hook
    pub fn is_set(&self, hook: HookKind) -> bool {
        self.slot(hook).is_some()
    }

    fn slot(&self, hook: HookKind) -> &Option<HookFn<E>> {
        match hook {
            HookKind::Init => &self.init,
            HookKind::PreLoop => &self.pre_loop,
            HookKind::PostLoop => &self.post_loop,
            HookKind::Tick => &self.tick,
            HookKind::PauseTick => &self.pause_tick,
            HookKind::PlayTick => &self.play_tick,
        }
    }
}

impl<E> Default for Hooks<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Hooks<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks")
            .field("init", &self.init.is_some())
            .field("pre_loop", &self.pre_loop.is_some())
            .field("post_loop", &self.post_loop.is_some())
            .field("tick", &self.tick.is_some())
            .field("pause_tick", &self.pause_tick.is_some())
            .field("play_tick", &self.play_tick.is_some())
            .finish()
    }
}

fn call<E>(hook: &mut Option<HookFn<E>>) -> Result<(), E> {
    match hook {
        Some(f) => f(),
        None => Ok(()),
    }
}

impl<E> Payload for Hooks<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    type Error = E;

    fn init(&mut self) -> Result<(), E> {
        call(&mut self.init)
    }

    fn pre_loop(&mut self) -> Result<(), E> {
        call(&mut self.pre_loop)
    }

    fn post_loop(&mut self) -> Result<(), E> {
        call(&mut self.post_loop)
    }

    fn tick(&mut self) -> Result<(), E> {
        call(&mut self.tick)
    }

    fn pause_tick(&mut self) -> Result<(), E> {
        call(&mut self.pause_tick)
    }

    fn play_tick(&mut self) -> Result<(), E> {
        call(&mut self.play_tick)
    }
}
