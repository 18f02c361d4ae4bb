//! Shared probe payload for integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread;
use std::time::{Duration, Instant};

use mainloop::{Controller, ControllerConfig, HookKind, Pacing, Payload};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
#[error("probe failure in {0}")]
pub struct ProbeError(pub HookKind);

/// Counters and knobs shared between a test and its payload
#[derive(Debug, Default)]
pub struct Probe {
    pub inits: AtomicU64,
    pub pre_loops: AtomicU64,
    pub post_loops: AtomicU64,
    pub ticks: AtomicU64,
    pub play_ticks: AtomicU64,
    pub pause_ticks: AtomicU64,
    /// Hooks that saw `in_loop` disagree with where they were called from
    pub in_loop_violations: AtomicU64,
    /// Call stop() from inside the tick hook on this tick number (0 = never)
    pub stop_at_tick: AtomicU64,
    /// Panic inside play_tick
    pub panic_in_play_tick: AtomicBool,
    /// Block in tick until this is cleared
    pub hold_tick: AtomicBool,
    /// Set while tick is blocked on `hold_tick`
    pub holding: AtomicBool,
    pub pre_loop_delay_ms: AtomicU64,
    /// Set once pre_loop has started
    pub entered_pre_loop: AtomicBool,
    pub post_loop_delay_ms: AtomicU64,
    pub record_events: AtomicBool,
    pub fail_on: Mutex<Option<HookKind>>,
    pub events: Mutex<Vec<HookKind>>,
    controller: OnceLock<Weak<Controller<ProbePayload>>>,
}

impl Probe {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn count(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::SeqCst)
    }

    pub fn fail_on(&self, hook: HookKind) {
        *self.fail_on.lock().unwrap() = Some(hook);
    }

    pub fn events(&self) -> Vec<HookKind> {
        self.events.lock().unwrap().clone()
    }

    fn controller(&self) -> Option<Arc<Controller<ProbePayload>>> {
        self.controller.get().and_then(Weak::upgrade)
    }

    fn hit(&self, hook: HookKind, counter: &AtomicU64) -> u64 {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        if self.record_events.load(Ordering::SeqCst) {
            self.events.lock().unwrap().push(hook);
        }
        if let Some(controller) = self.controller() {
            let expected = matches!(hook, HookKind::Tick | HookKind::PlayTick | HookKind::PauseTick);
            if controller.in_loop() != expected {
                self.in_loop_violations.fetch_add(1, Ordering::SeqCst);
            }
        }
        n
    }

    fn check_failure(&self, hook: HookKind) -> Result<(), ProbeError> {
        if *self.fail_on.lock().unwrap() == Some(hook) {
            return Err(ProbeError(hook));
        }
        Ok(())
    }
}

pub struct ProbePayload {
    probe: Arc<Probe>,
}

impl Payload for ProbePayload {
    type Error = ProbeError;

    fn init(&mut self) -> Result<(), ProbeError> {
        self.probe.hit(HookKind::Init, &self.probe.inits);
        self.probe.check_failure(HookKind::Init)
    }

    fn pre_loop(&mut self) -> Result<(), ProbeError> {
        self.probe.hit(HookKind::PreLoop, &self.probe.pre_loops);
        self.probe.entered_pre_loop.store(true, Ordering::SeqCst);
        let delay = self.probe.pre_loop_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.probe.check_failure(HookKind::PreLoop)
    }

    fn post_loop(&mut self) -> Result<(), ProbeError> {
        let delay = self.probe.post_loop_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            thread::sleep(Duration::from_millis(delay));
        }
        self.probe.hit(HookKind::PostLoop, &self.probe.post_loops);
        self.probe.check_failure(HookKind::PostLoop)
    }

    fn tick(&mut self) -> Result<(), ProbeError> {
        let n = self.probe.hit(HookKind::Tick, &self.probe.ticks);
        if self.probe.stop_at_tick.load(Ordering::SeqCst) == n {
            if let Some(controller) = self.probe.controller() {
                controller.stop();
            }
        }
        if self.probe.hold_tick.load(Ordering::SeqCst) {
            self.probe.holding.store(true, Ordering::SeqCst);
            while self.probe.hold_tick.load(Ordering::SeqCst) {
                thread::sleep(Duration::from_millis(1));
            }
            self.probe.holding.store(false, Ordering::SeqCst);
        }
        self.probe.check_failure(HookKind::Tick)
    }

    fn pause_tick(&mut self) -> Result<(), ProbeError> {
        self.probe.hit(HookKind::PauseTick, &self.probe.pause_ticks);
        self.probe.check_failure(HookKind::PauseTick)
    }

    fn play_tick(&mut self) -> Result<(), ProbeError> {
        self.probe.hit(HookKind::PlayTick, &self.probe.play_ticks);
        if self.probe.panic_in_play_tick.load(Ordering::SeqCst) {
            panic!("probe panic in play_tick");
        }
        self.probe.check_failure(HookKind::PlayTick)
    }
}

/// Controller around a probe, iterating about once per millisecond
pub fn controller(probe: &Arc<Probe>) -> Arc<Controller<ProbePayload>> {
    controller_with(probe, Pacing::sleep(Duration::from_millis(1)))
}

pub fn controller_with(probe: &Arc<Probe>, pacing: Pacing) -> Arc<Controller<ProbePayload>> {
    let controller = Arc::new(Controller::with_config(
        ProbePayload {
            probe: Arc::clone(probe),
        },
        ControllerConfig::default().with_pacing(pacing),
    ));
    probe
        .controller
        .set(Arc::downgrade(&controller))
        .expect("probe already bound to a controller");
    controller
}

pub fn wait_until(timeout: Duration, cond: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if cond() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    cond()
}

pub const WAIT: Duration = Duration::from_secs(5);
