//! Loop statistics
//!
//! Counters are bumped by the loop thread and may be read from any thread.
//! A snapshot taken mid-loop can be off by the iteration in flight.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Snapshot of what the controller has done since `initialize()`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopStats {
    /// Loops entered
    pub loops_started: u64,
    /// Loops exited (normally or by hook failure)
    pub loops_finished: u64,
    /// Iterations across all loops
    pub iterations: u64,
    /// Iterations that ran `play_tick`
    pub play_ticks: u64,
    /// Iterations that ran `pause_tick`
    pub pause_ticks: u64,
    /// When the most recent loop was entered
    pub last_started_at: Option<DateTime<Utc>>,
    /// When the most recent loop exited
    pub last_finished_at: Option<DateTime<Utc>>,
}

impl LoopStats {
    /// Wall time of the most recent completed loop
    pub fn last_loop_duration(&self) -> Option<Duration> {
        match (self.last_started_at, self.last_finished_at) {
            (Some(start), Some(end)) if end >= start => Some(end - start),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct Timestamps {
    started: Option<DateTime<Utc>>,
    finished: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub(crate) struct StatsRecorder {
    loops_started: AtomicU64,
    loops_finished: AtomicU64,
    play_ticks: AtomicU64,
    pause_ticks: AtomicU64,
    timestamps: Mutex<Timestamps>,
}

impl StatsRecorder {
    pub(crate) fn reset(&self) {
        self.loops_started.store(0, Ordering::Relaxed);
        self.loops_finished.store(0, Ordering::Relaxed);
        self.play_ticks.store(0, Ordering::Relaxed);
        self.pause_ticks.store(0, Ordering::Relaxed);
        *self.timestamps.lock().unwrap_or_else(PoisonError::into_inner) = Timestamps::default();
    }

    pub(crate) fn loop_started(&self) {
        self.loops_started.fetch_add(1, Ordering::Relaxed);
        let mut ts = self.timestamps.lock().unwrap_or_else(PoisonError::into_inner);
        ts.started = Some(Utc::now());
        ts.finished = None;
    }

    pub(crate) fn loop_finished(&self) {
        self.loops_finished.fetch_add(1, Ordering::Relaxed);
        self.timestamps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .finished = Some(Utc::now());
    }

    pub(crate) fn iteration(&self, paused: bool) {
        if paused {
            self.pause_ticks.fetch_add(1, Ordering::Relaxed);
        } else {
            self.play_ticks.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn snapshot(&self) -> LoopStats {
        let play_ticks = self.play_ticks.load(Ordering::Relaxed);
        let pause_ticks = self.pause_ticks.load(Ordering::Relaxed);
        let ts = self.timestamps.lock().unwrap_or_else(PoisonError::into_inner);
        LoopStats {
            loops_started: self.loops_started.load(Ordering::Relaxed),
            loops_finished: self.loops_finished.load(Ordering::Relaxed),
            iterations: play_ticks + pause_ticks,
            play_ticks,
            pause_ticks,
            last_started_at: ts.started,
            last_finished_at: ts.finished,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_recorder_is_empty() {
        let stats = StatsRecorder::default().snapshot();
        assert_eq!(stats, LoopStats::default());
        assert!(stats.last_loop_duration().is_none());
    }

    #[test]
    fn test_iterations_split_by_variant() {
        let recorder = StatsRecorder::default();
        recorder.loop_started();
        recorder.iteration(false);
        recorder.iteration(false);
        recorder.iteration(true);

        let stats = recorder.snapshot();
        assert_eq!(stats.iterations, 3);
        assert_eq!(stats.play_ticks, 2);
        assert_eq!(stats.pause_ticks, 1);
        assert_eq!(stats.loops_started, 1);
        assert_eq!(stats.loops_finished, 0);
    }

    #[test]
    fn test_loop_timestamps() {
        let recorder = StatsRecorder::default();
        recorder.loop_started();
        let running = recorder.snapshot();
        assert!(running.last_started_at.is_some());
        assert!(running.last_finished_at.is_none());
        assert!(running.last_loop_duration().is_none());

        recorder.loop_finished();
        let done = recorder.snapshot();
        assert_eq!(done.loops_finished, 1);
        assert!(done.last_loop_duration().is_some());
    }

    #[test]
    fn test_restart_clears_finish_time() {
        let recorder = StatsRecorder::default();
        recorder.loop_started();
        recorder.loop_finished();
        recorder.loop_started();
        assert!(recorder.snapshot().last_finished_at.is_none());
    }

    #[test]
    fn test_reset() {
        let recorder = StatsRecorder::default();
        recorder.loop_started();
        recorder.iteration(true);
        recorder.loop_finished();

        recorder.reset();
        assert_eq!(recorder.snapshot(), LoopStats::default());
    }

    #[test]
    fn test_stats_serialize() {
        let stats = LoopStats {
            loops_started: 1,
            iterations: 5,
            play_ticks: 5,
            ..Default::default()
        };
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["iterations"], 5);
        assert_eq!(json["play_ticks"], 5);
        assert!(json["last_started_at"].is_null());
    }
}
