//! Metronome - demo payload that emits beats at a fixed interval.
//!
//! Time spent paused does not count toward the next beat: pausing halfway
//! through an interval and resuming later leaves half an interval to go.

use std::convert::Infallible;
use std::time::{Duration, Instant};

use colored::*;
use log::{debug, info};
use mainloop::Payload;

use crate::settings::DemoConfig;

pub struct Metronome {
    interval: Duration,
    echo: bool,
    beats: u64,
    ticks: u64,
    /// Time accumulated toward the next beat
    elapsed: Duration,
    last_tick: Option<Instant>,
}

impl Metronome {
    pub fn new(interval: Duration, echo: bool) -> Self {
        Self {
            interval,
            echo,
            beats: 0,
            ticks: 0,
            elapsed: Duration::ZERO,
            last_tick: None,
        }
    }

    pub fn from_config(config: &DemoConfig) -> Self {
        Self::new(Duration::from_millis(config.beat_interval_ms), config.echo_beats)
    }

    pub fn beats(&self) -> u64 {
        self.beats
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Advance by `delta` of unpaused time, returning how many beats fell due
    fn advance(&mut self, delta: Duration) -> u64 {
        if self.interval.is_zero() {
            return 1;
        }
        self.elapsed += delta;
        let mut due = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            due += 1;
        }
        due
    }
}

impl Payload for Metronome {
    type Error = Infallible;

    fn init(&mut self) -> Result<(), Infallible> {
        self.beats = 0;
        self.ticks = 0;
        self.elapsed = Duration::ZERO;
        info!("Metronome ready, beat every {:?}", self.interval);
        Ok(())
    }

    fn pre_loop(&mut self) -> Result<(), Infallible> {
        self.last_tick = Some(Instant::now());
        debug!("Metronome started at beat {}", self.beats);
        Ok(())
    }

    fn post_loop(&mut self) -> Result<(), Infallible> {
        self.last_tick = None;
        info!("Metronome stopped after {} beats", self.beats);
        Ok(())
    }

    fn tick(&mut self) -> Result<(), Infallible> {
        self.ticks += 1;
        Ok(())
    }

    fn pause_tick(&mut self) -> Result<(), Infallible> {
        // Drop the paused time so it doesn't count toward the next beat
        self.last_tick = Some(Instant::now());
        Ok(())
    }

    fn play_tick(&mut self) -> Result<(), Infallible> {
        let now = Instant::now();
        let delta = self.last_tick.map_or(Duration::ZERO, |last| now - last);
        self.last_tick = Some(now);

        for _ in 0..self.advance(delta) {
            self.beats += 1;
            if self.echo {
                println!("{} {}", "beat".cyan(), self.beats);
            }
        }
        Ok(())
    }
}
