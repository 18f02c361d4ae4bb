//! Scripted demo scenario.
//!
//! Plays the metronome on a worker thread and drives it from the main
//! thread: play, pause at the first quarter, resume at the half, stop at
//! three quarters, then quit.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use colored::*;
use eyre::{Context, Result, eyre};
use log::info;
use mainloop::{Controller, LoopStats};
use serde::Serialize;

use crate::metronome::Metronome;
use crate::settings::Config;

#[derive(Debug, Serialize)]
pub struct DemoReport {
    pub beats: u64,
    pub ticks: u64,
    pub stats: LoopStats,
}

/// Run the scenario and print its report
pub fn run_demo(config: &Config, seconds: Option<u64>, json: bool) -> Result<()> {
    let seconds = seconds.unwrap_or(config.demo.seconds);
    if !json {
        println!("{} {}s scenario", "Demo:".green(), seconds);
    }

    // Beats on stdout would corrupt the JSON report
    let mut demo_config = config.demo.clone();
    demo_config.echo_beats = demo_config.echo_beats && !json;

    let controller = Arc::new(Controller::with_config(
        Metronome::from_config(&demo_config),
        config.controller.clone(),
    ));
    let report = run_scenario(&controller, Duration::from_secs(seconds) / 4)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report).context("Failed to encode report")?);
    } else {
        print_report(&report);
    }
    Ok(())
}

pub fn run_scenario(controller: &Arc<Controller<Metronome>>, quarter: Duration) -> Result<DemoReport> {
    controller.initialize().context("Failed to initialize controller")?;

    let looper = Arc::clone(controller);
    let player = thread::Builder::new()
        .name("mainloop-play".to_string())
        .spawn(move || looper.play())
        .context("Failed to spawn loop thread")?;

    // A stop issued before play() claims its session is not kept
    while !controller.is_playing() && !player.is_finished() {
        thread::sleep(Duration::from_millis(1));
    }

    thread::sleep(quarter);
    info!("Demo: pausing");
    controller.pause();

    thread::sleep(quarter);
    info!("Demo: resuming");
    controller.pause();

    thread::sleep(quarter);
    info!("Demo: stopping");
    controller.stop();

    player
        .join()
        .map_err(|_| eyre!("Loop thread panicked"))?
        .context("Play session failed")?;
    controller.quit();

    let (beats, ticks) = controller.with_payload(|m| (m.beats(), m.ticks()))?;
    Ok(DemoReport {
        beats,
        ticks,
        stats: controller.stats(),
    })
}

fn print_report(report: &DemoReport) {
    println!("{}", "Demo finished".green());
    println!("  beats: {}", report.beats);
    println!("  ticks: {}", report.ticks);
    println!("  iterations: {}", report.stats.iterations);
    println!("  play ticks: {}", report.stats.play_ticks);
    println!("  pause ticks: {}", report.stats.pause_ticks);
    if let Some(duration) = report.stats.last_loop_duration() {
        println!("  loop time: {}ms", duration.num_milliseconds());
    }
}
