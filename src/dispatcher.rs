//! Interactive dispatcher - turns stdin lines into controller commands.
//!
//! `play()` blocks, so it runs on a blocking worker thread while this task
//! keeps reading commands. Ctrl-C and end of input both quit.

use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use colored::*;
use eyre::{Context, Result, eyre};
use log::{debug, info};
use mainloop::Controller;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;

use crate::metronome::Metronome;
use crate::settings::Config;

type PlayHandle = JoinHandle<mainloop::Result<(), Infallible>>;

/// A command typed at the prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Play,
    Pause,
    Stop,
    Quit,
    Status,
    Help,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "play" | "p" => Ok(Command::Play),
            "pause" | "space" => Ok(Command::Pause),
            "stop" | "s" => Ok(Command::Stop),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            "status" | "?" => Ok(Command::Status),
            "help" | "h" => Ok(Command::Help),
            other => Err(format!("unknown command: {}", other)),
        }
    }
}

/// Run the interactive dispatcher until quit, Ctrl-C, or end of input
pub fn run_interactive(config: &Config) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let result = runtime.block_on(dispatch(config));
    // stdin reads park a blocking thread that never returns on its own
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn dispatch(config: &Config) -> Result<()> {
    let controller = Arc::new(Controller::with_config(
        Metronome::from_config(&config.demo),
        config.controller.clone(),
    ));
    controller.initialize().context("Failed to initialize controller")?;
    info!("Dispatcher ready");
    print_help();

    let mut player: Option<PlayHandle> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => {
                println!("{}", "Interrupted".yellow());
                None
            }
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        reap_finished(&mut player).await?;

        match line.parse::<Command>() {
            Ok(Command::Play) => {
                if player.is_some() {
                    println!("{}", "Already playing".yellow());
                } else {
                    let looper = Arc::clone(&controller);
                    let handle = tokio::task::spawn_blocking(move || looper.play());
                    wait_for_session(&controller, &handle).await;
                    player = Some(handle);
                    println!("{}", "Playing".green());
                }
            }
            Ok(Command::Pause) => {
                let paused = controller.pause();
                println!("{}", if paused { "Paused".yellow() } else { "Resumed".green() });
            }
            Ok(Command::Stop) => {
                controller.stop();
                println!("{}", "Stopping".red());
            }
            Ok(Command::Quit) => break,
            Ok(Command::Status) => print_status(&controller),
            Ok(Command::Help) => print_help(),
            Err(e) => println!("{} {}", "Error:".red(), e),
        }
    }

    shutdown(controller, player).await
}

/// Wait until the play task has claimed its session, so a stop typed right
/// after play is kept for it
async fn wait_for_session(controller: &Controller<Metronome>, handle: &PlayHandle) {
    while !controller.is_playing() && !handle.is_finished() {
        tokio::task::yield_now().await;
    }
}

/// Await a play session that has already returned, surfacing its error
async fn reap_finished(player: &mut Option<PlayHandle>) -> Result<()> {
    if player.as_ref().is_some_and(|h| h.is_finished()) {
        if let Some(handle) = player.take() {
            handle.await.map_err(|e| eyre!("Play task failed: {}", e))??;
            debug!("Reaped finished play session");
        }
    }
    Ok(())
}

async fn shutdown(controller: Arc<Controller<Metronome>>, player: Option<PlayHandle>) -> Result<()> {
    println!("{}", "Quitting...".cyan());
    let quitter = Arc::clone(&controller);
    tokio::task::spawn_blocking(move || quitter.quit())
        .await
        .map_err(|e| eyre!("Quit task failed: {}", e))?;

    if let Some(handle) = player {
        handle.await.map_err(|e| eyre!("Play task failed: {}", e))??;
    }

    print_status(&controller);
    Ok(())
}

fn print_status(controller: &Controller<Metronome>) {
    let stats = controller.stats();
    // The payload is locked for the whole play session
    let beats = controller.try_with_payload(|m| m.beats()).ok().flatten();

    println!("{} {}", "State:".green(), controller.state());
    println!("  iterations: {}", stats.iterations);
    println!("  play ticks: {}", stats.play_ticks);
    println!("  pause ticks: {}", stats.pause_ticks);
    if let Some(beats) = beats {
        println!("  beats: {}", beats);
    }
}

fn print_help() {
    println!("{}", "Commands: play, pause, stop, status, quit, help".cyan());
}
