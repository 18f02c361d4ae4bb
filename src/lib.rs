//! Mainloop - lifecycle skeleton for a ticking control loop
//!
//! A [`Controller`] owns the play/pause/stop/quit state machine of a loop
//! whose per-iteration work is supplied by a [`Payload`]. `play()` blocks the
//! calling thread for the whole loop; the other commands are issued from
//! different threads and take effect at the next iteration boundary.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::thread;
//! use std::time::Duration;
//! use mainloop::{Controller, NoopPayload};
//!
//! let controller = Arc::new(Controller::new(NoopPayload));
//! controller.initialize().unwrap();
//!
//! let looper = Arc::clone(&controller);
//! let handle = thread::spawn(move || looper.play());
//!
//! thread::sleep(Duration::from_millis(50));
//! controller.pause();
//! controller.quit();
//! handle.join().unwrap().unwrap();
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod flags;
pub mod payload;
pub mod state;
pub mod stats;

pub use config::{ControllerConfig, Pacing};
pub use controller::Controller;
pub use error::{LifecycleError, Result};
pub use payload::{HookKind, Hooks, NoopPayload, Payload};
pub use state::LifecycleState;
pub use stats::LoopStats;
