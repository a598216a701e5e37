//! Countdown sequencer for fixed interval workouts.
//!
//! Plankline advances a single active countdown through an ordered catalog of
//! named exercise intervals (the reference deployment is a four-interval
//! plank workout) and reports its lifecycle through a typed five-event
//! progress protocol.
//!
//! # Features
//!
//! - **One state machine**: [`SequenceTimer`] owns all timing and sequencing
//!   logic; display surfaces and haptic devices are thin observers
//! - **Deadline-derived time**: remaining time is recomputed from an absolute
//!   deadline on every tick, so late or missed ticks self-correct
//! - **Pause precision**: stopping saves the exact remainder; resuming loses
//!   no progress
//! - **Best-effort tracking**: an optional bridge maps timer events onto an
//!   external workout-session service without ever blocking the timer
//! - **Virtual-clock testing**: all timing runs on `tokio::time`, so tests
//!   drive it with a paused clock instead of wall-clock delays
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use plankline::{IntervalSpec, ProgressObserver, SequenceTimer};
//! use std::sync::Arc;
//!
//! struct Display;
//!
//! impl ProgressObserver for Display {
//!     fn started(&self, interval: &IntervalSpec) {
//!         println!("go: {interval}");
//!     }
//!     fn stopped(&self, interval: &IntervalSpec) {
//!         println!("paused: {interval}");
//!     }
//!     fn progressed(&self, elapsed_secs: u64, interval: &IntervalSpec) {
//!         println!("{}s left", interval.duration_secs() - elapsed_secs);
//!     }
//!     fn finished(&self, interval: &IntervalSpec) {
//!         println!("done: {interval}");
//!     }
//!     fn moved_to(&self, interval: &IntervalSpec) {
//!         println!("up next: {interval}");
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let timer = SequenceTimer::plank_workout();
//!     let display: Arc<dyn ProgressObserver> = Arc::new(Display);
//!     timer.set_observer(display.clone());
//!
//!     timer.start();
//!     tokio::time::sleep(std::time::Duration::from_secs(70)).await;
//! }
//! ```

// Core types and error handling
mod error;
pub mod types;

// State machine and its tick driver
mod driver;
pub mod observer;
pub mod timer;

// Side integrations
pub mod tracking;

#[cfg(test)]
mod test_utils;

// Core exports
pub use error::{Result, SequenceError};
pub use observer::{ProgressObserver, TimerEvent};
pub use timer::SequenceTimer;
pub use tracking::{ActivityTracker, TrackingBridge};
pub use types::{Catalog, IntervalId, IntervalSpec};
