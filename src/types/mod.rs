//! Core value types for the workout sequence.
//!
//! This module provides the immutable data the state machine operates on:
//! - [`IntervalSpec`] is one named timed segment of the sequence
//! - [`IntervalId`] identifies an entry within its catalog
//! - [`Catalog`] is the fixed ordered playlist, validated at construction
//!
//! All of it is value data with no independent lifecycle: a catalog is built
//! once per session and never mutated afterwards.

mod catalog;
mod interval;

pub use catalog::Catalog;
pub use interval::{IntervalId, IntervalSpec};
