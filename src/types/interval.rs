//! Interval identity and catalog entries.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Identifier of a catalog entry.
///
/// Assigned at catalog construction in playlist order and stable for the
/// catalog's lifetime. Two entries with identical names and durations still
/// carry distinct ids, which is what lets collaborators (e.g. the tracking
/// bridge) recognise the final interval of a workout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct IntervalId(pub(crate) u32);

impl fmt::Display for IntervalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One named timed segment of the workout sequence.
///
/// Immutable value data: name and duration are fixed at catalog construction
/// and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntervalSpec {
    pub(crate) id: IntervalId,
    pub(crate) name: String,
    pub(crate) duration_secs: u64,
}

impl IntervalSpec {
    /// Stable identifier within the owning catalog.
    pub fn id(&self) -> IntervalId {
        self.id
    }

    /// Display label.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Full countdown duration in whole seconds. Always positive.
    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Full countdown duration as a [`Duration`].
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

impl fmt::Display for IntervalSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}s)", self.name, self.duration_secs)
    }
}
