//! Ordered interval catalog.

use crate::error::{Result, SequenceError};
use crate::types::interval::{IntervalId, IntervalSpec};

/// The fixed ordered list of intervals for one session.
///
/// Built once from `(name, seconds)` pairs and read-only afterwards. Order is
/// semantically meaningful: it defines playback sequence, including the
/// forward wraparound from the last entry back to the first.
///
/// An empty catalog is permitted; every timer control degrades to a no-op
/// against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<IntervalSpec>,
}

impl Catalog {
    /// Build a catalog from ordered `(name, duration_secs)` pairs.
    ///
    /// Ids are assigned here, in order. Entries with a zero duration or an
    /// empty name are rejected.
    pub fn new<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        let mut specs = Vec::new();
        for (position, (name, duration_secs)) in entries.into_iter().enumerate() {
            let name = name.into();
            if name.trim().is_empty() {
                return Err(SequenceError::empty_name(position));
            }
            if duration_secs == 0 {
                return Err(SequenceError::zero_duration(name));
            }
            specs.push(IntervalSpec { id: IntervalId(position as u32), name, duration_secs });
        }
        Ok(Self { entries: specs })
    }

    /// The reference plank workout: four fixed intervals.
    pub fn plank_workout() -> Self {
        Self::new([("Basic", 65), ("Left", 45), ("Right", 45), ("Wall Sit", 65)])
            .expect("reference workout entries are valid")
    }

    /// Number of intervals in the sequence.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the catalog holds no intervals.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, if in range.
    pub fn get(&self, index: usize) -> Option<&IntervalSpec> {
        self.entries.get(index)
    }

    /// The final entry of the sequence, if any.
    pub fn last(&self) -> Option<&IntervalSpec> {
        self.entries.last()
    }

    /// Iterate the catalog in playback order.
    pub fn iter(&self) -> impl Iterator<Item = &IntervalSpec> {
        self.entries.iter()
    }

    /// Index following `index` in playback order, wrapping past the end
    /// back to 0.
    pub(crate) fn next_index(&self, index: usize) -> usize {
        debug_assert!(!self.is_empty());
        (index + 1) % self.entries.len()
    }

    /// Index preceding `index`, clamped at 0. Backward navigation does not
    /// wrap; the asymmetry with [`Catalog::next_index`] is deliberate.
    pub(crate) fn previous_index(&self, index: usize) -> usize {
        index.saturating_sub(1)
    }
}
