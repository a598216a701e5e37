//! Error types for sequence construction.
//!
//! The control surface of [`crate::SequenceTimer`] is total: every operation
//! degrades to a no-op when invoked in an inapplicable state, so running the
//! timer never produces errors. The only fallible boundary is building a
//! [`crate::Catalog`], where invalid entries are rejected up front.
//!
//! Activity-tracker failures are a separate concern: they are opaque
//! (`anyhow::Error`), swallowed at the tracking bridge, and never surface
//! here. See [`crate::tracking`].

use thiserror::Error;

/// Result type alias for catalog operations.
pub type Result<T, E = SequenceError> = std::result::Result<T, E>;

/// Errors raised while building an interval catalog.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum SequenceError {
    #[error("interval '{name}' has a zero duration")]
    ZeroDuration { name: String },

    #[error("interval at position {position} has an empty name")]
    EmptyName { position: usize },
}

impl SequenceError {
    /// Helper constructor for zero-duration entries.
    pub fn zero_duration(name: impl Into<String>) -> Self {
        SequenceError::ZeroDuration { name: name.into() }
    }

    /// Helper constructor for unnamed entries.
    pub fn empty_name(position: usize) -> Self {
        SequenceError::EmptyName { position }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_traits_validation() {
        // Compile-time check: SequenceError must be Send + Sync + 'static
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<SequenceError>();

        let error = SequenceError::zero_duration("Wall Sit");
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn error_messages_carry_context() {
        let duration_err = SequenceError::zero_duration("Basic");
        assert!(duration_err.to_string().contains("Basic"));

        let name_err = SequenceError::empty_name(2);
        assert!(name_err.to_string().contains('2'));
    }
}
