//! Error types for the event store.
//!
//! Collection-level failures use [`thiserror`] for automatic `Display` and
//! `Error` implementations. Every variant names the collection involved so
//! an event-processing driver can report which input was at fault.
//!
//! # Example
//!
//! ```rust
//! use pflow_core::error::EventError;
//!
//! let err = EventError::missing("EcalScoringPlaneHits");
//! assert!(err.to_string().contains("EcalScoringPlaneHits"));
//! ```

use thiserror::Error;

/// A specialized `Result` type for event-store operations.
pub type EventResult<T> = Result<T, EventError>;

/// Errors raised by the per-event collection store.
///
/// All of these abort processing of the current event only; the
/// surrounding run may continue with the next event.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum EventError {
    /// A required named collection is absent from the event
    #[error("missing input collection '{name}'")]
    MissingCollection {
        /// Name of the absent collection
        name: String,
    },

    /// A collection exists under the requested name but holds a different
    /// payload type
    #[error("collection '{name}' holds {actual}, expected {expected}")]
    TypeMismatch {
        /// Name of the collection
        name: String,
        /// Payload type the caller asked for
        expected: &'static str,
        /// Payload type actually stored
        actual: &'static str,
    },

    /// A collection was written twice under the same name
    #[error("collection '{name}' already present in event")]
    DuplicateCollection {
        /// Name of the collection
        name: String,
    },
}

impl EventError {
    /// Creates a missing-collection error.
    #[must_use]
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingCollection { name: name.into() }
    }

    /// Creates a type-mismatch error.
    #[must_use]
    pub fn type_mismatch(
        name: impl Into<String>,
        expected: &'static str,
        actual: &'static str,
    ) -> Self {
        Self::TypeMismatch {
            name: name.into(),
            expected,
            actual,
        }
    }

    /// Creates a duplicate-collection error.
    #[must_use]
    pub fn duplicate(name: impl Into<String>) -> Self {
        Self::DuplicateCollection { name: name.into() }
    }
}
