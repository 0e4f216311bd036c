//! Error types for the reconstruction crate.
//!
//! # Error Hierarchy
//!
//! - [`ReconError`]: top-level error for pipeline operations
//! - [`EventError`](pflow_core::EventError): collection-store failures
//! - [`CalibrationError`](crate::calibration::CalibrationError): correction
//!   curve loading and validation failures
//!
//! The split that matters operationally is run-fatal versus event-fatal:
//! a missing input collection aborts only the current event, while missing
//! or malformed calibration data (and any configuration error) means the
//! run cannot proceed at all. [`ReconError::is_run_fatal`] encodes that
//! classification for drivers.

use thiserror::Error;

use crate::calibration::CalibrationError;
use pflow_core::EventError;

/// A specialized `Result` type for reconstruction operations.
pub type ReconResult<T> = Result<T, ReconError>;

/// Top-level error type for the reconstruction pipeline.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ReconError {
    /// Event-store failure (missing collection, wrong payload type)
    #[error("event error: {0}")]
    Event(#[from] EventError),

    /// Calibration asset failure at start-up
    #[error("calibration error: {0}")]
    Calibration(#[from] CalibrationError),

    /// Invalid configuration
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration error
        message: String,
    },
}

impl ReconError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Returns `true` if this error invalidates the whole run.
    ///
    /// Event errors abort only the current event; calibration and
    /// configuration errors surface at start-up and abort the run.
    #[must_use]
    pub fn is_run_fatal(&self) -> bool {
        match self {
            Self::Event(_) => false,
            Self::Calibration(_) | Self::Configuration { .. } => true,
        }
    }
}
