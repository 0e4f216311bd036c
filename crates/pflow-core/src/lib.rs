//! # pflow-core
//!
//! Core types and the per-event collection store for particle-flow
//! reconstruction.
//!
//! This crate provides the foundational building blocks used by the
//! reconstruction algorithms in `pflow-recon`, including:
//!
//! - **Detector inputs**: [`TrackHit`] and [`CaloCluster`], the read-only
//!   records produced by upstream simulation and clustering steps.
//!
//! - **Reconstruction output**: [`PfCandidate`], the per-event candidate
//!   entity combining at most one track and one cluster per calorimeter.
//!
//! - **Event store**: [`Event`] and [`Collection`], a typed, write-once,
//!   name-keyed store scoped to a single event.
//!
//! - **Errors**: [`EventError`] for checked collection access via the
//!   [`error`] module.
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialization/deserialization via serde
//!
//! ## Example
//!
//! ```rust
//! use pflow_core::{Collection, Event, PdgId, TrackHit, TrackId, Vec3};
//!
//! let hit = TrackHit::new(
//!     Vec3::new(0.0, 0.0, 4.0),
//!     Vec3::new(0.0, 0.0, 240.0),
//!     PdgId::ELECTRON,
//!     TrackId::new(1),
//! );
//!
//! let mut event = Event::new(1);
//! event
//!     .put("EcalScoringPlaneHits", Collection::TrackHits(vec![hit]))
//!     .unwrap();
//!
//! assert_eq!(event.track_hits("EcalScoringPlaneHits").unwrap().len(), 1);
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod event;
pub mod types;

// Re-export commonly used types at the crate root
pub use error::{EventError, EventResult};
pub use event::{Collection, Event};
pub use types::{CaloCluster, CandidateKind, PdgId, PfCandidate, TrackHit, TrackId, Vec3};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Number of reference surfaces the track selection reads (near and far)
pub const NUM_REFERENCE_SURFACES: usize = 2;

/// Prelude module for convenient imports.
///
/// ```rust
/// use pflow_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::{EventError, EventResult};
    pub use crate::event::{Collection, Event};
    pub use crate::types::{
        CaloCluster, CandidateKind, PdgId, PfCandidate, TrackHit, TrackId, Vec3,
    };
}
