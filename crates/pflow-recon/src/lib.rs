//! # pflow-recon
//!
//! Particle-flow reconstruction: seed-track selection and track-cluster
//! matching over `pflow-core` events.
//!
//! Two cooperating passes make up the algorithm:
//!
//! - The **track selector** reduces the scoring-plane hit lists of the
//!   two reference surfaces to at most one seed track per surface,
//!   ordered by descending momentum magnitude.
//!
//! - The **particle-flow builder** matches seed tracks to EM and hadronic
//!   calorimeter clusters under the configured distance and energy-ratio
//!   criteria, corrects cluster energies through injected calibration
//!   curves, and emits one candidate per matched or unmatched object.
//!
//! [`ReconPipeline`] wires both passes to the event store: the selector
//! runs first and publishes an ordered seed-track list; the builder
//! consumes it together with the cluster collections. There is no
//! feedback loop between the two. A missing required input collection
//! aborts only the current event; missing calibration or invalid
//! configuration aborts the run at start-up.
//!
//! ## Example
//!
//! ```rust
//! use pflow_core::{CaloCluster, Collection, Event, PdgId, TrackHit, TrackId, Vec3};
//! use pflow_recon::{EnergyCalibration, ReconConfig, ReconPipeline};
//!
//! let config = ReconConfig::default();
//! let mut pipeline = ReconPipeline::new(config, EnergyCalibration::identity()).unwrap();
//!
//! let mut event = Event::new(1);
//! event
//!     .put(
//!         "EcalScoringPlaneHits",
//!         Collection::TrackHits(vec![TrackHit::new(
//!             Vec3::new(0.0, 0.0, 4.0),
//!             Vec3::new(0.0, 0.0, 240.0),
//!             PdgId::ELECTRON,
//!             TrackId::new(1),
//!         )]),
//!     )
//!     .unwrap();
//! event
//!     .put(
//!         "PFEcalClusters",
//!         Collection::CaloClusters(vec![CaloCluster::new(
//!             4.2,
//!             Vec3::new(0.0, 0.0, 250.0),
//!             6,
//!         )]),
//!     )
//!     .unwrap();
//! event
//!     .put("PFHcalClusters", Collection::CaloClusters(vec![]))
//!     .unwrap();
//!
//! pipeline.process_event(&mut event).unwrap();
//!
//! let candidates = event.candidates("PFCandidates").unwrap();
//! assert_eq!(candidates.len(), 1);
//! assert!(candidates[0].em_cluster().is_some());
//! ```

#![forbid(unsafe_code)]

pub mod builder;
pub mod calibration;
pub mod error;
pub mod pipeline;
pub mod track_selector;

// Re-export commonly used types at the crate root
pub use builder::{PfBuilder, PfBuilderConfig};
pub use calibration::{CalibrationError, CorrectionCurve, EnergyCalibration};
pub use error::{ReconError, ReconResult};
pub use pipeline::{CollectionNames, ReconConfig, ReconPipeline, RunSummary};
pub use track_selector::{TrackSelector, TrackSelectorConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
///
/// ```rust
/// use pflow_recon::prelude::*;
/// ```
pub mod prelude {
    pub use crate::builder::{PfBuilder, PfBuilderConfig};
    pub use crate::calibration::{CalibrationError, CorrectionCurve, EnergyCalibration};
    pub use crate::error::{ReconError, ReconResult};
    pub use crate::pipeline::{CollectionNames, ReconConfig, ReconPipeline, RunSummary};
    pub use crate::track_selector::{TrackSelector, TrackSelectorConfig};
}
