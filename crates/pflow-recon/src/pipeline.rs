//! Per-event reconstruction pipeline.
//!
//! Wires the track selector and the candidate builder to the event
//! store: resolve the configured collection names once at construction,
//! then run both stages for each event a driver hands in. Processing is
//! synchronous and strictly per-event; the only state carried across
//! events is the read-only calibration and the run counters reported by
//! [`ReconPipeline::summary`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use pflow_core::{Collection, Event, EventError};

use crate::builder::{PfBuilder, PfBuilderConfig};
use crate::calibration::EnergyCalibration;
use crate::error::{ReconError, ReconResult};
use crate::track_selector::{TrackSelector, TrackSelectorConfig};

/// Names of the event collections the pipeline reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectionNames {
    /// Input: scoring-plane hits at the near reference surface (required)
    pub near_surface_hits: String,
    /// Input: scoring-plane hits at the far reference surface (absent
    /// means empty)
    pub far_surface_hits: String,
    /// Output: selected seed tracks
    pub seed_tracks: String,
    /// Input: EM calorimeter clusters (required)
    pub em_clusters: String,
    /// Input: hadronic calorimeter clusters (required)
    pub had_clusters: String,
    /// Output: particle-flow candidates
    pub candidates: String,
}

impl Default for CollectionNames {
    fn default() -> Self {
        Self {
            near_surface_hits: "EcalScoringPlaneHits".to_string(),
            far_surface_hits: "HcalScoringPlaneHits".to_string(),
            seed_tracks: "PFTracks".to_string(),
            em_clusters: "PFEcalClusters".to_string(),
            had_clusters: "PFHcalClusters".to_string(),
            candidates: "PFCandidates".to_string(),
        }
    }
}

impl CollectionNames {
    /// Checks that every name is non-blank and unique.
    ///
    /// # Errors
    ///
    /// Returns a configuration error (run-fatal) otherwise.
    pub fn validate(&self) -> ReconResult<()> {
        let names = [
            &self.near_surface_hits,
            &self.far_surface_hits,
            &self.seed_tracks,
            &self.em_clusters,
            &self.had_clusters,
            &self.candidates,
        ];
        for name in names {
            if name.trim().is_empty() {
                return Err(ReconError::configuration(
                    "collection names must not be blank",
                ));
            }
        }
        for i in 0..names.len() {
            for j in (i + 1)..names.len() {
                if names[i] == names[j] {
                    return Err(ReconError::configuration(format!(
                        "collection name '{}' used twice",
                        names[i]
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconConfig {
    /// Collection name bindings
    pub collections: CollectionNames,
    /// Track selector settings
    pub selector: TrackSelectorConfig,
    /// Candidate builder settings
    pub builder: PfBuilderConfig,
}

impl ReconConfig {
    /// Validates all sub-configurations.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error found (run-fatal).
    pub fn validate(&self) -> ReconResult<()> {
        self.collections.validate()?;
        self.selector.validate()?;
        self.builder.validate()
    }
}

/// End-of-run bookkeeping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Events fully reconstructed
    pub events_processed: u64,
    /// Events aborted on a per-event error
    pub events_skipped: u64,
    /// Total candidates published
    pub candidates_emitted: u64,
    /// When the pipeline was constructed
    pub started_at: DateTime<Utc>,
    /// When the summary was taken
    pub finished_at: DateTime<Utc>,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let elapsed = self.finished_at - self.started_at;
        write!(
            f,
            "processed {} events ({} skipped), emitted {} candidates in {}ms",
            self.events_processed,
            self.events_skipped,
            self.candidates_emitted,
            elapsed.num_milliseconds()
        )
    }
}

/// The two-stage particle-flow reconstruction pipeline.
///
/// Stage 1 selects seed tracks from the scoring-plane collections and
/// publishes them; stage 2 matches them to calorimeter clusters and
/// publishes the candidate list. A missing required input aborts only the
/// current event; constructing the pipeline with bad configuration or
/// calibration fails up front.
#[derive(Debug)]
pub struct ReconPipeline {
    names: CollectionNames,
    selector: TrackSelector,
    builder: PfBuilder,
    events_processed: u64,
    events_skipped: u64,
    candidates_emitted: u64,
    started_at: DateTime<Utc>,
}

impl ReconPipeline {
    /// Creates a pipeline from a validated configuration and the
    /// calibration loaded at start-up.
    ///
    /// # Errors
    ///
    /// Any configuration error; all are run-fatal.
    pub fn new(config: ReconConfig, calibration: EnergyCalibration) -> ReconResult<Self> {
        config.collections.validate()?;
        let selector = TrackSelector::new(config.selector)?;
        let builder = PfBuilder::new(config.builder, calibration)?;

        info!(version = crate::VERSION, "reconstruction pipeline ready");
        Ok(Self {
            names: config.collections,
            selector,
            builder,
            events_processed: 0,
            events_skipped: 0,
            candidates_emitted: 0,
            started_at: Utc::now(),
        })
    }

    /// Returns the configured collection name bindings.
    #[must_use]
    pub fn collection_names(&self) -> &CollectionNames {
        &self.names
    }

    /// Runs both reconstruction stages on one event.
    ///
    /// On success the event gains the seed-track and candidate
    /// collections. On error the event is counted as skipped and left as
    /// far along as it got; no partial candidate list is ever published.
    ///
    /// # Errors
    ///
    /// [`ReconError::Event`] when a required input collection is missing
    /// or mistyped, or an output name is already taken.
    pub fn process_event(&mut self, event: &mut Event) -> ReconResult<()> {
        match self.try_process(event) {
            Ok(emitted) => {
                self.events_processed += 1;
                self.candidates_emitted += emitted as u64;
                Ok(())
            }
            Err(err) => {
                self.events_skipped += 1;
                error!(event = event.number(), %err, "event skipped");
                Err(err)
            }
        }
    }

    fn try_process(&self, event: &mut Event) -> ReconResult<usize> {
        // Stage 1: seed-track selection.
        let near = event.track_hits(&self.names.near_surface_hits)?;
        let far = match event.track_hits(&self.names.far_surface_hits) {
            Ok(hits) => hits,
            Err(EventError::MissingCollection { .. }) => {
                warn!(
                    event = event.number(),
                    collection = %self.names.far_surface_hits,
                    "far-surface hits absent, selecting from the near surface only"
                );
                &[]
            }
            Err(err) => return Err(err.into()),
        };
        let seeds = self.selector.select(near, far);
        event.put(
            &self.names.seed_tracks,
            Collection::TrackHits(seeds.clone()),
        )?;

        // Stage 2: candidate building.
        let em = event.calo_clusters(&self.names.em_clusters)?;
        let had = event.calo_clusters(&self.names.had_clusters)?;
        let candidates = self.builder.build(&seeds, em, had);
        let emitted = candidates.len();
        event.put(&self.names.candidates, Collection::Candidates(candidates))?;

        debug!(
            event = event.number(),
            seeds = seeds.len(),
            candidates = emitted,
            "event reconstructed"
        );
        Ok(emitted)
    }

    /// Takes the end-of-run summary.
    #[must_use]
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            events_processed: self.events_processed,
            events_skipped: self.events_skipped,
            candidates_emitted: self.candidates_emitted,
            started_at: self.started_at,
            finished_at: Utc::now(),
        }
    }
}
