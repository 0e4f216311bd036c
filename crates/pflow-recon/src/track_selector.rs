//! Seed-track selection from scoring-plane hits.
//!
//! Upstream simulation records every particle crossing of the two
//! reference surfaces (the EM and hadronic calorimeter faces). Most of
//! those crossings are secondaries, backsplash, or neutrals that the
//! downstream matching must not seed from. The selector reduces each
//! surface's hit list to at most one usable seed track and orders the
//! result by momentum.

use serde::{Deserialize, Serialize};
use tracing::debug;

use pflow_core::{TrackHit, NUM_REFERENCE_SURFACES};

use crate::error::{ReconError, ReconResult};

/// Configuration for [`TrackSelector`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackSelectorConfig {
    /// Select seeds from simulation truth. The only implemented mode;
    /// `validate` rejects `false`.
    pub truth_tracking: bool,
    /// Identifier of the primary simulated particle
    pub primary_track_id: i32,
    /// Nominal beam-axis coordinate of the near reference surface
    pub near_plane_z: f64,
    /// Nominal beam-axis coordinate of the far reference surface
    pub far_plane_z: f64,
    /// Accepted deviation from the nominal surface coordinate
    pub plane_z_tolerance: f64,
}

impl Default for TrackSelectorConfig {
    fn default() -> Self {
        Self {
            truth_tracking: true,
            primary_track_id: 1,
            near_plane_z: 240.0,
            far_plane_z: 240.0,
            plane_z_tolerance: 0.1,
        }
    }
}

impl TrackSelectorConfig {
    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a configuration error (run-fatal) for a disabled truth
    /// mode, non-finite surface coordinates, or a non-positive tolerance.
    pub fn validate(&self) -> ReconResult<()> {
        if !self.truth_tracking {
            return Err(ReconError::configuration(
                "non-truth seed tracking is not implemented; set truth_tracking = true",
            ));
        }
        if !self.near_plane_z.is_finite() || !self.far_plane_z.is_finite() {
            return Err(ReconError::configuration(
                "reference surface coordinates must be finite",
            ));
        }
        if !self.plane_z_tolerance.is_finite() || self.plane_z_tolerance <= 0.0 {
            return Err(ReconError::configuration(
                "plane_z_tolerance must be a positive finite number",
            ));
        }
        Ok(())
    }
}

/// Selects and orders particle-flow seed tracks.
#[derive(Debug, Clone)]
pub struct TrackSelector {
    config: TrackSelectorConfig,
}

impl TrackSelector {
    /// Creates a selector after validating its configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`TrackSelectorConfig::validate`] failures.
    pub fn new(config: TrackSelectorConfig) -> ReconResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &TrackSelectorConfig {
        &self.config
    }

    /// Picks at most one seed track per reference surface, sorted by
    /// descending momentum magnitude.
    ///
    /// Per surface, the first hit in list order that passes all cuts is
    /// taken; a surface with no qualifying hit contributes nothing.
    /// Tracks of equal momentum keep their insertion order (near surface
    /// first).
    #[must_use]
    pub fn select(&self, near_hits: &[TrackHit], far_hits: &[TrackHit]) -> Vec<TrackHit> {
        let mut seeds = Vec::with_capacity(NUM_REFERENCE_SURFACES);
        if let Some(hit) = self.first_qualifying(near_hits, self.config.near_plane_z) {
            seeds.push(hit);
        }
        if let Some(hit) = self.first_qualifying(far_hits, self.config.far_plane_z) {
            seeds.push(hit);
        }
        seeds.sort_by(|a, b| {
            b.p()
                .partial_cmp(&a.p())
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        debug!(
            near = near_hits.len(),
            far = far_hits.len(),
            seeds = seeds.len(),
            "selected seed tracks"
        );
        seeds
    }

    fn first_qualifying(&self, hits: &[TrackHit], plane_z: f64) -> Option<TrackHit> {
        hits.iter()
            .copied()
            .find(|hit| self.qualifies(hit, plane_z))
    }

    /// A hit qualifies when it comes from the primary particle, crosses
    /// the surface at its nominal coordinate, moves forward, and is
    /// neither a photon nor a neutron.
    fn qualifies(&self, hit: &TrackHit, plane_z: f64) -> bool {
        hit.track_id.value() == self.config.primary_track_id
            && (hit.position.z - plane_z).abs() <= self.config.plane_z_tolerance
            && hit.is_forward()
            && !hit.pdg_id.is_photon()
            && !hit.pdg_id.is_neutron()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pflow_core::{PdgId, TrackId, Vec3};

    fn hit(track_id: i32, z: f64, momentum: Vec3, pdg: i32) -> TrackHit {
        TrackHit::new(
            momentum,
            Vec3::new(0.0, 0.0, z),
            PdgId::new(pdg),
            TrackId::new(track_id),
        )
    }

    fn selector() -> TrackSelector {
        TrackSelector::new(TrackSelectorConfig::default()).unwrap()
    }

    #[test]
    fn test_default_config() {
        let config = TrackSelectorConfig::default();
        assert!(config.truth_tracking);
        assert_eq!(config.primary_track_id, 1);
        assert!((config.near_plane_z - 240.0).abs() < 1e-12);
        assert!((config.far_plane_z - 240.0).abs() < 1e-12);
        assert!((config.plane_z_tolerance - 0.1).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_truth_mode_rejected() {
        let config = TrackSelectorConfig {
            truth_tracking: false,
            ..TrackSelectorConfig::default()
        };
        let err = TrackSelector::new(config).unwrap_err();
        assert!(err.is_run_fatal());
    }

    #[test]
    fn test_bad_tolerance_rejected() {
        let config = TrackSelectorConfig {
            plane_z_tolerance: 0.0,
            ..TrackSelectorConfig::default()
        };
        assert!(config.validate().is_err());

        let config = TrackSelectorConfig {
            plane_z_tolerance: f64::NAN,
            ..TrackSelectorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_picks_first_qualifying_hit() {
        let near = vec![
            // secondary
            hit(7, 240.0, Vec3::new(0.0, 0.0, 1.0), 11),
            // off the surface
            hit(1, 238.0, Vec3::new(0.0, 0.0, 1.0), 11),
            // moving backwards
            hit(1, 240.0, Vec3::new(0.0, 0.0, -1.0), 11),
            // photon
            hit(1, 240.0, Vec3::new(0.0, 0.0, 1.0), 22),
            // neutron
            hit(1, 240.0, Vec3::new(0.0, 0.0, 1.0), 2112),
            // first qualifying
            hit(1, 240.05, Vec3::new(0.0, 0.0, 2.0), 11),
            // also qualifying, but later in the list
            hit(1, 240.0, Vec3::new(0.0, 0.0, 9.0), 11),
        ];

        let seeds = selector().select(&near, &[]);
        assert_eq!(seeds.len(), 1);
        assert!((seeds[0].p() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_at_most_one_seed_per_surface() {
        let near = vec![
            hit(1, 240.0, Vec3::new(0.0, 0.0, 1.0), 11),
            hit(1, 240.0, Vec3::new(0.0, 0.0, 2.0), 11),
        ];
        let far = vec![
            hit(1, 240.0, Vec3::new(0.0, 0.0, 3.0), 211),
            hit(1, 240.0, Vec3::new(0.0, 0.0, 4.0), 211),
        ];

        let seeds = selector().select(&near, &far);
        assert!(seeds.len() <= NUM_REFERENCE_SURFACES);
        assert_eq!(seeds.len(), 2);
    }

    #[test]
    fn test_output_sorted_by_descending_momentum() {
        let near = vec![hit(1, 240.0, Vec3::new(0.0, 0.0, 2.0), 11)];
        let far = vec![hit(1, 240.0, Vec3::new(3.0, 0.0, 4.0), 211)];

        let seeds = selector().select(&near, &far);
        assert_eq!(seeds.len(), 2);
        assert!(seeds[0].p() >= seeds[1].p());
        assert!((seeds[0].p() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_equal_momenta_keep_insertion_order() {
        let near = vec![hit(1, 240.0, Vec3::new(0.0, 0.0, 3.0), 11)];
        let far = vec![hit(1, 240.0, Vec3::new(0.0, 0.0, 3.0), 211)];

        let seeds = selector().select(&near, &far);
        assert_eq!(seeds.len(), 2);
        // Stable sort keeps the near-surface seed first on exact ties.
        assert_eq!(seeds[0].pdg_id, PdgId::ELECTRON);
        assert_eq!(seeds[1].pdg_id, PdgId::new(211));
    }

    #[test]
    fn test_empty_surfaces_yield_no_seeds() {
        assert!(selector().select(&[], &[]).is_empty());

        let only_vetoed = vec![hit(1, 240.0, Vec3::new(0.0, 0.0, 1.0), 22)];
        assert!(selector().select(&only_vetoed, &[]).is_empty());
    }

    #[test]
    fn test_tolerance_boundary_inclusive() {
        let on_edge = vec![hit(1, 240.1, Vec3::new(0.0, 0.0, 1.0), 11)];
        assert_eq!(selector().select(&on_edge, &[]).len(), 1);

        let outside = vec![hit(1, 240.11, Vec3::new(0.0, 0.0, 1.0), 11)];
        assert!(selector().select(&outside, &[]).is_empty());
    }

    #[test]
    fn test_custom_primary_id() {
        let config = TrackSelectorConfig {
            primary_track_id: 42,
            ..TrackSelectorConfig::default()
        };
        let selector = TrackSelector::new(config).unwrap();

        let near = vec![
            hit(1, 240.0, Vec3::new(0.0, 0.0, 1.0), 11),
            hit(42, 240.0, Vec3::new(0.0, 0.0, 2.0), 11),
        ];
        let seeds = selector.select(&near, &[]);
        assert_eq!(seeds.len(), 1);
        assert_eq!(seeds[0].track_id, TrackId::new(42));
    }
}
