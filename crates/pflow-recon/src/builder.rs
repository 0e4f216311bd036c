//! Track-cluster matching and candidate building.
//!
//! The builder consumes the ordered seed-track list plus the EM and
//! hadronic cluster collections and emits one [`PfCandidate`] per matched
//! or unmatched object. Matching is greedy over tracks in their given
//! (momentum-descending) order: each track claims its nearest compatible
//! cluster per calorimeter, and every object feeds at most one candidate.
//! The hadronic side additionally requires the cluster-energy to
//! track-momentum ratio to sit inside a configured band, which rejects
//! accidental geometric overlap with an unrelated energy deposit.

use serde::{Deserialize, Serialize};
use tracing::debug;

use pflow_core::{CaloCluster, PfCandidate, TrackHit};

use crate::calibration::EnergyCalibration;
use crate::error::{ReconError, ReconResult};

/// Configuration for [`PfBuilder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PfBuilderConfig {
    /// Emit at most one candidate per event (control samples with a
    /// single known particle)
    pub single_particle: bool,
    /// Maximum track-to-cluster distance for an EM match
    pub tk_em_max_dist: f64,
    /// Maximum track-to-cluster distance for a hadronic match
    pub tk_had_max_dist: f64,
    /// Lower bound of the hadronic cluster-energy / track-momentum band
    pub tk_had_min_energy_ratio: f64,
    /// Upper bound of the hadronic cluster-energy / track-momentum band
    pub tk_had_max_energy_ratio: f64,
}

impl Default for PfBuilderConfig {
    fn default() -> Self {
        Self {
            single_particle: false,
            tk_em_max_dist: 100.0,
            tk_had_max_dist: 200.0,
            tk_had_min_energy_ratio: 0.5,
            tk_had_max_energy_ratio: 1.5,
        }
    }
}

impl PfBuilderConfig {
    /// Checks the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns a configuration error (run-fatal) for non-positive or
    /// non-finite distances, or a malformed energy-ratio band.
    pub fn validate(&self) -> ReconResult<()> {
        if !self.tk_em_max_dist.is_finite() || self.tk_em_max_dist <= 0.0 {
            return Err(ReconError::configuration(
                "tk_em_max_dist must be a positive finite number",
            ));
        }
        if !self.tk_had_max_dist.is_finite() || self.tk_had_max_dist <= 0.0 {
            return Err(ReconError::configuration(
                "tk_had_max_dist must be a positive finite number",
            ));
        }
        if !self.tk_had_min_energy_ratio.is_finite() || !self.tk_had_max_energy_ratio.is_finite() {
            return Err(ReconError::configuration(
                "energy ratio bounds must be finite",
            ));
        }
        if self.tk_had_min_energy_ratio < 0.0
            || self.tk_had_min_energy_ratio > self.tk_had_max_energy_ratio
        {
            return Err(ReconError::configuration(
                "energy ratio band must satisfy 0 <= min <= max",
            ));
        }
        Ok(())
    }
}

/// Builds particle-flow candidates from seed tracks and clusters.
///
/// Owns the injected [`EnergyCalibration`]; all per-call state is local,
/// so [`PfBuilder::build`] is a pure function of its inputs and rerunning
/// it on identical inputs yields an identical candidate list.
#[derive(Debug, Clone)]
pub struct PfBuilder {
    config: PfBuilderConfig,
    calibration: EnergyCalibration,
}

impl PfBuilder {
    /// Creates a builder after validating its configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`PfBuilderConfig::validate`] failures.
    pub fn new(config: PfBuilderConfig, calibration: EnergyCalibration) -> ReconResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            calibration,
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &PfBuilderConfig {
        &self.config
    }

    /// Returns the injected calibration.
    #[must_use]
    pub fn calibration(&self) -> &EnergyCalibration {
        &self.calibration
    }

    /// Matches tracks to clusters and emits the candidate list.
    ///
    /// Every input object ends up in exactly one candidate: matched
    /// clusters join their track's candidate, everything left over
    /// becomes a standalone candidate in input order. In single-particle
    /// mode only the best candidate survives (most components, then
    /// highest energy, then earliest construction order).
    #[must_use]
    pub fn build(
        &self,
        tracks: &[TrackHit],
        em_clusters: &[CaloCluster],
        had_clusters: &[CaloCluster],
    ) -> Vec<PfCandidate> {
        let mut em_used = vec![false; em_clusters.len()];
        let mut had_used = vec![false; had_clusters.len()];
        let mut candidates =
            Vec::with_capacity(tracks.len() + em_clusters.len() + had_clusters.len());

        // Step 1: tracks claim their nearest compatible clusters.
        for track in tracks {
            let mut cand = PfCandidate::from_track(*track);

            if let Some(idx) = self.best_em_match(track, em_clusters, &em_used) {
                em_used[idx] = true;
                let cluster = em_clusters[idx];
                cand.attach_em_cluster(cluster, self.calibration.em().evaluate(cluster.energy));
            }
            if let Some(idx) = self.best_had_match(track, had_clusters, &had_used) {
                had_used[idx] = true;
                let cluster = had_clusters[idx];
                cand.attach_had_cluster(cluster, self.calibration.had().evaluate(cluster.energy));
            }

            candidates.push(cand);
        }

        // Step 2: leftover clusters become standalone candidates.
        for (idx, cluster) in em_clusters.iter().enumerate() {
            if !em_used[idx] {
                candidates.push(PfCandidate::from_em_cluster(
                    *cluster,
                    self.calibration.em().evaluate(cluster.energy),
                ));
            }
        }
        for (idx, cluster) in had_clusters.iter().enumerate() {
            if !had_used[idx] {
                candidates.push(PfCandidate::from_had_cluster(
                    *cluster,
                    self.calibration.had().evaluate(cluster.energy),
                ));
            }
        }

        debug!(
            tracks = tracks.len(),
            em = em_clusters.len(),
            had = had_clusters.len(),
            candidates = candidates.len(),
            "built particle-flow candidates"
        );

        // Step 3: single-particle samples keep only the best candidate.
        if self.config.single_particle && candidates.len() > 1 {
            let total = candidates.len();
            let mut best = 0;
            for idx in 1..total {
                if outranks(&candidates[idx], &candidates[best]) {
                    best = idx;
                }
            }
            let winner = candidates.swap_remove(best);
            debug!(kind = %winner.kind(), total, "single-particle mode kept best candidate");
            return vec![winner];
        }

        candidates
    }

    /// Nearest unconsumed EM cluster within the match distance.
    fn best_em_match(
        &self,
        track: &TrackHit,
        clusters: &[CaloCluster],
        used: &[bool],
    ) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            if used[idx] {
                continue;
            }
            let dist = track_cluster_distance(track, cluster);
            if dist > self.config.tk_em_max_dist {
                continue;
            }
            // strict less keeps the lowest index on exact ties
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((idx, dist));
            }
        }
        best.map(|(idx, _)| idx)
    }

    /// Nearest unconsumed hadronic cluster within the match distance and
    /// the inclusive energy-ratio band.
    fn best_had_match(
        &self,
        track: &TrackHit,
        clusters: &[CaloCluster],
        used: &[bool],
    ) -> Option<usize> {
        let p = track.p();
        let band = self.config.tk_had_min_energy_ratio..=self.config.tk_had_max_energy_ratio;

        let mut best: Option<(usize, f64)> = None;
        for (idx, cluster) in clusters.iter().enumerate() {
            if used[idx] {
                continue;
            }
            if !band.contains(&(cluster.energy / p)) {
                continue;
            }
            let dist = track_cluster_distance(track, cluster);
            if dist > self.config.tk_had_max_dist {
                continue;
            }
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((idx, dist));
            }
        }
        best.map(|(idx, _)| idx)
    }
}

/// Distance of closest approach from the cluster centroid to the forward
/// half-line through the hit position along its momentum. A zero momentum
/// degenerates to the plain point distance.
fn track_cluster_distance(track: &TrackHit, cluster: &CaloCluster) -> f64 {
    match track.momentum.unit() {
        Some(dir) => {
            let offset = cluster.centroid - track.position;
            let along = offset.dot(&dir).max(0.0);
            let closest = track.position + dir * along;
            cluster.centroid.distance_to(&closest)
        }
        None => cluster.centroid.distance_to(&track.position),
    }
}

/// `true` when `a` beats `b` in single-particle ranking.
fn outranks(a: &PfCandidate, b: &PfCandidate) -> bool {
    match a.component_count().cmp(&b.component_count()) {
        std::cmp::Ordering::Greater => true,
        std::cmp::Ordering::Less => false,
        std::cmp::Ordering::Equal => a.energy() > b.energy(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CorrectionCurve;
    use pflow_core::{CandidateKind, PdgId, TrackId, Vec3};

    /// Forward track crossing the near surface with |p| = pz.
    fn track(x: f64, pz: f64) -> TrackHit {
        TrackHit::new(
            Vec3::new(0.0, 0.0, pz),
            Vec3::new(x, 0.0, 240.0),
            PdgId::ELECTRON,
            TrackId::new(1),
        )
    }

    fn cluster(energy: f64, x: f64, z: f64) -> CaloCluster {
        CaloCluster::new(energy, Vec3::new(x, 0.0, z), 3)
    }

    /// EM corrects by x1.2, hadronic by x1.4 over the tested range.
    fn scaled_calibration() -> EnergyCalibration {
        EnergyCalibration::new(
            CorrectionCurve::from_points(vec![(0.0, 0.0), (10.0, 12.0)]).unwrap(),
            CorrectionCurve::from_points(vec![(0.0, 0.0), (10.0, 14.0)]).unwrap(),
        )
    }

    fn builder(config: PfBuilderConfig) -> PfBuilder {
        PfBuilder::new(config, scaled_calibration()).unwrap()
    }

    fn default_builder() -> PfBuilder {
        builder(PfBuilderConfig::default())
    }

    #[test]
    fn test_default_config() {
        let config = PfBuilderConfig::default();
        assert!(!config.single_particle);
        assert!((config.tk_em_max_dist - 100.0).abs() < 1e-12);
        assert!((config.tk_had_max_dist - 200.0).abs() < 1e-12);
        assert!((config.tk_had_min_energy_ratio - 0.5).abs() < 1e-12);
        assert!((config.tk_had_max_energy_ratio - 1.5).abs() < 1e-12);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let bad_dist = PfBuilderConfig {
            tk_em_max_dist: 0.0,
            ..PfBuilderConfig::default()
        };
        assert!(bad_dist.validate().is_err());

        let bad_band = PfBuilderConfig {
            tk_had_min_energy_ratio: 2.0,
            tk_had_max_energy_ratio: 1.0,
            ..PfBuilderConfig::default()
        };
        assert!(bad_band.validate().is_err());

        let negative_min = PfBuilderConfig {
            tk_had_min_energy_ratio: -0.5,
            ..PfBuilderConfig::default()
        };
        assert!(negative_min.validate().is_err());

        let nan_band = PfBuilderConfig {
            tk_had_max_energy_ratio: f64::NAN,
            ..PfBuilderConfig::default()
        };
        assert!(nan_band.validate().is_err());
    }

    #[test]
    fn test_track_cluster_distance_geometry() {
        let tk = track(0.0, 4.0);

        // On the extrapolated line.
        let on_axis = cluster(1.0, 0.0, 300.0);
        assert!(track_cluster_distance(&tk, &on_axis).abs() < 1e-12);

        // Perpendicular offset from the line.
        let offset = cluster(1.0, 30.0, 300.0);
        assert!((track_cluster_distance(&tk, &offset) - 30.0).abs() < 1e-12);

        // Behind the hit: clamped to the point distance.
        let behind = cluster(1.0, 0.0, 200.0);
        assert!((track_cluster_distance(&tk, &behind) - 40.0).abs() < 1e-12);

        // Zero momentum degenerates to the point distance.
        let stopped = TrackHit::new(
            Vec3::zero(),
            Vec3::new(0.0, 0.0, 240.0),
            PdgId::ELECTRON,
            TrackId::new(1),
        );
        assert!((track_cluster_distance(&stopped, &on_axis) - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_em_cluster_at_zero_distance_merges() {
        // Ratio 1.0 against the default [0.5, 1.5] band; distance 0.
        let tk = track(0.0, 5.0);
        let em = cluster(5.0, 0.0, 240.0);

        let cands = default_builder().build(&[tk], &[em], &[]);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind(), CandidateKind::TrackEm);
        // Energy is the EM-corrected cluster energy, 5.0 * 1.2.
        assert!((cands[0].energy() - 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_far_had_cluster_stays_standalone() {
        let tk = track(0.0, 5.0);
        // Ratio is fine; distance (500) exceeds tk_had_max_dist.
        let had = cluster(5.0, 500.0, 400.0);

        let cands = default_builder().build(&[tk], &[], &[had]);
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].kind(), CandidateKind::TrackOnly);
        assert_eq!(cands[1].kind(), CandidateKind::HadOnly);
        // Energy is the hadronic-corrected cluster energy, 5.0 * 1.4.
        assert!((cands[1].energy() - 7.0).abs() < 1e-12);
    }

    #[test]
    fn test_ratio_out_of_band_blocks_had_match() {
        let tk = track(0.0, 5.0);
        // Distance 0, but E/p = 4.0 lies outside [0.5, 1.5].
        let had = cluster(20.0, 0.0, 240.0);

        let cands = default_builder().build(&[tk], &[], &[had]);
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].kind(), CandidateKind::TrackOnly);
        assert_eq!(cands[1].kind(), CandidateKind::HadOnly);
    }

    #[test]
    fn test_ratio_band_is_inclusive() {
        let tk = track(0.0, 4.0);
        // E/p exactly at the lower bound.
        let at_min = cluster(2.0, 0.0, 260.0);
        let cands = default_builder().build(&[tk], &[], &[at_min]);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind(), CandidateKind::TrackHad);

        // E/p exactly at the upper bound.
        let at_max = cluster(6.0, 0.0, 260.0);
        let cands = default_builder().build(&[tk], &[], &[at_max]);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind(), CandidateKind::TrackHad);
    }

    #[test]
    fn test_track_only_energy_is_momentum() {
        let tk = track(0.0, 3.0);
        let cands = default_builder().build(&[tk], &[], &[]);
        assert_eq!(cands.len(), 1);
        assert!((cands[0].energy() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_both_calorimeters_sum_corrected_energies() {
        let tk = track(0.0, 4.0);
        let em = cluster(4.0, 0.0, 250.0);
        let had = cluster(4.0, 0.0, 300.0);

        let cands = default_builder().build(&[tk], &[em], &[had]);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind(), CandidateKind::TrackEmHad);
        // 4.0 * 1.2 + 4.0 * 1.4
        assert!((cands[0].energy() - 10.4).abs() < 1e-12);
    }

    #[test]
    fn test_nearest_cluster_wins() {
        let tk = track(0.0, 5.0);
        let far = cluster(5.0, 40.0, 300.0);
        let near = cluster(5.0, 10.0, 300.0);

        let cands = default_builder().build(&[tk], &[far, near], &[]);
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].em_cluster(), Some(&near));
        assert_eq!(cands[1].em_cluster(), Some(&far));
    }

    #[test]
    fn test_equal_distance_ties_resolve_to_first_cluster() {
        let tk = track(0.0, 5.0);
        let left = cluster(5.0, -20.0, 300.0);
        let right = cluster(5.0, 20.0, 300.0);

        let cands = default_builder().build(&[tk], &[left, right], &[]);
        assert_eq!(cands[0].em_cluster(), Some(&left));
    }

    #[test]
    fn test_each_cluster_consumed_at_most_once() {
        // Two tracks close to the same single cluster; the first track
        // (higher momentum, as the selector orders them) claims it.
        let first = track(0.0, 5.0);
        let second = track(1.0, 4.0);
        let em = cluster(5.0, 0.0, 300.0);

        let cands = default_builder().build(&[first, second], &[em], &[]);
        assert_eq!(cands.len(), 2);
        assert_eq!(cands[0].kind(), CandidateKind::TrackEm);
        assert_eq!(cands[1].kind(), CandidateKind::TrackOnly);

        let attached = cands.iter().filter(|c| c.em_cluster().is_some()).count();
        assert_eq!(attached, 1);
    }

    #[test]
    fn test_every_candidate_valid_over_mixed_event() {
        let tracks = vec![track(0.0, 5.0), track(50.0, 2.0)];
        let em = vec![cluster(5.0, 0.0, 250.0), cluster(3.0, 400.0, 250.0)];
        let had = vec![cluster(2.0, 50.0, 320.0), cluster(9.0, -300.0, 320.0)];

        let cands = default_builder().build(&tracks, &em, &had);

        // Partition: every input object appears exactly once.
        let n_tracks = cands.iter().filter(|c| c.track().is_some()).count();
        let n_em = cands.iter().filter(|c| c.em_cluster().is_some()).count();
        let n_had = cands.iter().filter(|c| c.had_cluster().is_some()).count();
        assert_eq!(n_tracks, 2);
        assert_eq!(n_em, 2);
        assert_eq!(n_had, 2);

        for cand in &cands {
            assert!(cand.component_count() >= 1);
            assert!(cand.energy() >= 0.0);
        }
    }

    #[test]
    fn test_build_is_idempotent() {
        let tracks = vec![track(0.0, 5.0), track(30.0, 2.0)];
        let em = vec![cluster(5.0, 0.0, 250.0), cluster(1.0, 35.0, 250.0)];
        let had = vec![cluster(4.0, 0.0, 320.0)];

        let b = default_builder();
        let first = b.build(&tracks, &em, &had);
        let second = b.build(&tracks, &em, &had);
        assert_eq!(first, second);
    }

    #[test]
    fn test_single_particle_mode_emits_one_candidate() {
        let config = PfBuilderConfig {
            single_particle: true,
            ..PfBuilderConfig::default()
        };
        let tracks = vec![track(0.0, 5.0), track(200.0, 4.0)];

        let cands = builder(config).build(&tracks, &[], &[]);
        assert_eq!(cands.len(), 1);
        // Equal component counts; the higher-momentum track wins.
        assert!((cands[0].energy() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_particle_prefers_more_components() {
        let config = PfBuilderConfig {
            single_particle: true,
            ..PfBuilderConfig::default()
        };
        // The slow track picks up the cluster; the fast one stays bare.
        let fast = track(0.0, 9.0);
        let slow = track(300.0, 3.0);
        let em = cluster(3.0, 300.0, 250.0);

        let cands = builder(config).build(&[fast, slow], &[em], &[]);
        assert_eq!(cands.len(), 1);
        assert_eq!(cands[0].kind(), CandidateKind::TrackEm);
    }

    #[test]
    fn test_empty_inputs_build_nothing() {
        assert!(default_builder().build(&[], &[], &[]).is_empty());
    }
}
