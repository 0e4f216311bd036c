//! Core data types for particle-flow reconstruction.
//!
//! This module defines the data model shared by the reconstruction
//! algorithms: detector-level inputs produced upstream (track hits and
//! calorimeter clusters) and the candidate entity produced by the
//! particle-flow builder.
//!
//! # Type Categories
//!
//! - **Geometry**: [`Vec3`]
//! - **Identifiers**: [`PdgId`], [`TrackId`]
//! - **Detector inputs**: [`TrackHit`], [`CaloCluster`]
//! - **Reconstruction output**: [`PfCandidate`], [`CandidateKind`]

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// =============================================================================
// Geometry
// =============================================================================

/// A 3-component vector in detector coordinates.
///
/// Used for both positions (length units) and momenta (energy units in the
/// mass-less approximation). The beam axis is `z`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    /// Horizontal transverse component
    pub x: f64,
    /// Vertical transverse component
    pub y: f64,
    /// Longitudinal (beam axis) component
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The zero vector.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Returns the squared Euclidean norm.
    #[must_use]
    pub fn norm_sq(&self) -> f64 {
        self.x * self.x + self.y * self.y + self.z * self.z
    }

    /// Returns the Euclidean norm.
    #[must_use]
    pub fn norm(&self) -> f64 {
        self.norm_sq().sqrt()
    }

    /// Returns the dot product with another vector.
    #[must_use]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Returns the Euclidean distance to another point.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Returns the unit vector in this direction, or `None` for the zero
    /// vector.
    #[must_use]
    pub fn unit(&self) -> Option<Self> {
        let n = self.norm();
        if n == 0.0 {
            return None;
        }
        Some(Self::new(self.x / n, self.y / n, self.z / n))
    }
}

impl std::ops::Add for Vec3 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }
}

impl std::ops::Sub for Vec3 {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }
}

impl std::ops::Mul<f64> for Vec3 {
    type Output = Self;

    fn mul(self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

// =============================================================================
// Identifiers
// =============================================================================

/// PDG Monte Carlo particle code.
///
/// Standard numbering scheme from the Particle Data Group; only the codes
/// the selection logic vetoes or commonly encounters are named here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PdgId(i32);

impl PdgId {
    /// Photon (22).
    pub const PHOTON: Self = Self(22);

    /// Neutron (2112).
    pub const NEUTRON: Self = Self(2112);

    /// Electron (11).
    pub const ELECTRON: Self = Self(11);

    /// Creates a PDG id from its raw code.
    #[must_use]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw PDG code.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }

    /// Returns `true` if this is a photon.
    #[must_use]
    pub const fn is_photon(&self) -> bool {
        self.0 == Self::PHOTON.0
    }

    /// Returns `true` if this is a neutron.
    #[must_use]
    pub const fn is_neutron(&self) -> bool {
        self.0 == Self::NEUTRON.0
    }
}

impl std::fmt::Display for PdgId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Simulation-assigned identifier of the particle that produced a hit.
///
/// The primary beam particle carries id 1; secondaries get higher ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackId(i32);

impl TrackId {
    /// Creates a track id from its raw value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// Detector inputs
// =============================================================================

/// A recorded crossing of a particle through a reference surface.
///
/// Produced by the upstream simulation step at a scoring plane; read-only
/// input to the reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackHit {
    /// Momentum at the crossing
    pub momentum: Vec3,
    /// Position of the crossing
    pub position: Vec3,
    /// Particle type
    pub pdg_id: PdgId,
    /// Originating simulated particle
    pub track_id: TrackId,
}

impl TrackHit {
    /// Creates a new track hit.
    #[must_use]
    pub const fn new(momentum: Vec3, position: Vec3, pdg_id: PdgId, track_id: TrackId) -> Self {
        Self {
            momentum,
            position,
            pdg_id,
            track_id,
        }
    }

    /// Returns the momentum magnitude (Euclidean norm, non-negative).
    #[must_use]
    pub fn p(&self) -> f64 {
        self.momentum.norm()
    }

    /// Returns `true` if the longitudinal momentum component is strictly
    /// positive (the particle moves forward through the surface).
    #[must_use]
    pub fn is_forward(&self) -> bool {
        self.momentum.z > 0.0
    }
}

/// A spatially grouped calorimeter energy deposit.
///
/// The same record represents EM and hadronic clusters; which calorimeter
/// a cluster belongs to is determined by the collection it arrives in.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CaloCluster {
    /// Total raw deposited energy
    pub energy: f64,
    /// Energy-weighted centroid position
    pub centroid: Vec3,
    /// Number of hits grouped into the cluster
    pub n_hits: usize,
}

impl CaloCluster {
    /// Creates a new cluster.
    #[must_use]
    pub const fn new(energy: f64, centroid: Vec3, n_hits: usize) -> Self {
        Self {
            energy,
            centroid,
            n_hits,
        }
    }
}

// =============================================================================
// Reconstruction output
// =============================================================================

/// Component combination held by a [`PfCandidate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CandidateKind {
    /// Track with no calorimeter match
    TrackOnly,
    /// Unmatched EM cluster
    EmOnly,
    /// Unmatched hadronic cluster
    HadOnly,
    /// Track matched to an EM cluster
    TrackEm,
    /// Track matched to a hadronic cluster
    TrackHad,
    /// EM and hadronic clusters without a track
    EmHad,
    /// Track matched in both calorimeters
    TrackEmHad,
}

impl std::fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TrackOnly => "track-only",
            Self::EmOnly => "em-only",
            Self::HadOnly => "had-only",
            Self::TrackEm => "track+em",
            Self::TrackHad => "track+had",
            Self::EmHad => "em+had",
            Self::TrackEmHad => "track+em+had",
        };
        write!(f, "{s}")
    }
}

/// A reconstructed particle candidate.
///
/// Combines at most one seed track and one cluster per calorimeter into a
/// best estimate of a single incident particle. At least one component is
/// always populated; the constructors enforce this. Candidates are created
/// fresh per event and carry no cross-event state.
///
/// # Energy
///
/// - track only: momentum magnitude (mass-less approximation);
/// - one calorimeter attached: that cluster's corrected energy, replacing
///   the track estimate;
/// - both calorimeters attached: sum of the two corrected energies.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PfCandidate {
    track: Option<TrackHit>,
    em_cluster: Option<CaloCluster>,
    had_cluster: Option<CaloCluster>,
    energy: f64,
}

impl PfCandidate {
    /// Creates a track-only candidate with energy equal to the track's
    /// momentum magnitude.
    #[must_use]
    pub fn from_track(track: TrackHit) -> Self {
        let energy = track.p();
        Self {
            track: Some(track),
            em_cluster: None,
            had_cluster: None,
            energy,
        }
    }

    /// Creates a standalone EM-cluster candidate carrying the given
    /// corrected energy.
    #[must_use]
    pub fn from_em_cluster(cluster: CaloCluster, corrected_energy: f64) -> Self {
        Self {
            track: None,
            em_cluster: Some(cluster),
            had_cluster: None,
            energy: corrected_energy,
        }
    }

    /// Creates a standalone hadronic-cluster candidate carrying the given
    /// corrected energy.
    #[must_use]
    pub fn from_had_cluster(cluster: CaloCluster, corrected_energy: f64) -> Self {
        Self {
            track: None,
            em_cluster: None,
            had_cluster: Some(cluster),
            energy: corrected_energy,
        }
    }

    /// Attaches a matched EM cluster.
    ///
    /// The corrected energy replaces a track-based estimate and adds to an
    /// already-attached hadronic contribution.
    pub fn attach_em_cluster(&mut self, cluster: CaloCluster, corrected_energy: f64) {
        self.energy = if self.had_cluster.is_some() {
            self.energy + corrected_energy
        } else {
            corrected_energy
        };
        self.em_cluster = Some(cluster);
    }

    /// Attaches a matched hadronic cluster.
    ///
    /// The corrected energy replaces a track-based estimate and adds to an
    /// already-attached EM contribution.
    pub fn attach_had_cluster(&mut self, cluster: CaloCluster, corrected_energy: f64) {
        self.energy = if self.em_cluster.is_some() {
            self.energy + corrected_energy
        } else {
            corrected_energy
        };
        self.had_cluster = Some(cluster);
    }

    /// Returns the matched track, if any.
    #[must_use]
    pub fn track(&self) -> Option<&TrackHit> {
        self.track.as_ref()
    }

    /// Returns the matched EM cluster, if any.
    #[must_use]
    pub fn em_cluster(&self) -> Option<&CaloCluster> {
        self.em_cluster.as_ref()
    }

    /// Returns the matched hadronic cluster, if any.
    #[must_use]
    pub fn had_cluster(&self) -> Option<&CaloCluster> {
        self.had_cluster.as_ref()
    }

    /// Returns the derived total energy.
    #[must_use]
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Returns the number of populated components (1 to 3).
    #[must_use]
    pub fn component_count(&self) -> usize {
        usize::from(self.track.is_some())
            + usize::from(self.em_cluster.is_some())
            + usize::from(self.had_cluster.is_some())
    }

    /// Returns which component combination this candidate holds.
    #[must_use]
    pub fn kind(&self) -> CandidateKind {
        if self.track.is_some() {
            match (self.em_cluster.is_some(), self.had_cluster.is_some()) {
                (false, false) => CandidateKind::TrackOnly,
                (true, false) => CandidateKind::TrackEm,
                (false, true) => CandidateKind::TrackHad,
                (true, true) => CandidateKind::TrackEmHad,
            }
        } else if self.em_cluster.is_some() {
            if self.had_cluster.is_some() {
                CandidateKind::EmHad
            } else {
                CandidateKind::EmOnly
            }
        } else {
            CandidateKind::HadOnly
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_norm() {
        let v = Vec3::new(3.0, 4.0, 0.0);
        assert!((v.norm() - 5.0).abs() < 1e-12);
        assert!((v.norm_sq() - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_vec3_distance() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 4.0, 0.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_vec3_unit() {
        let v = Vec3::new(0.0, 0.0, 4.0);
        let u = v.unit().unwrap();
        assert!((u.z - 1.0).abs() < 1e-12);
        assert!(Vec3::zero().unit().is_none());
    }

    #[test]
    fn test_vec3_ops() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);
        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert!((a.dot(&b) - 32.0).abs() < 1e-12);
    }

    #[test]
    fn test_pdg_predicates() {
        assert!(PdgId::PHOTON.is_photon());
        assert!(PdgId::NEUTRON.is_neutron());
        assert!(!PdgId::ELECTRON.is_photon());
        assert!(!PdgId::ELECTRON.is_neutron());
        assert_eq!(PdgId::new(22), PdgId::PHOTON);
        assert_eq!(PdgId::NEUTRON.value(), 2112);
    }

    #[test]
    fn test_track_hit_momentum() {
        let hit = TrackHit::new(
            Vec3::new(0.0, 3.0, 4.0),
            Vec3::new(0.0, 0.0, 240.0),
            PdgId::ELECTRON,
            TrackId::new(1),
        );
        assert!((hit.p() - 5.0).abs() < 1e-12);
        assert!(hit.is_forward());

        let backward = TrackHit::new(
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::zero(),
            PdgId::ELECTRON,
            TrackId::new(1),
        );
        assert!(!backward.is_forward());
    }

    #[test]
    fn test_candidate_from_track() {
        let hit = TrackHit::new(
            Vec3::new(0.0, 0.0, 2.5),
            Vec3::zero(),
            PdgId::ELECTRON,
            TrackId::new(1),
        );
        let cand = PfCandidate::from_track(hit);
        assert_eq!(cand.kind(), CandidateKind::TrackOnly);
        assert_eq!(cand.component_count(), 1);
        assert!((cand.energy() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_attach_replaces_track_estimate() {
        let hit = TrackHit::new(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::zero(),
            PdgId::ELECTRON,
            TrackId::new(1),
        );
        let cluster = CaloCluster::new(10.0, Vec3::zero(), 4);

        let mut cand = PfCandidate::from_track(hit);
        cand.attach_em_cluster(cluster, 11.0);
        assert_eq!(cand.kind(), CandidateKind::TrackEm);
        assert!((cand.energy() - 11.0).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_attach_both_sums() {
        let hit = TrackHit::new(
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::zero(),
            PdgId::ELECTRON,
            TrackId::new(1),
        );
        let em = CaloCluster::new(10.0, Vec3::zero(), 4);
        let had = CaloCluster::new(5.0, Vec3::zero(), 2);

        let mut cand = PfCandidate::from_track(hit);
        cand.attach_em_cluster(em, 11.0);
        cand.attach_had_cluster(had, 6.0);
        assert_eq!(cand.kind(), CandidateKind::TrackEmHad);
        assert_eq!(cand.component_count(), 3);
        assert!((cand.energy() - 17.0).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_standalone_clusters() {
        let em = PfCandidate::from_em_cluster(CaloCluster::new(3.0, Vec3::zero(), 1), 3.3);
        assert_eq!(em.kind(), CandidateKind::EmOnly);
        assert!((em.energy() - 3.3).abs() < 1e-12);

        let had = PfCandidate::from_had_cluster(CaloCluster::new(4.0, Vec3::zero(), 1), 4.4);
        assert_eq!(had.kind(), CandidateKind::HadOnly);
        assert!((had.energy() - 4.4).abs() < 1e-12);
    }

    #[test]
    fn test_candidate_kind_display() {
        assert_eq!(CandidateKind::TrackEmHad.to_string(), "track+em+had");
        assert_eq!(CandidateKind::EmOnly.to_string(), "em-only");
    }
}
