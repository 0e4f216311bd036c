//! Per-event collection store.
//!
//! Reconstruction steps exchange data through named, typed collections
//! scoped to a single event. Lookups are checked: asking for an absent
//! name or for the wrong payload type yields an [`EventError`] instead of
//! a panic, so a driver can decide per its own policy whether to skip the
//! event or abort the run.
//!
//! Collections are write-once per event; producers publish under a
//! configured name and never overwrite.

use std::collections::HashMap;

use crate::error::{EventError, EventResult};
use crate::types::{CaloCluster, PfCandidate, TrackHit};

/// Payload of a named event collection.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Collection {
    /// Scoring-plane track hits
    TrackHits(Vec<TrackHit>),
    /// Calorimeter clusters (EM or hadronic, by collection name)
    CaloClusters(Vec<CaloCluster>),
    /// Particle-flow candidates
    Candidates(Vec<PfCandidate>),
}

impl Collection {
    /// Returns the number of elements held.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::TrackHits(v) => v.len(),
            Self::CaloClusters(v) => v.len(),
            Self::Candidates(v) => v.len(),
        }
    }

    /// Returns `true` if the collection holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns a short name of the payload type, for error reporting.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::TrackHits(_) => "track hits",
            Self::CaloClusters(_) => "calo clusters",
            Self::Candidates(_) => "candidates",
        }
    }
}

/// A single event's worth of named collections.
///
/// All contained data is local to the event; nothing survives past the
/// driver dropping the event.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    number: u64,
    collections: HashMap<String, Collection>,
}

impl Event {
    /// Creates an empty event with the given sequence number.
    #[must_use]
    pub fn new(number: u64) -> Self {
        Self {
            number,
            collections: HashMap::new(),
        }
    }

    /// Returns the event sequence number.
    #[must_use]
    pub fn number(&self) -> u64 {
        self.number
    }

    /// Publishes a collection under a name.
    ///
    /// # Errors
    ///
    /// Returns [`EventError::DuplicateCollection`] if the name is already
    /// taken; existing collections are never overwritten.
    pub fn put(&mut self, name: impl Into<String>, collection: Collection) -> EventResult<()> {
        let name = name.into();
        if self.collections.contains_key(&name) {
            return Err(EventError::duplicate(name));
        }
        self.collections.insert(name, collection);
        Ok(())
    }

    /// Looks up a track-hit collection by name.
    ///
    /// # Errors
    ///
    /// [`EventError::MissingCollection`] if absent,
    /// [`EventError::TypeMismatch`] if the name holds another payload.
    pub fn track_hits(&self, name: &str) -> EventResult<&[TrackHit]> {
        match self.collections.get(name) {
            Some(Collection::TrackHits(hits)) => Ok(hits),
            Some(other) => Err(EventError::type_mismatch(
                name,
                "track hits",
                other.type_name(),
            )),
            None => Err(EventError::missing(name)),
        }
    }

    /// Looks up a calorimeter-cluster collection by name.
    ///
    /// # Errors
    ///
    /// [`EventError::MissingCollection`] if absent,
    /// [`EventError::TypeMismatch`] if the name holds another payload.
    pub fn calo_clusters(&self, name: &str) -> EventResult<&[CaloCluster]> {
        match self.collections.get(name) {
            Some(Collection::CaloClusters(clusters)) => Ok(clusters),
            Some(other) => Err(EventError::type_mismatch(
                name,
                "calo clusters",
                other.type_name(),
            )),
            None => Err(EventError::missing(name)),
        }
    }

    /// Looks up a candidate collection by name.
    ///
    /// # Errors
    ///
    /// [`EventError::MissingCollection`] if absent,
    /// [`EventError::TypeMismatch`] if the name holds another payload.
    pub fn candidates(&self, name: &str) -> EventResult<&[PfCandidate]> {
        match self.collections.get(name) {
            Some(Collection::Candidates(cands)) => Ok(cands),
            Some(other) => Err(EventError::type_mismatch(
                name,
                "candidates",
                other.type_name(),
            )),
            None => Err(EventError::missing(name)),
        }
    }

    /// Returns `true` if a collection exists under the name.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    /// Returns the number of collections in the event.
    #[must_use]
    pub fn len(&self) -> usize {
        self.collections.len()
    }

    /// Returns `true` if the event holds no collections.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.collections.is_empty()
    }

    /// Iterates over the stored collection names, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }
}
