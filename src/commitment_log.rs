// Commitment log sources
//
// The accumulator needs every registered commitment for a conflict, in insertion
// order. Callers may already hold that list, or replay it from the registry's
// commit events (bytes32 commitment, uint32 leafIndex, uint256 timestamp).

use std::fs;
use std::path::Path;

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::error::CommitmentLogError;
use crate::field::serde_hex;

/// Ordered source of leaf commitments
pub trait CommitmentLog {
    /// All commitments, index `i` being leaf `i`
    fn commitments(&self) -> Result<Vec<Fr>, CommitmentLogError>;
}

impl CommitmentLog for [Fr] {
    fn commitments(&self) -> Result<Vec<Fr>, CommitmentLogError> {
        Ok(self.to_vec())
    }
}

impl CommitmentLog for Vec<Fr> {
    fn commitments(&self) -> Result<Vec<Fr>, CommitmentLogError> {
        Ok(self.clone())
    }
}

/// One registration event as emitted by the on-chain registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitEvent {
    #[serde(with = "serde_hex")]
    pub commitment: Fr,
    pub leaf_index: u32,
    pub timestamp: u64,
}

/// Rebuild the leaf list from commit events.
///
/// Events may arrive in any order; after sorting by leaf index they must cover
/// `0..n` exactly once.
pub fn replay_commit_events(events: &[CommitEvent]) -> Result<Vec<Fr>, CommitmentLogError> {
    let mut ordered: Vec<&CommitEvent> = events.iter().collect();
    ordered.sort_by_key(|event| event.leaf_index);

    for (position, event) in ordered.iter().enumerate() {
        if event.leaf_index as usize != position {
            error!(position, leaf_index = event.leaf_index, "gap or duplicate in commit events");
            return Err(CommitmentLogError::NonContiguousLeafIndex {
                position,
                leaf_index: event.leaf_index,
            });
        }
    }

    debug!(leaves = ordered.len(), "replayed commit events");
    Ok(ordered.into_iter().map(|event| event.commitment).collect())
}

/// Commitment log backed by a list of commit events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventReplayLog {
    events: Vec<CommitEvent>,
}

impl EventReplayLog {
    pub fn new(events: Vec<CommitEvent>) -> Self {
        Self { events }
    }

    /// Parse a JSON array of commit events
    pub fn from_json_str(json: &str) -> Result<Self, CommitmentLogError> {
        Ok(Self::new(serde_json::from_str(json)?))
    }

    /// Load a JSON array of commit events from disk
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, CommitmentLogError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| CommitmentLogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    pub fn push(&mut self, event: CommitEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[CommitEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl CommitmentLog for EventReplayLog {
    fn commitments(&self) -> Result<Vec<Fr>, CommitmentLogError> {
        replay_commit_events(&self.events)
    }
}
