//! Crate specific errors
use std::path::PathBuf;

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;

use crate::artifact::ArtifactKind;

/// Errors raised while decoding field elements from their external encodings.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FieldError {
    /// Hex string could not be decoded
    #[error("Invalid hex string {value:?}: {reason}")]
    InvalidHex { value: String, reason: String },

    /// Decimal string contains a non-digit or is empty
    #[error("Invalid decimal string {0:?}")]
    InvalidDecimal(String),

    /// Encoded integer does not fit in 256 bits
    #[error("Value {0:?} does not fit in 32 bytes")]
    TooLong(String),

    /// Encoded integer is not below the scalar field modulus
    #[error("Value {0:?} is not a canonical field element (out of range)")]
    OutOfRange(String),
}

/// Error types related to the commitment merkle tree.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum MerkleTreeError {
    /// More leaves than the tree can hold
    #[error("Tree is full: {leaves} leaves exceed the capacity {capacity} of a depth {levels} tree")]
    TreeFull {
        leaves: usize,
        capacity: usize,
        levels: usize,
    },

    /// The target commitment is absent from the leaf list
    #[error("Leaf {leaf:?} not found among {leaves} committed leaves")]
    LeafNotFound { leaf: Fr, leaves: usize },

    /// A path was requested for a position past the last leaf
    #[error("Leaf index {index} out of range for {leaves} committed leaves")]
    LeafIndexOutOfRange { index: usize, leaves: usize },

    /// Depth is zero or deeper than the proving circuit
    #[error("Invalid tree depth {levels}, must be between 1 and {max}")]
    InvalidDepth { levels: usize, max: usize },

    /// Path arrays are shorter than the tree depth
    #[error(
        "Invalid Merkle path length: {elements} elements and {indices} indices for a depth {levels} tree"
    )]
    PathLengthMismatch {
        elements: usize,
        indices: usize,
        levels: usize,
    },

    /// A direction bit other than 0 or 1
    #[error("Invalid path index {value} at depth {depth}, expected 0 or 1")]
    InvalidPathIndex { depth: usize, value: u8 },

    /// The proof carries only a root, as returned for a query without a target leaf
    #[error("Merkle proof has no authentication path")]
    EmptyPath,
}

/// Errors raised while generating voter credentials.
#[derive(Debug, thiserror::Error)]
pub enum CommitmentError {
    /// The operating system CSPRNG could not be read
    #[error("Randomness unavailable: {0}")]
    RandomnessUnavailable(#[source] rand::Error),
}

/// Errors raised while replaying the commitment log.
#[derive(Debug, thiserror::Error)]
pub enum CommitmentLogError {
    /// An event is missing or out of order
    #[error("Commit event at position {position} carries leaf index {leaf_index}")]
    NonContiguousLeafIndex { position: usize, leaf_index: u32 },

    /// The event source could not be read
    #[error("Failed to read commitment log {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The event source is not valid JSON
    #[error("Failed to parse commitment log: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised while loading circuit and proving key artifacts.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    /// The artifact file could not be read
    #[error("Failed to read {kind} artifact {path}: {source}")]
    Io {
        kind: ArtifactKind,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The artifact digest differs from the pinned one
    #[error("{kind} artifact hash mismatch: expected {expected}, got {actual}")]
    IntegrityMismatch {
        kind: ArtifactKind,
        expected: String,
        actual: String,
    },

    /// A handle of one kind was passed where the other is required
    #[error("Expected a {expected} artifact, got a {actual} artifact")]
    WrongKind {
        expected: ArtifactKind,
        actual: ArtifactKind,
    },

    /// The configuration names no artifact path
    #[error("No {0} artifact configured")]
    Missing(ArtifactKind),
}

/// Errors reported by the external proving system.
#[derive(Debug, thiserror::Error)]
pub enum ProvingError {
    /// The witness does not satisfy the circuit
    #[error("Witness is unsatisfiable: {0}")]
    Unsatisfiable(String),

    /// The prover itself failed (spawn, IO, output decoding)
    #[error("Prover backend failure: {0}")]
    Backend(String),
}

/// Errors raised while formatting verifier calldata.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum CalldataError {
    /// Wrong number of calldata elements
    #[error("Malformed proof calldata: expected {expected} elements, got {actual}")]
    MalformedProof { expected: usize, actual: usize },

    /// One element is not an unsigned 256-bit integer
    #[error("Invalid calldata word {value:?} at position {position}: {source}")]
    InvalidWord {
        position: usize,
        value: String,
        #[source]
        source: FieldError,
    },

    /// A public input word is not a scalar field element
    #[error("Public input {position} is not a field element: {source}")]
    InvalidPublicInput {
        position: usize,
        #[source]
        source: FieldError,
    },
}

/// Errors raised while loading the deployment configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid JSON
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The configured depth is not supported
    #[error("Invalid config: {0}")]
    Invalid(#[from] MerkleTreeError),
}

/// Errors surfaced by the proof pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ProofPipelineError {
    /// Root or path computation failed
    #[error(transparent)]
    Merkle(#[from] MerkleTreeError),

    /// The external prover rejected the witness or failed
    #[error("Proving failed: {0}")]
    ProvingFailed(#[from] ProvingError),

    /// The proof could not be laid out as verifier calldata
    #[error(transparent)]
    MalformedProof(#[from] CalldataError),

    /// Circuit or proving key handle problem
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Commitment log replay failed
    #[error(transparent)]
    CommitmentLog(#[from] CommitmentLogError),

    /// The prover returned public signals that disagree with the local computation
    #[error("Public signal {name} mismatch: expected {expected:?}, prover returned {actual:?}")]
    PublicSignalMismatch {
        name: &'static str,
        expected: Fr,
        actual: Fr,
    },
}
