// Anonymous Conflict Voting - credential and accumulator core
// Voters commit to secret credentials, the commitments form a fixed-depth Poseidon
// Merkle accumulator, and a Groth16 proof of membership is shaped into verifier calldata.
// Poseidon over BN254 via Axiom halo2_base (Mainnet V2, Trail of Bits audited)

pub mod error;
pub mod field;
pub mod hash;
pub mod poseidon_hash; // Axiom halo2_base Poseidon, evaluated natively

pub mod commitment; // Credential generation
pub mod zero_values; // Empty-subtree hashes
pub mod merkle; // Merkle accumulator (root + path)
pub mod commitment_log; // Commit event replay

pub mod artifact; // Circuit / proving key handles
pub mod groth16; // Witness + proof shapes, calldata export
pub mod snarkjs; // snarkjs CLI prover
pub mod calldata; // Verifier calldata formatting
pub mod prover; // Proof pipeline
pub mod config;

#[cfg(test)]
mod test_utils;

pub use commitment::{generate_credential, generate_credential_with_rng, Credential};
pub use config::AccumulatorConfig;
pub use error::{
    ArtifactError, CalldataError, CommitmentError, CommitmentLogError, ConfigError, FieldError,
    MerkleTreeError, ProofPipelineError, ProvingError,
};
pub use field::FieldElement;
pub use hash::HashPrimitive;
pub use merkle::{compute_root_and_path, verify_path, MerkleProof, MerkleTree};
pub use poseidon_hash::PoseidonHash;
pub use prover::{ProofArtifact, ProofPipeline};
pub use zero_values::{ZeroValueTable, TREE_LEVELS, ZERO_VALUE_DECIMAL};

// Re-export Axiom stack
pub use halo2_base;
