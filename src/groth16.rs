// Groth16 proving interface
//
// The membership circuit and its prover live outside this crate (circom + snarkjs).
// This module fixes the witness and proof shapes exchanged with it, and the calldata
// export that feeds the on-chain verifier.

use serde::{Deserialize, Serialize};

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;

use crate::artifact::Artifact;
use crate::calldata::Word;
use crate::commitment::Credential;
use crate::error::ProvingError;
use crate::field::{serde_decimal, serde_decimal_vec};
use crate::merkle::MerkleProof;

/// Private and public inputs of the vote circuit.
///
/// The circuit recomputes the commitment, walks the path to the root and exposes
/// `[nullifierHash, root]` as public signals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitnessInput {
    #[serde(with = "serde_decimal")]
    pub nullifier: Fr,
    #[serde(with = "serde_decimal")]
    pub secret: Fr,
    #[serde(with = "serde_decimal_vec")]
    pub path_elements: Vec<Fr>,
    pub path_indices: Vec<u8>,
}

impl WitnessInput {
    pub fn new(credential: &Credential, path: &MerkleProof) -> Self {
        Self {
            nullifier: credential.nullifier,
            secret: credential.secret,
            path_elements: path.path_elements.clone(),
            path_indices: path.path_indices.clone(),
        }
    }
}

fn default_protocol() -> String {
    "groth16".to_string()
}

fn default_curve() -> String {
    "bn128".to_string()
}

/// A Groth16 proof in snarkjs JSON layout: projective coordinates as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    pub pi_a: [Word; 3],
    pub pi_b: [[Word; 2]; 3],
    pub pi_c: [Word; 3],
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_curve")]
    pub curve: String,
}

impl Groth16Proof {
    /// Build a proof from affine coordinates (`z = 1`)
    pub fn from_affine(a: [Word; 2], b: [[Word; 2]; 2], c: [Word; 2]) -> Self {
        let one = Word::from(Fr::from(1));
        Self {
            pi_a: [a[0], a[1], one],
            pi_b: [b[0], b[1], [one, Word::default()]],
            pi_c: [c[0], c[1], one],
            protocol: default_protocol(),
            curve: default_curve(),
        }
    }
}

/// What a full prove returns: the proof and the circuit's public signals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProverOutput {
    pub proof: Groth16Proof,
    #[serde(with = "serde_decimal_vec")]
    pub public_signals: Vec<Fr>,
}

/// External Groth16 prover
pub trait ProvingSystem {
    /// Generate the witness from `input` and prove it against the given circuit and key.
    ///
    /// An unsatisfiable witness is reported as [`ProvingError::Unsatisfiable`].
    fn full_prove(
        &self,
        input: &WitnessInput,
        circuit: &Artifact,
        proving_key: &Artifact,
    ) -> Result<ProverOutput, ProvingError>;
}

impl<P: ProvingSystem + ?Sized> ProvingSystem for &P {
    fn full_prove(
        &self,
        input: &WitnessInput,
        circuit: &Artifact,
        proving_key: &Artifact,
    ) -> Result<ProverOutput, ProvingError> {
        (**self).full_prove(input, circuit, proving_key)
    }
}

/// Render verifier calldata text the way `snarkjs zkey export soliditycalldata` does.
///
/// Every word is a quoted 0x-prefixed 64 digit hex string. The Fq2 components of
/// each `b` coordinate are swapped to the order the pairing precompile expects.
pub fn export_solidity_calldata(proof: &Groth16Proof, public_signals: &[Fr]) -> String {
    let word = |w: &Word| format!("\"{}\"", w.to_hex());
    let inputs = public_signals
        .iter()
        .map(|signal| word(&Word::from(*signal)))
        .collect::<Vec<_>>()
        .join(",");

    format!(
        "[{}, {}],[[{}, {}],[{}, {}]],[{}, {}],[{}]",
        word(&proof.pi_a[0]),
        word(&proof.pi_a[1]),
        word(&proof.pi_b[0][1]),
        word(&proof.pi_b[0][0]),
        word(&proof.pi_b[1][1]),
        word(&proof.pi_b[1][0]),
        word(&proof.pi_c[0]),
        word(&proof.pi_c[1]),
        inputs,
    )
}
