// Shared helpers for unit tests
//
// Poseidon through the halo2 builder costs milliseconds per call, which adds up in
// trees of thousands of leaves, so unit tests run against a Blake2b-based stand-in.
// Integration tests in tests/ use the real Poseidon hasher.

use std::sync::atomic::{AtomicUsize, Ordering};

use blake2::{Blake2b512, Digest};
use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use rand::{CryptoRng, RngCore};

use crate::artifact::{Artifact, ArtifactKind};
use crate::calldata::Word;
use crate::error::ProvingError;
use crate::field::field_from_be_bytes;
use crate::groth16::{Groth16Proof, ProverOutput, ProvingSystem, WitnessInput};
use crate::hash::HashPrimitive;
use crate::merkle::verify_path;

pub fn fr(value: u64) -> Fr {
    Fr::from(value)
}

/// Non-commutative, arity-separated hash over BN254 built from Blake2b-512
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake2bTestHash;

impl HashPrimitive for Blake2bTestHash {
    fn hash_n(&self, inputs: &[Fr]) -> Fr {
        let mut hasher = Blake2b512::new();
        hasher.update((inputs.len() as u64).to_be_bytes());
        for input in inputs {
            hasher.update(crate::field::field_to_be_bytes(input));
        }
        let digest = hasher.finalize();

        // 248 bits are always canonical
        let mut be = [0u8; 32];
        be[1..].copy_from_slice(&digest[..31]);
        field_from_be_bytes(&be).expect("248-bit value is below the modulus")
    }
}

/// RNG whose entropy source is gone
pub struct FailingRng;

impl RngCore for FailingRng {
    fn next_u32(&mut self) -> u32 {
        panic!("entropy source unavailable")
    }

    fn next_u64(&mut self) -> u64 {
        panic!("entropy source unavailable")
    }

    fn fill_bytes(&mut self, _dest: &mut [u8]) {
        panic!("entropy source unavailable")
    }

    fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), rand::Error> {
        Err(rand::Error::new("entropy source unavailable"))
    }
}

impl CryptoRng for FailingRng {}

/// How [`CircuitSimulator`] tampers with its output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalTamper {
    #[default]
    None,
    /// Return `[root, nullifierHash]`
    Swapped,
    /// Return only the nullifier hash
    Truncated,
}

/// Proving system double that enforces the vote circuit's constraints natively.
///
/// Rejects witnesses the real circuit could not satisfy, returns
/// `[nullifierHash, root]` and a proof whose words are derived from the signals.
pub struct CircuitSimulator<H> {
    pub hasher: H,
    pub levels: usize,
    pub tamper: SignalTamper,
    pub calls: AtomicUsize,
}

impl<H: HashPrimitive> CircuitSimulator<H> {
    pub fn new(hasher: H, levels: usize) -> Self {
        Self {
            hasher,
            levels,
            tamper: SignalTamper::None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_tamper(mut self, tamper: SignalTamper) -> Self {
        self.tamper = tamper;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl<H: HashPrimitive> ProvingSystem for CircuitSimulator<H> {
    fn full_prove(
        &self,
        input: &WitnessInput,
        circuit: &Artifact,
        proving_key: &Artifact,
    ) -> Result<ProverOutput, ProvingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        circuit
            .ensure_kind(ArtifactKind::Circuit)
            .and_then(|_| proving_key.ensure_kind(ArtifactKind::ProvingKey))
            .map_err(|e| ProvingError::Backend(e.to_string()))?;

        if input.path_elements.len() != self.levels || input.path_indices.len() != self.levels {
            return Err(ProvingError::Unsatisfiable(format!(
                "expected {} path entries, got {} elements and {} indices",
                self.levels,
                input.path_elements.len(),
                input.path_indices.len()
            )));
        }

        let commitment = self.hasher.hash_n(&[input.nullifier, input.secret]);
        let root = verify_path(
            &self.hasher,
            commitment,
            &input.path_elements,
            &input.path_indices,
            self.levels,
        )
        .map_err(|e| ProvingError::Unsatisfiable(e.to_string()))?;
        let nullifier_hash = self.hasher.hash_n(&[input.nullifier]);

        let word = |tag: u64| Word::from(self.hasher.hash_n(&[fr(tag), nullifier_hash, root]));
        let proof = Groth16Proof::from_affine(
            [word(1), word(2)],
            [[word(3), word(4)], [word(5), word(6)]],
            [word(7), word(8)],
        );

        let public_signals = match self.tamper {
            SignalTamper::None => vec![nullifier_hash, root],
            SignalTamper::Swapped => vec![root, nullifier_hash],
            SignalTamper::Truncated => vec![nullifier_hash],
        };

        Ok(ProverOutput {
            proof,
            public_signals,
        })
    }
}

/// In-memory circuit and proving key handles
pub fn dummy_artifacts() -> (Artifact, Artifact) {
    (
        Artifact::from_bytes(ArtifactKind::Circuit, b"\0asm circuit".to_vec()),
        Artifact::from_bytes(ArtifactKind::ProvingKey, b"zkey proving key".to_vec()),
    )
}
