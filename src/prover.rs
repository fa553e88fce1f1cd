// Vote proof pipeline
//
// credential + commitment log -> root and path -> Groth16 full prove -> verifier calldata.
// Every run rebuilds the tree from the full log; no tree state outlives a call.

use std::time::Instant;

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::artifact::{Artifact, ArtifactKind};
use crate::calldata::{self, SolidityCalldata, Word, PROOF_ELEMENTS, PUBLIC_INPUT_COUNT};
use crate::commitment::Credential;
use crate::commitment_log::CommitmentLog;
use crate::config::AccumulatorConfig;
use crate::error::{ArtifactError, CalldataError, ProofPipelineError};
use crate::field::{serde_decimal, serde_decimal_vec};
use crate::groth16::{export_solidity_calldata, Groth16Proof, ProvingSystem, WitnessInput};
use crate::hash::HashPrimitive;
use crate::merkle::compute_root_and_path_with_zeros;
use crate::zero_values::ZeroValueTable;

/// A proof ready for submission to the vote contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofArtifact {
    #[serde(with = "serde_decimal")]
    pub nullifier_hash: Fr,
    #[serde(with = "serde_decimal")]
    pub root: Fr,
    pub proof: Groth16Proof,
    #[serde(with = "serde_decimal_vec")]
    pub public_signals: Vec<Fr>,
    pub calldata: SolidityCalldata,
}

impl ProofArtifact {
    pub fn proof_a(&self) -> &[Word; 2] {
        &self.calldata.a
    }

    pub fn proof_b(&self) -> &[[Word; 2]; 2] {
        &self.calldata.b
    }

    pub fn proof_c(&self) -> &[Word; 2] {
        &self.calldata.c
    }
}

/// Groth16 vote proof generator for one deployment
pub struct ProofPipeline<H, P> {
    hasher: H,
    prover: P,
    zeros: ZeroValueTable,
    circuit: Artifact,
    proving_key: Artifact,
}

impl<H: HashPrimitive, P: ProvingSystem> ProofPipeline<H, P> {
    /// Assemble a pipeline; the artifacts must be a circuit and a proving key, in that order
    pub fn new(
        hasher: H,
        prover: P,
        zeros: ZeroValueTable,
        circuit: Artifact,
        proving_key: Artifact,
    ) -> Result<Self, ArtifactError> {
        circuit.ensure_kind(ArtifactKind::Circuit)?;
        proving_key.ensure_kind(ArtifactKind::ProvingKey)?;

        Ok(Self {
            hasher,
            prover,
            zeros,
            circuit,
            proving_key,
        })
    }

    /// Build the zero table and load the artifacts named by `config`
    pub fn from_config(
        config: &AccumulatorConfig,
        hasher: H,
        prover: P,
    ) -> Result<Self, ProofPipelineError> {
        let zeros = config.zero_table(&hasher)?;
        let (circuit, proving_key) = config.load_artifacts()?;
        Ok(Self::new(hasher, prover, zeros, circuit, proving_key)?)
    }

    pub fn levels(&self) -> usize {
        self.zeros.levels()
    }

    pub fn zeros(&self) -> &ZeroValueTable {
        &self.zeros
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Prove that `credential` is a member of the accumulator over `commitment_log`.
    ///
    /// The public signals returned by the prover must equal `[nullifierHash, root]`
    /// as computed locally, otherwise the proof would not verify on chain.
    pub fn build_proof(
        &self,
        commitment_log: &[Fr],
        credential: &Credential,
    ) -> Result<ProofArtifact, ProofPipelineError> {
        let merkle = compute_root_and_path_with_zeros(
            &self.hasher,
            commitment_log,
            &self.zeros,
            Some(credential.commitment),
        )?;

        let input = WitnessInput::new(credential, &merkle);
        let started = Instant::now();
        info!(
            leaves = commitment_log.len(),
            levels = self.levels(),
            "generating vote proof"
        );
        let output = self
            .prover
            .full_prove(&input, &self.circuit, &self.proving_key)
            .map_err(|e| {
                warn!(error = %e, "prover rejected witness");
                e
            })?;
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "vote proof generated"
        );

        let (nullifier_hash, root) = match output.public_signals.as_slice() {
            [nullifier_hash, root] => (*nullifier_hash, *root),
            other => {
                return Err(CalldataError::MalformedProof {
                    expected: PROOF_ELEMENTS + PUBLIC_INPUT_COUNT,
                    actual: PROOF_ELEMENTS + other.len(),
                }
                .into())
            }
        };
        check_signal("nullifierHash", credential.nullifier_hash, nullifier_hash)?;
        check_signal("root", merkle.root, root)?;

        let calldata = calldata::format(&export_solidity_calldata(
            &output.proof,
            &output.public_signals,
        ))?;

        Ok(ProofArtifact {
            nullifier_hash,
            root,
            proof: output.proof,
            public_signals: output.public_signals,
            calldata,
        })
    }

    /// [`build_proof`](Self::build_proof) over any commitment log source
    pub fn build_proof_from_log<L: CommitmentLog + ?Sized>(
        &self,
        log: &L,
        credential: &Credential,
    ) -> Result<ProofArtifact, ProofPipelineError> {
        let commitments = log.commitments()?;
        self.build_proof(&commitments, credential)
    }
}

impl<H, P> ProofPipeline<H, P>
where
    H: HashPrimitive + Sync,
    P: ProvingSystem + Sync,
{
    /// Prove several credentials against the same log in parallel.
    ///
    /// Results keep the order of `credentials`; one failure does not stop the others.
    pub fn build_proofs(
        &self,
        commitment_log: &[Fr],
        credentials: &[Credential],
    ) -> Vec<Result<ProofArtifact, ProofPipelineError>> {
        credentials
            .par_iter()
            .map(|credential| self.build_proof(commitment_log, credential))
            .collect()
    }
}

fn check_signal(name: &'static str, expected: Fr, actual: Fr) -> Result<(), ProofPipelineError> {
    if expected != actual {
        return Err(ProofPipelineError::PublicSignalMismatch {
            name,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::generate_credential;
    use crate::error::{MerkleTreeError, ProvingError};
    use crate::merkle::verify_path;
    use crate::test_utils::{dummy_artifacts, fr, Blake2bTestHash, CircuitSimulator, SignalTamper};

    const LEVELS: usize = 4;

    fn pipeline(
        tamper: SignalTamper,
    ) -> ProofPipeline<Blake2bTestHash, CircuitSimulator<Blake2bTestHash>> {
        let (circuit, proving_key) = dummy_artifacts();
        let zeros = ZeroValueTable::build(&Blake2bTestHash, LEVELS).unwrap();
        let prover = CircuitSimulator::new(Blake2bTestHash, LEVELS).with_tamper(tamper);
        ProofPipeline::new(Blake2bTestHash, prover, zeros, circuit, proving_key).unwrap()
    }

    fn registered(n: usize) -> (Vec<Credential>, Vec<Fr>) {
        let credentials: Vec<_> = (0..n)
            .map(|_| generate_credential(&Blake2bTestHash).unwrap())
            .collect();
        let log = credentials.iter().map(|c| c.commitment).collect();
        (credentials, log)
    }

    #[test]
    fn test_proof_for_registered_voter() {
        let pipeline = pipeline(SignalTamper::None);
        let (credentials, log) = registered(3);
        let voter = &credentials[1];

        let artifact = pipeline.build_proof(&log, voter).unwrap();

        assert_eq!(artifact.nullifier_hash, voter.nullifier_hash);
        assert_eq!(artifact.public_signals, vec![voter.nullifier_hash, artifact.root]);
        assert_eq!(
            artifact.calldata.input,
            vec![Word::from(voter.nullifier_hash), Word::from(artifact.root)]
        );
        assert_eq!(artifact.calldata.public_inputs().unwrap(), artifact.public_signals);

        // b is exported with swapped components
        assert_eq!(artifact.proof_b()[0], [artifact.proof.pi_b[0][1], artifact.proof.pi_b[0][0]]);
        assert_eq!(artifact.proof_a(), &[artifact.proof.pi_a[0], artifact.proof.pi_a[1]]);
        assert_eq!(artifact.proof_c(), &[artifact.proof.pi_c[0], artifact.proof.pi_c[1]]);
    }

    #[test]
    fn test_signals_reproduce_with_pipeline_hasher() {
        let pipeline = pipeline(SignalTamper::None);
        let (credentials, log) = registered(2);
        let voter = &credentials[0];

        let artifact = pipeline.build_proof(&log, voter).unwrap();
        let hasher = pipeline.hasher();
        assert_eq!(hasher.hash_n(&[voter.nullifier]), artifact.nullifier_hash);
        assert_eq!(hasher.hash_n(&[voter.nullifier, voter.secret]), log[0]);
    }

    #[test]
    fn test_root_matches_accumulator() {
        let pipeline = pipeline(SignalTamper::None);
        let (credentials, log) = registered(5);

        let expected = compute_root_and_path_with_zeros(&Blake2bTestHash, &log, pipeline.zeros(), None)
            .unwrap()
            .root;
        for credential in &credentials {
            assert_eq!(pipeline.build_proof(&log, credential).unwrap().root, expected);
        }
    }

    #[test]
    fn test_unregistered_voter_never_reaches_prover() {
        let pipeline = pipeline(SignalTamper::None);
        let (_, log) = registered(2);
        let outsider = generate_credential(&Blake2bTestHash).unwrap();

        let err = pipeline.build_proof(&log, &outsider).unwrap_err();
        assert!(matches!(
            err,
            ProofPipelineError::Merkle(MerkleTreeError::LeafNotFound { .. })
        ));
        assert_eq!(pipeline.prover.call_count(), 0);
    }

    #[test]
    fn test_full_tree_rejected() {
        let pipeline = pipeline(SignalTamper::None);
        let (credentials, mut log) = registered(1);
        log.extend((0..(1u64 << LEVELS)).map(fr));

        assert!(matches!(
            pipeline.build_proof(&log, &credentials[0]),
            Err(ProofPipelineError::Merkle(MerkleTreeError::TreeFull { .. }))
        ));
    }

    #[test]
    fn test_swapped_signals_detected() {
        let pipeline = pipeline(SignalTamper::Swapped);
        let (credentials, log) = registered(2);

        match pipeline.build_proof(&log, &credentials[0]) {
            Err(ProofPipelineError::PublicSignalMismatch { name, .. }) => {
                assert_eq!(name, "nullifierHash")
            }
            other => panic!("expected PublicSignalMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_signal_count_is_malformed() {
        let pipeline = pipeline(SignalTamper::Truncated);
        let (credentials, log) = registered(2);

        assert!(matches!(
            pipeline.build_proof(&log, &credentials[0]),
            Err(ProofPipelineError::MalformedProof(CalldataError::MalformedProof {
                expected: 10,
                actual: 9
            }))
        ));
    }

    #[test]
    fn test_prover_depth_mismatch_is_proving_failure() {
        let (circuit, proving_key) = dummy_artifacts();
        let zeros = ZeroValueTable::build(&Blake2bTestHash, LEVELS).unwrap();
        // Circuit compiled for a deeper tree than the accumulator
        let prover = CircuitSimulator::new(Blake2bTestHash, LEVELS + 1);
        let pipeline = ProofPipeline::new(Blake2bTestHash, prover, zeros, circuit, proving_key).unwrap();
        let (credentials, log) = registered(1);

        assert!(matches!(
            pipeline.build_proof(&log, &credentials[0]),
            Err(ProofPipelineError::ProvingFailed(ProvingError::Unsatisfiable(_)))
        ));
    }

    #[test]
    fn test_artifacts_in_wrong_order() {
        let (circuit, proving_key) = dummy_artifacts();
        let zeros = ZeroValueTable::build(&Blake2bTestHash, LEVELS).unwrap();
        let prover = CircuitSimulator::new(Blake2bTestHash, LEVELS);

        assert!(matches!(
            ProofPipeline::new(Blake2bTestHash, prover, zeros, proving_key, circuit),
            Err(ArtifactError::WrongKind { .. })
        ));
    }

    #[test]
    fn test_build_from_event_log() {
        use crate::commitment_log::{CommitEvent, EventReplayLog};

        let pipeline = pipeline(SignalTamper::None);
        let (credentials, log) = registered(3);
        let events = log
            .iter()
            .enumerate()
            .rev()
            .map(|(i, commitment)| CommitEvent {
                commitment: *commitment,
                leaf_index: i as u32,
                timestamp: i as u64,
            })
            .collect();

        let from_events = pipeline
            .build_proof_from_log(&EventReplayLog::new(events), &credentials[2])
            .unwrap();
        let direct = pipeline.build_proof(&log, &credentials[2]).unwrap();
        assert_eq!(from_events, direct);
    }

    #[test]
    fn test_parallel_proofs_keep_order() {
        let pipeline = pipeline(SignalTamper::None);
        let (credentials, log) = registered(6);
        let mut batch = credentials.clone();
        batch.push(generate_credential(&Blake2bTestHash).unwrap());

        let results = pipeline.build_proofs(&log, &batch);
        assert_eq!(results.len(), batch.len());
        for (credential, result) in credentials.iter().zip(&results) {
            assert_eq!(result.as_ref().unwrap().nullifier_hash, credential.nullifier_hash);
        }
        assert!(results[6].is_err());
    }

    #[test]
    fn test_witness_path_replays_to_public_root() {
        let pipeline = pipeline(SignalTamper::None);
        let (credentials, log) = registered(3);
        let voter = &credentials[2];

        let merkle = compute_root_and_path_with_zeros(
            &Blake2bTestHash,
            &log,
            pipeline.zeros(),
            Some(voter.commitment),
        )
        .unwrap();
        let artifact = pipeline.build_proof(&log, voter).unwrap();
        let replayed = verify_path(
            &Blake2bTestHash,
            voter.commitment,
            &merkle.path_elements,
            &merkle.path_indices,
            LEVELS,
        )
        .unwrap();
        assert_eq!(replayed, artifact.root);
    }

    #[test]
    fn test_artifact_json_shape() {
        let pipeline = pipeline(SignalTamper::None);
        let (credentials, log) = registered(1);
        let artifact = pipeline.build_proof(&log, &credentials[0]).unwrap();

        let json = serde_json::to_value(&artifact).unwrap();
        assert!(json["nullifierHash"].is_string());
        assert_eq!(json["publicSignals"].as_array().unwrap().len(), 2);
        assert_eq!(json["calldata"]["b"].as_array().unwrap().len(), 2);

        let back: ProofArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(back, artifact);
    }
}
