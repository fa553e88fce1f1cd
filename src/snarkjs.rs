// snarkjs command line prover
//
// Runs `snarkjs groth16 fullprove` in a scratch directory and reads back proof.json
// and public.json. Witness generation failures (an assert in the circuit) make
// snarkjs exit non-zero and are reported as unsatisfiable.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use serde::Deserialize;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::artifact::Artifact;
use crate::error::ProvingError;
use crate::field::serde_decimal_vec;
use crate::groth16::{Groth16Proof, ProverOutput, ProvingSystem, WitnessInput};

#[derive(Deserialize)]
struct PublicSignals(#[serde(with = "serde_decimal_vec")] Vec<Fr>);

/// [`ProvingSystem`] backed by the snarkjs CLI
#[derive(Debug, Clone)]
pub struct SnarkjsCli {
    program: PathBuf,
    leading_args: Vec<OsString>,
    scratch_root: PathBuf,
}

impl Default for SnarkjsCli {
    fn default() -> Self {
        Self::new("snarkjs")
    }
}

impl SnarkjsCli {
    /// Use `program` as the snarkjs executable
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            scratch_root: std::env::temp_dir(),
        }
    }

    /// Arguments placed before `groth16 fullprove`, e.g. `npx` + `["snarkjs"]`
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Directory under which per-proof scratch directories are created
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = root.into();
        self
    }

    /// Removed when the returned handle is dropped
    fn scratch_dir(&self) -> Result<TempDir, ProvingError> {
        tempfile::Builder::new()
            .prefix("zk-vote-prove")
            .tempdir_in(&self.scratch_root)
            .map_err(|e| {
                ProvingError::Backend(format!(
                    "Failed to create scratch directory in {}: {e}",
                    self.scratch_root.display()
                ))
            })
    }

    /// Path of an artifact on disk, writing in-memory artifacts into `dir`
    fn materialize(artifact: &Artifact, dir: &Path) -> Result<PathBuf, ProvingError> {
        if let Some(path) = artifact.path() {
            return Ok(path.to_path_buf());
        }
        let path = dir.join(artifact.kind().file_name());
        fs::write(&path, artifact.bytes()).map_err(|e| {
            ProvingError::Backend(format!("Failed to write {}: {e}", path.display()))
        })?;
        Ok(path)
    }

    fn run_in(
        &self,
        dir: &Path,
        input: &WitnessInput,
        circuit: &Artifact,
        proving_key: &Artifact,
    ) -> Result<ProverOutput, ProvingError> {
        let input_path = dir.join("input.json");
        let proof_path = dir.join("proof.json");
        let public_path = dir.join("public.json");

        let input_json = serde_json::to_vec(input)
            .map_err(|e| ProvingError::Backend(format!("Failed to encode witness input: {e}")))?;
        fs::write(&input_path, input_json).map_err(|e| {
            ProvingError::Backend(format!("Failed to write {}: {e}", input_path.display()))
        })?;
        let circuit_path = Self::materialize(circuit, dir)?;
        let key_path = Self::materialize(proving_key, dir)?;

        let output = Command::new(&self.program)
            .args(&self.leading_args)
            .arg("groth16")
            .arg("fullprove")
            .arg(&input_path)
            .arg(&circuit_path)
            .arg(&key_path)
            .arg(&proof_path)
            .arg(&public_path)
            .output()
            .map_err(|e| {
                ProvingError::Backend(format!(
                    "Failed to execute {}: {e}",
                    self.program.display()
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let message = if stderr.trim().is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            warn!(status = %output.status, %message, "snarkjs fullprove failed");
            return Err(ProvingError::Unsatisfiable(message));
        }

        let proof: Groth16Proof = read_json(&proof_path)?;
        let PublicSignals(public_signals) = read_json(&public_path)?;

        Ok(ProverOutput {
            proof,
            public_signals,
        })
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ProvingError> {
    let text = fs::read_to_string(path)
        .map_err(|e| ProvingError::Backend(format!("Failed to read {}: {e}", path.display())))?;
    serde_json::from_str(&text)
        .map_err(|e| ProvingError::Backend(format!("Failed to parse {}: {e}", path.display())))
}

impl ProvingSystem for SnarkjsCli {
    fn full_prove(
        &self,
        input: &WitnessInput,
        circuit: &Artifact,
        proving_key: &Artifact,
    ) -> Result<ProverOutput, ProvingError> {
        let dir = self.scratch_dir()?;
        let started = Instant::now();
        debug!(dir = %dir.path().display(), "running snarkjs groth16 fullprove");

        let result = self.run_in(dir.path(), input, circuit, proving_key);

        let path = dir.path().to_path_buf();
        if let Err(e) = dir.close() {
            warn!(dir = %path.display(), error = %e, "failed to remove prover scratch directory");
        }
        if result.is_ok() {
            info!(elapsed_ms = started.elapsed().as_millis() as u64, "snarkjs proof generated");
        }
        result
    }
}
