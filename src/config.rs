//! Deployment configuration
//!
//! Tree depth, empty-leaf constant and artifact locations must match the deployed
//! circuit and registry contract exactly; any drift yields roots the verifier rejects.

use std::fs;
use std::path::{Path, PathBuf};

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::artifact::{Artifact, ArtifactKind};
use crate::error::{ArtifactError, ConfigError, MerkleTreeError};
use crate::field::serde_decimal;
use crate::hash::HashPrimitive;
use crate::zero_values::{validate_levels, zero_value, ZeroValueTable, TREE_LEVELS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccumulatorConfig {
    /// Tree depth, 1..=20
    pub levels: usize,
    /// Empty-leaf constant, decimal
    #[serde(with = "serde_decimal")]
    pub zero_value: Fr,
    pub circuit_path: Option<PathBuf>,
    pub proving_key_path: Option<PathBuf>,
    /// Pinned Blake2b-512 digests (hex); unchecked when absent
    pub circuit_blake2b: Option<String>,
    pub proving_key_blake2b: Option<String>,
}

impl Default for AccumulatorConfig {
    fn default() -> Self {
        Self {
            levels: TREE_LEVELS,
            zero_value: zero_value(),
            circuit_path: None,
            proving_key_path: None,
            circuit_blake2b: None,
            proving_key_blake2b: None,
        }
    }
}

impl AccumulatorConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&json)?;
        info!(path = %path.display(), levels = config.levels, "loaded accumulator config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_levels(self.levels)?;
        Ok(())
    }

    /// Zero table for the configured depth and empty leaf
    pub fn zero_table<H: HashPrimitive>(&self, hasher: &H) -> Result<ZeroValueTable, MerkleTreeError> {
        ZeroValueTable::build_with_seed(hasher, self.levels, self.zero_value)
    }

    /// Load the circuit and proving key, checking pinned digests
    pub fn load_artifacts(&self) -> Result<(Artifact, Artifact), ArtifactError> {
        let circuit = load_artifact(
            ArtifactKind::Circuit,
            self.circuit_path.as_deref(),
            self.circuit_blake2b.as_deref(),
        )?;
        let proving_key = load_artifact(
            ArtifactKind::ProvingKey,
            self.proving_key_path.as_deref(),
            self.proving_key_blake2b.as_deref(),
        )?;
        Ok((circuit, proving_key))
    }
}

fn load_artifact(
    kind: ArtifactKind,
    path: Option<&Path>,
    blake2b: Option<&str>,
) -> Result<Artifact, ArtifactError> {
    let path = path.ok_or(ArtifactError::Missing(kind))?;
    match blake2b {
        Some(expected) => Artifact::load_verified(kind, path, expected),
        None => Artifact::load(kind, path),
    }
}
