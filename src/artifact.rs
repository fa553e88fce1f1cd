// Circuit and proving key artifacts
//
// The compiled witness generator (circuit.wasm) and the Groth16 proving key
// (circuit.zkey) are opaque to this crate; they are read once, optionally pinned by
// their Blake2b-512 digest, and handed to the proving system unchanged.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use blake2::{Blake2b512, Digest};
use tracing::{error, info};

use crate::error::ArtifactError;

/// Which half of the proving setup an artifact is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Compiled witness generator
    Circuit,
    /// Groth16 proving key
    ProvingKey,
}

impl ArtifactKind {
    /// File name used when the artifact has to be materialized for a prover
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Circuit => "circuit.wasm",
            ArtifactKind::ProvingKey => "circuit.zkey",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtifactKind::Circuit => f.write_str("circuit"),
            ArtifactKind::ProvingKey => f.write_str("proving key"),
        }
    }
}

/// Opaque artifact handle
#[derive(Clone)]
pub struct Artifact {
    kind: ArtifactKind,
    bytes: Vec<u8>,
    path: Option<PathBuf>,
}

impl Artifact {
    /// Read an artifact from disk
    pub fn load(kind: ArtifactKind, path: impl AsRef<Path>) -> Result<Self, ArtifactError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
            kind,
            path: path.to_path_buf(),
            source,
        })?;
        info!(%kind, path = %path.display(), size = bytes.len(), "loaded artifact");

        Ok(Self {
            kind,
            bytes,
            path: Some(path.to_path_buf()),
        })
    }

    /// Read an artifact and check it against a pinned Blake2b-512 digest
    pub fn load_verified(
        kind: ArtifactKind,
        path: impl AsRef<Path>,
        expected_blake2b: &str,
    ) -> Result<Self, ArtifactError> {
        let artifact = Self::load(kind, path)?;
        artifact.verify_blake2b(expected_blake2b)?;
        Ok(artifact)
    }

    /// Wrap in-memory bytes (embedded or already downloaded artifacts)
    pub fn from_bytes(kind: ArtifactKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            kind,
            bytes: bytes.into(),
            path: None,
        }
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Source file, if the artifact was loaded from disk
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Lowercase hex Blake2b-512 digest of the contents
    pub fn blake2b_hex(&self) -> String {
        format!("{:x}", Blake2b512::digest(&self.bytes))
    }

    /// Fail unless the contents hash to `expected` (hex, case-insensitive)
    pub fn verify_blake2b(&self, expected: &str) -> Result<(), ArtifactError> {
        let actual = self.blake2b_hex();
        if !actual.eq_ignore_ascii_case(expected.trim()) {
            error!(kind = %self.kind, %expected, %actual, "artifact hash mismatch");
            return Err(ArtifactError::IntegrityMismatch {
                kind: self.kind,
                expected: expected.to_string(),
                actual,
            });
        }
        Ok(())
    }

    /// Fail unless this artifact is of the `expected` kind
    pub fn ensure_kind(&self, expected: ArtifactKind) -> Result<(), ArtifactError> {
        if self.kind != expected {
            return Err(ArtifactError::WrongKind {
                expected,
                actual: self.kind,
            });
        }
        Ok(())
    }
}

// Artifacts run to tens of megabytes; never dump the contents
impl fmt::Debug for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Artifact")
            .field("kind", &self.kind)
            .field("len", &self.bytes.len())
            .field("path", &self.path)
            .finish()
    }
}
