// Voter credentials
//
// A credential binds two secrets (nullifier, secret) to a public commitment.
// Only the commitment is published at registration; the nullifier hash is revealed
// at vote time so the same credential cannot vote twice in a conflict.

use std::fmt;

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::CommitmentError;
use crate::field::{field_from_be_bytes, serde_decimal};
use crate::hash::HashPrimitive;

/// Random bytes per secret. 248 bits always sit below the BN254 modulus.
pub const SECRET_BYTES: usize = 31;

/// Secret credential of one voter for one conflict.
///
/// Invariants: `commitment = hashN([nullifier, secret])` and `nullifier_hash = hashN([nullifier])`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    #[serde(with = "serde_decimal")]
    pub nullifier: Fr,
    #[serde(with = "serde_decimal")]
    pub secret: Fr,
    #[serde(with = "serde_decimal")]
    pub commitment: Fr,
    #[serde(with = "serde_decimal")]
    pub nullifier_hash: Fr,
}

impl Credential {
    /// Derive the public values from the two secrets
    pub fn from_secrets<H: HashPrimitive>(hasher: &H, nullifier: Fr, secret: Fr) -> Self {
        Self {
            nullifier,
            secret,
            commitment: hasher.hash_n(&[nullifier, secret]),
            nullifier_hash: hasher.hash_n(&[nullifier]),
        }
    }

    /// Check both hash invariants
    pub fn verify<H: HashPrimitive>(&self, hasher: &H) -> bool {
        self.commitment == hasher.hash_n(&[self.nullifier, self.secret])
            && self.nullifier_hash == hasher.hash_n(&[self.nullifier])
    }
}

// Secrets stay out of logs
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("nullifier", &"<redacted>")
            .field("secret", &"<redacted>")
            .field("commitment", &self.commitment)
            .field("nullifier_hash", &self.nullifier_hash)
            .finish()
    }
}

/// Draw one secret from `rng`
pub fn random_secret<R: RngCore + CryptoRng>(rng: &mut R) -> Result<Fr, CommitmentError> {
    let mut bytes = [0u8; 32];
    rng.try_fill_bytes(&mut bytes[32 - SECRET_BYTES..])
        .map_err(CommitmentError::RandomnessUnavailable)?;

    // Top byte is zero, so the value is always canonical
    Ok(field_from_be_bytes(&bytes).unwrap_or_else(|_| unreachable!("248-bit value is below the modulus")))
}

/// Generate a fresh credential from the operating system CSPRNG
pub fn generate_credential<H: HashPrimitive>(hasher: &H) -> Result<Credential, CommitmentError> {
    generate_credential_with_rng(hasher, &mut OsRng)
}

/// Generate a fresh credential from the given CSPRNG
pub fn generate_credential_with_rng<H: HashPrimitive, R: RngCore + CryptoRng>(
    hasher: &H,
    rng: &mut R,
) -> Result<Credential, CommitmentError> {
    let nullifier = random_secret(rng)?;
    let secret = random_secret(rng)?;
    Ok(Credential::from_secrets(hasher, nullifier, secret))
}
