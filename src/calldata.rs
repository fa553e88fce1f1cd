// Solidity calldata for the pairing-based Groth16 verifier
//
// The verifier takes `(uint[2] a, uint[2][2] b, uint[2] c, uint[N] input)`.
// `b` holds G2 coordinates whose Fq2 components are already swapped by the export
// step; a transposed `b` decodes fine and only fails the on-chain pairing check,
// so the layout below must never be reordered.

use std::fmt;
use std::str::FromStr;

use halo2_base::halo2_proofs::halo2curves::bn256::{Fq, Fr};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CalldataError, FieldError};
use crate::field::{be_bytes_to_decimal, decimal_to_be_bytes, field_from_be_bytes, field_to_be_bytes, hex_to_be_bytes};

/// Curve points of a Groth16 proof: a (2) + b (4) + c (2)
pub const PROOF_ELEMENTS: usize = 8;

/// Public inputs of the vote circuit: `[nullifierHash, root]`
pub const PUBLIC_INPUT_COUNT: usize = 2;

/// Unsigned 256-bit calldata word, big-endian.
///
/// Proof coordinates live in the base field `Fq`, public inputs in the scalar
/// field `Fr`; both fit in one word.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Word([u8; 32]);

impl Word {
    pub const fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0
    }

    /// 0x-prefixed, 64 hex digits
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Interpret the word as a scalar field element (public inputs)
    pub fn to_field(&self) -> Result<Fr, FieldError> {
        field_from_be_bytes(&self.0)
    }
}

impl From<Fr> for Word {
    fn from(value: Fr) -> Self {
        Self(field_to_be_bytes(&value))
    }
}

impl From<Fq> for Word {
    fn from(value: Fq) -> Self {
        let mut be = value.to_bytes();
        be.reverse();
        Self(be)
    }
}

impl FromStr for Word {
    type Err = FieldError;

    /// Decimal, or hex with a "0x"/"0X" prefix
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.starts_with("0x") || s.starts_with("0X") {
            hex_to_be_bytes(s).map(Self)
        } else {
            decimal_to_be_bytes(s).map(Self)
        }
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&be_bytes_to_decimal(&self.0))
    }
}

impl fmt::Debug for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Word({})", self.to_hex())
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Verifier calldata partitioned into the fixed Groth16 shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolidityCalldata {
    pub a: [Word; 2],
    pub b: [[Word; 2]; 2],
    pub c: [Word; 2],
    pub input: Vec<Word>,
}

impl SolidityCalldata {
    /// Public inputs decoded back into field elements
    pub fn public_inputs(&self) -> Result<Vec<Fr>, CalldataError> {
        self.input
            .iter()
            .enumerate()
            .map(|(position, word)| {
                word.to_field()
                    .map_err(|source| CalldataError::InvalidPublicInput { position, source })
            })
            .collect()
    }
}

/// Partition exported calldata for the vote circuit (two public inputs)
pub fn format(calldata: &str) -> Result<SolidityCalldata, CalldataError> {
    format_with_inputs(calldata, PUBLIC_INPUT_COUNT)
}

/// Partition exported calldata text into `a`, `b`, `c` and `input`.
///
/// Quotes, brackets and whitespace are stripped and the rest split on commas.
/// The element count is checked before any word is parsed.
pub fn format_with_inputs(
    calldata: &str,
    public_inputs: usize,
) -> Result<SolidityCalldata, CalldataError> {
    let stripped: String = calldata
        .chars()
        .filter(|c| !matches!(c, '"' | '[' | ']') && !c.is_whitespace())
        .collect();
    let parts: Vec<&str> = stripped.split(',').collect();

    let expected = PROOF_ELEMENTS + public_inputs;
    if parts.len() != expected {
        return Err(CalldataError::MalformedProof {
            expected,
            actual: parts.len(),
        });
    }

    let words = parts
        .iter()
        .enumerate()
        .map(|(position, value)| {
            value.parse::<Word>().map_err(|source| CalldataError::InvalidWord {
                position,
                value: value.to_string(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SolidityCalldata {
        a: [words[0], words[1]],
        b: [[words[2], words[3]], [words[4], words[5]]],
        c: [words[6], words[7]],
        input: words[PROOF_ELEMENTS..].to_vec(),
    })
}
