//! Field element encodings
//!
//! Every hash input, tree node and public signal is a BN254 scalar field element.
//! Externally they travel as decimal strings (prover JSON), `0x` hex (bytes32 event
//! fields) or fixed-width 32-byte big-endian words (verifier calldata). All three
//! encodings must round-trip to the identical integer.

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use num_bigint::BigUint;

use crate::error::FieldError;

/// Scalar field element of the proving system (BN254 `Fr`)
pub type FieldElement = Fr;

/// Convert hex string to field element
///
/// Accepts strings with or without a "0x"/"0X" prefix, up to 32 bytes, big-endian.
/// Values at or above the field modulus are rejected rather than reduced.
pub fn field_from_hex(hex: &str) -> Result<Fr, FieldError> {
    field_from_be_bytes(&hex_to_be_bytes(hex)?)
}

/// Convert field element to a 32-byte big-endian hex string with "0x" prefix
pub fn field_to_hex(field: &Fr) -> String {
    format!("0x{}", hex::encode(field_to_be_bytes(field)))
}

/// Parse a canonical decimal string
pub fn field_from_decimal(decimal: &str) -> Result<Fr, FieldError> {
    field_from_be_bytes(&decimal_to_be_bytes(decimal)?)
}

/// Render a field element as a decimal string
pub fn field_to_decimal(field: &Fr) -> String {
    be_bytes_to_decimal(&field_to_be_bytes(field))
}

/// Decode a fixed-width big-endian word
pub fn field_from_be_bytes(bytes: &[u8; 32]) -> Result<Fr, FieldError> {
    // Fr::from_bytes expects LITTLE-ENDIAN
    let mut le = *bytes;
    le.reverse();

    Fr::from_bytes(&le)
        .into_option()
        .ok_or_else(|| FieldError::OutOfRange(format!("0x{}", hex::encode(bytes))))
}

/// Encode a field element as a fixed-width big-endian word
pub fn field_to_be_bytes(field: &Fr) -> [u8; 32] {
    // Fr::to_bytes() returns LITTLE-ENDIAN
    let mut be = field.to_bytes();
    be.reverse();
    be
}

/// Parse an unsigned hex integer (optional "0x"/"0X", odd length allowed) into 32 big-endian bytes.
pub(crate) fn hex_to_be_bytes(value: &str) -> Result<[u8; 32], FieldError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    if digits.is_empty() {
        return Err(FieldError::InvalidHex {
            value: value.to_string(),
            reason: "no digits".to_string(),
        });
    }

    let padded;
    let digits = if digits.len() % 2 == 1 {
        padded = format!("0{digits}");
        padded.as_str()
    } else {
        digits
    };

    let bytes = hex::decode(digits).map_err(|e| FieldError::InvalidHex {
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    // Leading zero bytes do not count towards the width
    let significant = bytes.iter().skip_while(|b| **b == 0).count();
    if significant > 32 {
        return Err(FieldError::TooLong(value.to_string()));
    }

    let mut out = [0u8; 32];
    out[32 - significant..].copy_from_slice(&bytes[bytes.len() - significant..]);
    Ok(out)
}

/// Parse an unsigned decimal integer into 32 big-endian bytes.
pub(crate) fn decimal_to_be_bytes(value: &str) -> Result<[u8; 32], FieldError> {
    // parse_bytes alone would accept '_' separators
    if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FieldError::InvalidDecimal(value.to_string()));
    }
    let big = BigUint::parse_bytes(value.as_bytes(), 10)
        .ok_or_else(|| FieldError::InvalidDecimal(value.to_string()))?;

    let bytes = big.to_bytes_be();
    if bytes.len() > 32 {
        return Err(FieldError::TooLong(value.to_string()));
    }

    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

/// Render 32 big-endian bytes as an unsigned decimal integer.
pub(crate) fn be_bytes_to_decimal(bytes: &[u8; 32]) -> String {
    BigUint::from_bytes_be(bytes).to_str_radix(10)
}

/// Serde adapter: field element as a decimal string
pub mod serde_decimal {
    use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::field_to_decimal(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::field_from_decimal(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter: sequence of field elements as decimal strings
pub mod serde_decimal_vec {
    use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(values: &[Fr], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(values.iter().map(super::field_to_decimal))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Fr>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|s| super::field_from_decimal(s).map_err(serde::de::Error::custom))
            .collect()
    }
}

/// Serde adapter: field element as bytes32 hex
pub mod serde_hex {
    use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Fr, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&super::field_to_hex(value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Fr, D::Error> {
        let s = String::deserialize(deserializer)?;
        super::field_from_hex(&s).map_err(serde::de::Error::custom)
    }
}
