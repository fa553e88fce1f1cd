//! Empty-subtree hashes per depth.

use std::ops::Index;

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use tracing::debug;

use crate::error::MerkleTreeError;
use crate::field::field_from_decimal;
use crate::hash::HashPrimitive;

/// Depth of the deployed membership circuit.
pub const TREE_LEVELS: usize = 20;

/// Empty leaf, `keccak256("tornado") % FIELD_SIZE`.
pub const ZERO_VALUE_DECIMAL: &str =
    "21663839004416932945382355908790599225266501822907911457504978515578255421292";

/// The empty-leaf constant as a field element.
pub fn zero_value() -> Fr {
    // Below the modulus, checked by `test_zero_value_constant`
    field_from_decimal(ZERO_VALUE_DECIMAL).unwrap_or_else(|_| unreachable!("constant is canonical"))
}

/// Check `1 <= levels <= TREE_LEVELS`.
pub fn validate_levels(levels: usize) -> Result<(), MerkleTreeError> {
    if levels == 0 || levels > TREE_LEVELS {
        return Err(MerkleTreeError::InvalidDepth {
            levels,
            max: TREE_LEVELS,
        });
    }
    Ok(())
}

/// `zeros[0]` is the empty leaf and `zeros[i] = hash2(zeros[i-1], zeros[i-1])`,
/// i.e. the root of an all-empty subtree of height `i`. Holds `levels + 1` entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ZeroValueTable {
    zeros: Vec<Fr>,
}

impl ZeroValueTable {
    /// Build the table seeded with [`ZERO_VALUE_DECIMAL`].
    pub fn build<H: HashPrimitive>(hasher: &H, levels: usize) -> Result<Self, MerkleTreeError> {
        Self::build_with_seed(hasher, levels, zero_value())
    }

    /// Build the table from a deployment-specific empty leaf.
    pub fn build_with_seed<H: HashPrimitive>(
        hasher: &H,
        levels: usize,
        zero_value: Fr,
    ) -> Result<Self, MerkleTreeError> {
        validate_levels(levels)?;

        let mut zeros = Vec::with_capacity(levels + 1);
        zeros.push(zero_value);
        for i in 1..=levels {
            let below = zeros[i - 1];
            zeros.push(hasher.hash2(below, below));
        }
        debug!(levels, "built zero value table");

        Ok(Self { zeros })
    }

    /// Tree depth the table was built for.
    pub fn levels(&self) -> usize {
        self.zeros.len() - 1
    }

    pub fn get(&self, depth: usize) -> Option<&Fr> {
        self.zeros.get(depth)
    }

    pub fn as_slice(&self) -> &[Fr] {
        &self.zeros
    }
}

impl Index<usize> for ZeroValueTable {
    type Output = Fr;

    fn index(&self, depth: usize) -> &Fr {
        &self.zeros[depth]
    }
}
