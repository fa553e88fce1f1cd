// Merkle Accumulator over the commitment log
// Fixed-depth binary tree, rebuilt in full from the ordered leaf list on every query.
// Absent right siblings are padded with the empty-subtree hash of their depth.

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::MerkleTreeError;
use crate::field::{serde_decimal, serde_decimal_vec};
use crate::hash::HashPrimitive;
use crate::zero_values::{validate_levels, ZeroValueTable};

/// Authentication path of one leaf plus the root it reproduces.
///
/// `path_indices[d] == 0` means the node on the path is the left child at depth `d`
/// (its sibling `path_elements[d]` is on the right), `1` means the reverse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerkleProof {
    #[serde(with = "serde_decimal")]
    pub root: Fr,
    #[serde(with = "serde_decimal_vec")]
    pub path_elements: Vec<Fr>,
    pub path_indices: Vec<u8>,
}

impl MerkleProof {
    /// Replay the path from `leaf` and compare with `root`.
    ///
    /// The depth is taken from the path itself. A root-only proof (no target leaf was
    /// requested) fails with [`MerkleTreeError::EmptyPath`].
    pub fn verify<H: HashPrimitive>(&self, hasher: &H, leaf: Fr) -> Result<bool, MerkleTreeError> {
        let levels = self.path_elements.len();
        if levels == 0 {
            return Err(MerkleTreeError::EmptyPath);
        }
        let computed = verify_path(hasher, leaf, &self.path_elements, &self.path_indices, levels)?;
        Ok(computed == self.root)
    }
}

/// Full tree materialized from a leaf list.
///
/// `layers[0]` are the leaves in insertion order, `layers[k]` holds
/// `ceil(len(layers[k-1]) / 2)` parents. The tree is transient: build one per query.
#[derive(Debug, Clone)]
pub struct MerkleTree<'z> {
    zeros: &'z ZeroValueTable,
    layers: Vec<Vec<Fr>>,
}

impl<'z> MerkleTree<'z> {
    /// Build every layer bottom-up.
    ///
    /// Fails with `TreeFull` when `leaves.len() > 2^levels`.
    pub fn build<H: HashPrimitive>(
        hasher: &H,
        leaves: &[Fr],
        zeros: &'z ZeroValueTable,
    ) -> Result<Self, MerkleTreeError> {
        let levels = zeros.levels();
        validate_levels(levels)?;

        let capacity = 1usize << levels;
        if leaves.len() > capacity {
            return Err(MerkleTreeError::TreeFull {
                leaves: leaves.len(),
                capacity,
                levels,
            });
        }

        let mut layers = Vec::with_capacity(levels + 1);
        layers.push(leaves.to_vec());

        for level in 1..=levels {
            let below = &layers[level - 1];
            let parents = below
                .chunks(2)
                .map(|pair| {
                    let right = pair.get(1).copied().unwrap_or(zeros[level - 1]);
                    hasher.hash2(pair[0], right)
                })
                .collect();
            layers.push(parents);
        }

        debug!(leaves = leaves.len(), levels, "built commitment tree");
        Ok(Self { zeros, layers })
    }

    pub fn levels(&self) -> usize {
        self.layers.len() - 1
    }

    pub fn leaves(&self) -> &[Fr] {
        &self.layers[0]
    }

    pub fn layer(&self, level: usize) -> Option<&[Fr]> {
        self.layers.get(level).map(Vec::as_slice)
    }

    /// Root of the tree.
    ///
    /// An empty tree has no node at full depth and falls back to `zeros[levels - 1]`,
    /// one level *below* the all-empty root. The paired on-chain verifier expects
    /// exactly this value, so it is kept as is.
    pub fn root(&self) -> Fr {
        let levels = self.levels();
        match self.layers[levels].first() {
            Some(root) => *root,
            None => self.zeros[levels - 1],
        }
    }

    /// Position of the first leaf equal to `target`.
    pub fn index_of(&self, target: Fr) -> Option<usize> {
        self.leaves().iter().position(|leaf| *leaf == target)
    }

    /// Authentication path of the first leaf equal to `target`.
    pub fn path_to(&self, target: Fr) -> Result<MerkleProof, MerkleTreeError> {
        let index = self.index_of(target).ok_or_else(|| {
            warn!(leaves = self.leaves().len(), "target commitment absent from the log");
            MerkleTreeError::LeafNotFound {
                leaf: target,
                leaves: self.leaves().len(),
            }
        })?;
        self.path_at(index)
    }

    /// Authentication path of the leaf at `index`.
    pub fn path_at(&self, index: usize) -> Result<MerkleProof, MerkleTreeError> {
        if index >= self.leaves().len() {
            return Err(MerkleTreeError::LeafIndexOutOfRange {
                index,
                leaves: self.leaves().len(),
            });
        }
        debug!(leaf_index = index, "extracting authentication path");

        let levels = self.levels();
        let mut path_elements = Vec::with_capacity(levels);
        let mut path_indices = Vec::with_capacity(levels);

        let mut current = index;
        for level in 0..levels {
            path_indices.push((current % 2) as u8);
            let sibling = self.layers[level]
                .get(current ^ 1)
                .copied()
                .unwrap_or(self.zeros[level]);
            path_elements.push(sibling);
            current >>= 1;
        }

        Ok(MerkleProof {
            root: self.root(),
            path_elements,
            path_indices,
        })
    }
}

/// Compute the root of `leaves` and, when `target` is given, the path to its first occurrence.
///
/// Without a target the returned proof carries empty path vectors.
pub fn compute_root_and_path<H: HashPrimitive>(
    hasher: &H,
    leaves: &[Fr],
    levels: usize,
    target: Option<Fr>,
) -> Result<MerkleProof, MerkleTreeError> {
    let zeros = ZeroValueTable::build(hasher, levels)?;
    compute_root_and_path_with_zeros(hasher, leaves, &zeros, target)
}

/// Same as [`compute_root_and_path`] with a caller-provided zero table.
pub fn compute_root_and_path_with_zeros<H: HashPrimitive>(
    hasher: &H,
    leaves: &[Fr],
    zeros: &ZeroValueTable,
    target: Option<Fr>,
) -> Result<MerkleProof, MerkleTreeError> {
    let tree = MerkleTree::build(hasher, leaves, zeros)?;
    match target {
        Some(target) => tree.path_to(target),
        None => Ok(MerkleProof {
            root: tree.root(),
            path_elements: Vec::new(),
            path_indices: Vec::new(),
        }),
    }
}

/// Recompute the root from a leaf and a caller-supplied path.
///
/// Does not compare against any expected root and never touches a tree, so it can
/// replay arbitrary (including tampered) paths. Exactly `levels` steps are taken.
pub fn verify_path<H: HashPrimitive>(
    hasher: &H,
    leaf: Fr,
    path_elements: &[Fr],
    path_indices: &[u8],
    levels: usize,
) -> Result<Fr, MerkleTreeError> {
    if levels == 0 {
        return Err(MerkleTreeError::InvalidDepth {
            levels,
            max: crate::zero_values::TREE_LEVELS,
        });
    }
    if path_elements.len() < levels || path_indices.len() < levels {
        return Err(MerkleTreeError::PathLengthMismatch {
            elements: path_elements.len(),
            indices: path_indices.len(),
            levels,
        });
    }

    let mut current_hash = leaf;
    for (depth, (sibling, index)) in path_elements
        .iter()
        .zip(path_indices)
        .take(levels)
        .enumerate()
    {
        current_hash = match index {
            0 => hasher.hash2(current_hash, *sibling),
            1 => hasher.hash2(*sibling, current_hash),
            value => {
                return Err(MerkleTreeError::InvalidPathIndex {
                    depth,
                    value: *value,
                })
            }
        };
    }

    Ok(current_hash)
}
