//! Hash primitive seam
//!
//! The accumulator, commitment scheme and zero-value table only need a two-input
//! compression function and a variable-arity sponge over the scalar field. The
//! concrete permutation lives behind this trait so every party plugs in the same one.

use halo2_base::halo2_proofs::halo2curves::bn256::Fr;

/// Sponge-based hash over the BN254 scalar field.
pub trait HashPrimitive {
    /// Hash an arbitrary number of field elements (`hashN`).
    fn hash_n(&self, inputs: &[Fr]) -> Fr;

    /// Hash a node pair (`hash2`), non-commutative: `hash2(a, b) != hash2(b, a)`.
    fn hash2(&self, left: Fr, right: Fr) -> Fr {
        self.hash_n(&[left, right])
    }
}

impl<H: HashPrimitive + ?Sized> HashPrimitive for &H {
    fn hash_n(&self, inputs: &[Fr]) -> Fr {
        (**self).hash_n(inputs)
    }

    fn hash2(&self, left: Fr, right: Fr) -> Fr {
        (**self).hash2(left, right)
    }
}
