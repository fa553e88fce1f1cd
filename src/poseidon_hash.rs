// Poseidon Hash using Axiom halo2_base
// Production-proven: Axiom Mainnet V2, Trail of Bits audited (2023)
// Reference: https://github.com/axiom-crypto/halo2-lib
//
// Native (off-circuit) evaluation: the chip is driven in a keygen-stage builder and
// the assigned output value is read back, so tree building and credential generation
// use bit-for-bit the same permutation a halo2 circuit would constrain.

use halo2_base::{
    gates::{
        circuit::{builder::RangeCircuitBuilder, CircuitBuilderStage},
        GateInstructions, RangeInstructions,
    },
    halo2_proofs::halo2curves::bn256::Fr,
    poseidon::hasher::{spec::OptimizedPoseidonSpec, PoseidonHasher},
    utils::BigPrimeField,
    AssignedValue, Context,
};

use crate::hash::HashPrimitive;

// Poseidon parameters (aligned with Axiom standard)
pub const T: usize = 3; // State size
pub const RATE: usize = 2; // Absorption rate (inputs per permutation)
pub const R_F: usize = 8; // Full rounds
pub const R_P: usize = 57; // Partial rounds

/// Rows of the scratch builder; a single sponge call never comes close
const SCRATCH_K: usize = 10;
const LOOKUP_BITS: usize = 8;

/// Create a Poseidon hasher with its round constants loaded into `ctx`
pub fn create_poseidon_hasher<F: BigPrimeField>(
    ctx: &mut Context<F>,
    gate: &impl GateInstructions<F>,
) -> PoseidonHasher<F, T, RATE> {
    let mut poseidon =
        PoseidonHasher::<F, T, RATE>::new(OptimizedPoseidonSpec::new::<R_F, R_P, 0>());
    poseidon.initialize_consts(ctx, gate);
    poseidon
}

/// Hash already-assigned values (array length provides domain separation)
pub fn hash_assigned<F: BigPrimeField>(
    hasher: &PoseidonHasher<F, T, RATE>,
    ctx: &mut Context<F>,
    gate: &impl GateInstructions<F>,
    inputs: &[AssignedValue<F>],
) -> AssignedValue<F> {
    hasher.hash_fix_len_array(ctx, gate, inputs)
}

/// BN254 Poseidon (t=3, α=5, R_F=8, R_P=57) evaluated natively.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseidonHash;

impl HashPrimitive for PoseidonHash {
    fn hash_n(&self, inputs: &[Fr]) -> Fr {
        // Minimal builder just for hashing, no proving infrastructure
        let mut builder: RangeCircuitBuilder<Fr> =
            RangeCircuitBuilder::from_stage(CircuitBuilderStage::Keygen).use_k(SCRATCH_K);
        builder.set_lookup_bits(LOOKUP_BITS);

        let range = builder.range_chip();
        let gate = range.gate();
        let ctx = builder.main(0);

        let hasher = create_poseidon_hasher(ctx, gate);
        let assigned: Vec<_> = inputs.iter().map(|v| ctx.load_witness(*v)).collect();

        *hash_assigned(&hasher, ctx, gate, &assigned).value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_pair_noncommutative() {
        // Critical for Merkle tree security (can't swap siblings)
        let a = Fr::from(12345);
        let b = Fr::from(67890);

        assert_ne!(
            PoseidonHash.hash2(a, b),
            PoseidonHash.hash2(b, a),
            "Poseidon must be non-commutative for Merkle tree security"
        );
    }

    #[test]
    fn test_hash2_is_two_input_sponge() {
        let a = Fr::from(1);
        let b = Fr::from(2);
        assert_eq!(PoseidonHash.hash2(a, b), PoseidonHash.hash_n(&[a, b]));
    }

    #[test]
    fn test_hash_deterministic() {
        let left_val = Fr::from(123);
        let right_val = Fr::from(456);
        assert_eq!(
            PoseidonHash.hash2(left_val, right_val),
            PoseidonHash.hash2(left_val, right_val)
        );
    }

    #[test]
    fn test_arity_separates_domains() {
        // hash([x]) and hash([x, 0]) must not collide
        let x = Fr::from(42);
        assert_ne!(PoseidonHash.hash_n(&[x]), PoseidonHash.hash_n(&[x, Fr::from(0)]));
    }

    #[test]
    fn test_zero_inputs_nonzero() {
        let zero = Fr::from(0);
        assert_ne!(PoseidonHash.hash_n(&[zero]), zero, "Poseidon(0) must be non-zero");
        assert_ne!(PoseidonHash.hash2(zero, zero), zero, "Poseidon(0,0) must be non-zero");
    }
}
