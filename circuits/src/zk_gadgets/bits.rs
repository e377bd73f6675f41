//! Groups gadgets for going from scalar -> bits and from bits -> scalar
//!
//! A decomposition constrains every bit to be binary and the bits to
//! recompose to the input, so decomposing into `n` bits doubles as a range
//! check of the input to `[0, 2^n)`

use ark_ff::One;
use circuit_types::{PlonkCircuit, traits::CircuitVarType};
use constants::{Scalar, ScalarField};
use itertools::Itertools;
use mpc_relation::{BoolVar, Variable, errors::CircuitError, traits::Circuit};
use trade_crypto::fields::scalar_to_bits_le;

/// The little endian coefficients `2^i` of a bit recomposition
fn powers_of_two(n: usize) -> Vec<ScalarField> {
    let two = ScalarField::from(2u64);
    (0..n)
        .scan(ScalarField::one(), |state, _| {
            let res = *state;
            *state *= two;
            Some(res)
        })
        .collect_vec()
}

/// Decompose a value into `num_bits` constrained little endian bits
pub fn decompose(
    a: Variable,
    num_bits: usize,
    cs: &mut PlonkCircuit,
) -> Result<Vec<BoolVar>, CircuitError> {
    // Allocate the bits of the value's witness; a value out of range
    // truncates here and fails the recomposition below
    let a_scalar = a.eval(cs)?;
    let bit_vars = scalar_to_bits_le(&a_scalar, num_bits)
        .into_iter()
        .map(|bit| cs.create_boolean_variable(Scalar::from(bit as u64).inner()))
        .collect::<Result<Vec<_>, _>>()?;

    let reconstructed = bit_reconstruct(&bit_vars, cs)?;
    cs.enforce_equal(reconstructed, a)?;

    Ok(bit_vars)
}

/// Reconstruct a value from its little endian bits
pub fn bit_reconstruct(bits: &[BoolVar], cs: &mut PlonkCircuit) -> Result<Variable, CircuitError> {
    if bits.is_empty() {
        return Ok(cs.zero());
    }

    let bit_vars = bits.iter().map(|&b| Variable::from(b)).collect_vec();
    cs.lc_sum(&bit_vars, &powers_of_two(bits.len()))
}

/// Reconstruct a value from its big endian bits
pub fn bit_reconstruct_be(
    bits: &[BoolVar],
    cs: &mut PlonkCircuit,
) -> Result<Variable, CircuitError> {
    let le_bits = bits.iter().rev().copied().collect_vec();
    bit_reconstruct(&le_bits, cs)
}

/// Singleprover implementation of the `ToBits` gadget
///
/// `D` is the bitlength of the decomposition
pub struct ToBitsGadget<const D: usize>;
impl<const D: usize> ToBitsGadget<D> {
    /// Converts a value to its bitwise representation in a single-prover
    /// constraint system
    pub fn to_bits(a: Variable, cs: &mut PlonkCircuit) -> Result<Vec<BoolVar>, CircuitError> {
        decompose(a, D, cs)
    }

    /// Decompose and reconstruct a value to and from its bitwise
    /// representation with a fixed bitlength
    pub fn decompose_and_reconstruct(
        a: Variable,
        cs: &mut PlonkCircuit,
    ) -> Result<Variable, CircuitError> {
        let bits = Self::to_bits(a, cs)?;
        bit_reconstruct(&bits, cs)
    }
}

/// Constrains values to a number of bits
pub struct BitRangeGadget;
impl BitRangeGadget {
    /// Constrain a value to lie in `[0, 2^num_bits)`
    pub fn constrain_bit_range(
        a: Variable,
        num_bits: usize,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        decompose(a, num_bits, cs).map(|_| ())
    }

    /// Constrain a value to be binary
    pub fn constrain_binary(a: Variable, cs: &mut PlonkCircuit) -> Result<(), CircuitError> {
        let square = cs.mul(a, a)?;
        cs.enforce_equal(square, a)
    }
}

#[cfg(test)]
mod bits_test {
    use circuit_types::{PlonkCircuit, traits::CircuitBaseType};
    use constants::Scalar;
    use eyre::Result;
    use itertools::Itertools;
    use mpc_relation::traits::Circuit;
    use rand::{Rng, thread_rng};

    use super::{BitRangeGadget, ToBitsGadget, bit_reconstruct_be};

    /// Test the to bits gadget on random values
    #[test]
    fn test_to_bits() -> Result<()> {
        let mut rng = thread_rng();
        let value: u64 = rng.r#gen();

        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = value.create_witness(&mut cs)?;
        let bits = ToBitsGadget::<64>::to_bits(var, &mut cs)?;

        let bit_values = bits.iter().map(|b| cs.witness((*b).into()).unwrap()).collect_vec();
        for (i, bit) in bit_values.into_iter().enumerate() {
            assert_eq!(bit, Scalar::from((value >> i) & 1).inner());
        }

        let reconstructed = ToBitsGadget::<64>::decompose_and_reconstruct(var, &mut cs)?;
        cs.enforce_equal(reconstructed, var)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_ok());
        Ok(())
    }

    /// A value wider than the decomposition is rejected
    #[test]
    fn test_range_check() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = ((1u128 << 96) - 1).create_witness(&mut cs)?;
        BitRangeGadget::constrain_bit_range(var, 96, &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_ok());

        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = (1u128 << 96).create_witness(&mut cs)?;
        BitRangeGadget::constrain_bit_range(var, 96, &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_err());

        // A negative value is a large field element
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = (-Scalar::one()).create_witness(&mut cs)?;
        BitRangeGadget::constrain_bit_range(var, 96, &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_binary() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = Scalar::one().create_witness(&mut cs)?;
        BitRangeGadget::constrain_binary(var, &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_ok());

        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = Scalar::from(2u64).create_witness(&mut cs)?;
        BitRangeGadget::constrain_binary(var, &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_big_endian_reconstruct() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = 0b1101u64.create_witness(&mut cs)?;
        let bits = ToBitsGadget::<4>::to_bits(var, &mut cs)?;

        // Reading the bits most significant first reverses the value's bits
        let reversed = bit_reconstruct_be(&bits, &mut cs)?;
        assert_eq!(cs.witness(reversed)?, Scalar::from(0b1011u64).inner());
        Ok(())
    }
}
