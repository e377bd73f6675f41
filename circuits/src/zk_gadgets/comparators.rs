//! Groups gadgets that compare two values

use ark_ff::{Field, One, Zero};
use circuit_types::{PlonkCircuit, traits::CircuitVarType};
use constants::ScalarField;
use mpc_relation::{BoolVar, Variable, errors::CircuitError, traits::Circuit};

use super::bits::BitRangeGadget;

/// A gadget that returns whether a value is equal to zero
///
/// Its output is `Variable::one()` if the input is equal to zero, or
/// `Variable::zero()` if not
pub struct EqZeroGadget;
impl EqZeroGadget {
    /// Computes whether the given input is equal to zero
    ///
    /// Relies on the fact that modulo a prime field, all elements (except zero)
    /// have a valid multiplicative inverse
    pub fn eq_zero(val: &Variable, cs: &mut PlonkCircuit) -> Result<BoolVar, CircuitError> {
        // Compute the inverse of the value outside the constraint system
        let value = cs.witness(*val)?;
        let inverse = value.inverse().unwrap_or_else(Zero::zero);
        let inv_var = cs.create_variable(inverse)?;

        // is_zero = 1 - val * inv; if val is non-zero, val * is_zero = 0 forces
        // is_zero to zero, otherwise is_zero is one
        let one = cs.one();
        let product = cs.mul(*val, inv_var)?;
        let is_zero = cs.sub(one, product)?;

        let check = cs.mul(*val, is_zero)?;
        cs.enforce_constant(check, Zero::zero())?;

        Ok(BoolVar::new_unchecked(is_zero))
    }

    /// Constrain a value to be nonzero
    pub fn constrain_nonzero(val: &Variable, cs: &mut PlonkCircuit) -> Result<(), CircuitError> {
        let is_zero = Self::eq_zero(val, cs)?;
        cs.enforce_false(is_zero)
    }
}

/// Returns 1 if a == b otherwise 0
pub struct EqGadget;
impl EqGadget {
    /// Computes a == b
    pub fn eq<V: CircuitVarType>(
        a: &V,
        b: &V,
        cs: &mut PlonkCircuit,
    ) -> Result<BoolVar, CircuitError> {
        let mut result = cs.true_var();
        for (a_var, b_var) in a.to_vars().into_iter().zip(b.to_vars()) {
            let diff = cs.sub(a_var, b_var)?;
            let eq = EqZeroGadget::eq_zero(&diff, cs)?;
            result = cs.logic_and(result, eq)?;
        }

        Ok(result)
    }

    /// Constrain two values to be equal
    pub fn constrain_eq<V: CircuitVarType>(
        a: &V,
        b: &V,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        for (a_var, b_var) in a.to_vars().into_iter().zip(b.to_vars()) {
            cs.enforce_equal(a_var, b_var)?;
        }

        Ok(())
    }
}

/// Constrains two values to be unequal
pub struct NotEqualGadget;
impl NotEqualGadget {
    /// Constrain a != b
    pub fn constrain_not_equal(
        a: Variable,
        b: Variable,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let diff = cs.sub(a, b)?;
        EqZeroGadget::constrain_nonzero(&diff, cs)
    }
}

/// Constrains `a >= b` for values of a known bitlength
///
/// Both inputs must already be constrained to `bitlength` bits; the
/// difference is then range checked to the same width, which fails for
/// `a < b` as the difference wraps to a large field element
pub struct GreaterThanEqGadget;
impl GreaterThanEqGadget {
    /// Constrain a >= b
    pub fn constrain_greater_than_eq(
        a: Variable,
        b: Variable,
        bitlength: usize,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let diff = cs.sub(a, b)?;
        BitRangeGadget::constrain_bit_range(diff, bitlength, cs)
    }

    /// Constrain a < b
    pub fn constrain_less_than(
        a: Variable,
        b: Variable,
        bitlength: usize,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        // b - a - 1 >= 0
        let one = cs.one();
        let zero = cs.zero();
        let diff = cs.lc(
            &[b, a, one, zero],
            &[ScalarField::one(), -ScalarField::one(), -ScalarField::one(), ScalarField::zero()],
        )?;
        BitRangeGadget::constrain_bit_range(diff, bitlength, cs)
    }
}

#[cfg(test)]
mod test {
    use circuit_types::{PlonkCircuit, traits::CircuitBaseType};
    use constants::Scalar;
    use eyre::Result;
    use mpc_relation::traits::Circuit;
    use rand::{Rng, thread_rng};

    use super::{EqGadget, EqZeroGadget, GreaterThanEqGadget, NotEqualGadget};

    #[test]
    fn test_eq_zero() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let zero = Scalar::zero().create_witness(&mut cs)?;
        let random = Scalar::random(&mut thread_rng()).create_witness(&mut cs)?;

        let zero_is_zero = EqZeroGadget::eq_zero(&zero, &mut cs)?;
        let random_is_zero = EqZeroGadget::eq_zero(&random, &mut cs)?;
        cs.enforce_true(zero_is_zero)?;
        cs.enforce_false(random_is_zero)?;

        assert!(cs.check_circuit_satisfiability(&[]).is_ok());
        Ok(())
    }

    /// A prover cannot claim a nonzero value is zero
    #[test]
    fn test_constrain_nonzero() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let zero = Scalar::zero().create_witness(&mut cs)?;
        EqZeroGadget::constrain_nonzero(&zero, &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_eq_and_not_equal() -> Result<()> {
        let mut rng = thread_rng();
        let a: [u64; 2] = [rng.r#gen(), rng.r#gen()];
        let b = [a[0], a[1].wrapping_add(1)];

        let mut cs = PlonkCircuit::new_turbo_plonk();
        let a_var = a.create_witness(&mut cs)?;
        let b_var = b.create_witness(&mut cs)?;

        let a_eq_a = EqGadget::eq(&a_var, &a_var, &mut cs)?;
        let a_eq_b = EqGadget::eq(&a_var, &b_var, &mut cs)?;
        cs.enforce_true(a_eq_a)?;
        cs.enforce_false(a_eq_b)?;
        NotEqualGadget::constrain_not_equal(a_var[1], b_var[1], &mut cs)?;
        EqGadget::constrain_eq(&a_var[0], &b_var[0], &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_ok());

        NotEqualGadget::constrain_not_equal(a_var[0], b_var[0], &mut cs)?;
        assert!(cs.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_greater_than_eq() -> Result<()> {
        let check = |a: u64, b: u64| -> Result<bool> {
            let mut cs = PlonkCircuit::new_turbo_plonk();
            let a_var = a.create_witness(&mut cs)?;
            let b_var = b.create_witness(&mut cs)?;
            GreaterThanEqGadget::constrain_greater_than_eq(a_var, b_var, 32, &mut cs)?;
            Ok(cs.check_circuit_satisfiability(&[]).is_ok())
        };

        assert!(check(10, 10)?);
        assert!(check(11, 10)?);
        assert!(!check(9, 10)?);
        Ok(())
    }

    #[test]
    fn test_less_than() -> Result<()> {
        let check = |a: u64, b: u64| -> Result<bool> {
            let mut cs = PlonkCircuit::new_turbo_plonk();
            let a_var = a.create_witness(&mut cs)?;
            let b_var = b.create_witness(&mut cs)?;
            GreaterThanEqGadget::constrain_less_than(a_var, b_var, 32, &mut cs)?;
            Ok(cs.check_circuit_satisfiability(&[]).is_ok())
        };

        assert!(check(9, 10)?);
        assert!(!check(10, 10)?);
        assert!(!check(11, 10)?);
        Ok(())
    }
}
