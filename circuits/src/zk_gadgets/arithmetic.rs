//! Groups gadgets for integer arithmetic over the field

use ark_ff::{One, Zero};
use circuit_types::{PlonkCircuit, traits::CircuitVarType};
use constants::ScalarField;
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};
use num_bigint::BigUint;
use trade_crypto::fields::{biguint_to_field, scalar_to_biguint};

use super::bits::BitRangeGadget;

/// The number of bits needed to represent values below `bound`
fn bits_below(bound: u64) -> usize {
    (u64::BITS - bound.saturating_sub(1).leading_zeros()) as usize
}

/// Integer division by a constant divisor
pub struct DivRemGadget;
impl DivRemGadget {
    /// Computes the quotient and remainder of `a` by `divisor`
    ///
    /// The quotient is range checked to `quotient_bits` bits and the remainder
    /// to `[0, divisor)`, which together pin down the division uniquely as
    /// long as `quotient * divisor` does not wrap the field
    pub fn div_rem(
        a: Variable,
        divisor: u64,
        quotient_bits: usize,
        cs: &mut PlonkCircuit,
    ) -> Result<(Variable, Variable), CircuitError> {
        let a_bigint = scalar_to_biguint(&a.eval(cs)?);
        let divisor_bigint = BigUint::from(divisor);
        let q = cs.create_variable(biguint_to_field(&(&a_bigint / &divisor_bigint)))?;
        let r = cs.create_variable(biguint_to_field(&(&a_bigint % &divisor_bigint)))?;

        // a = q * divisor + r
        let zero = cs.zero();
        let recomposed = cs.lc(
            &[q, r, zero, zero],
            &[
                ScalarField::from(divisor),
                ScalarField::one(),
                ScalarField::zero(),
                ScalarField::zero(),
            ],
        )?;
        cs.enforce_equal(recomposed, a)?;
        BitRangeGadget::constrain_bit_range(q, quotient_bits, cs)?;

        // 0 <= r and divisor - 1 - r >= 0
        let rem_bits = bits_below(divisor);
        BitRangeGadget::constrain_bit_range(r, rem_bits, cs)?;
        let one = cs.one();
        let slack = cs.lc(
            &[one, r, zero, zero],
            &[
                ScalarField::from(divisor - 1),
                -ScalarField::one(),
                ScalarField::zero(),
                ScalarField::zero(),
            ],
        )?;
        BitRangeGadget::constrain_bit_range(slack, rem_bits, cs)?;

        Ok((q, r))
    }
}

/// Computes `floor(a * b / divisor)` for a constant divisor
pub struct MulDivGadget;
impl MulDivGadget {
    /// Multiply two values and divide the product by a constant, rounding down
    pub fn mul_div(
        a: Variable,
        b: Variable,
        divisor: u64,
        quotient_bits: usize,
        cs: &mut PlonkCircuit,
    ) -> Result<Variable, CircuitError> {
        let product = cs.mul(a, b)?;
        let (quotient, _) = DivRemGadget::div_rem(product, divisor, quotient_bits, cs)?;
        Ok(quotient)
    }
}

#[cfg(test)]
mod arithmetic_test {
    use circuit_types::{PlonkCircuit, traits::CircuitBaseType};
    use constants::Scalar;
    use eyre::Result;
    use mpc_relation::traits::Circuit;
    use rand::{Rng, thread_rng};

    use super::{DivRemGadget, MulDivGadget, bits_below};

    #[test]
    fn test_bits_below() {
        assert_eq!(bits_below(1), 0);
        assert_eq!(bits_below(2), 1);
        assert_eq!(bits_below(10_000), 14);
        assert_eq!(bits_below(1 << 14), 14);
    }

    /// Test the div rem gadget against native division
    #[test]
    fn test_div_rem() -> Result<()> {
        let mut rng = thread_rng();
        let a: u128 = rng.gen_range(0..1 << 100);
        let divisor = 10_000u64;

        let mut cs = PlonkCircuit::new_turbo_plonk();
        let a_var = a.create_witness(&mut cs)?;
        let (q, r) = DivRemGadget::div_rem(a_var, divisor, 96, &mut cs)?;

        assert_eq!(cs.witness(q)?, Scalar::from(a / divisor as u128).inner());
        assert_eq!(cs.witness(r)?, Scalar::from(a % divisor as u128).inner());
        assert!(cs.check_circuit_satisfiability(&[]).is_ok());
        Ok(())
    }

    /// A quotient wider than its bound is rejected
    #[test]
    fn test_div_rem_quotient_overflow() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let a_var = (10u128 << 96).create_witness(&mut cs)?;
        DivRemGadget::div_rem(a_var, 10, 96, &mut cs)?;

        assert!(cs.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }

    #[test]
    fn test_mul_div() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let amount = 12_345u128.create_witness(&mut cs)?;
        let bips = 25u64.create_witness(&mut cs)?;
        let fee = MulDivGadget::mul_div(amount, bips, 10_000, 96, &mut cs)?;

        assert_eq!(cs.witness(fee)?, Scalar::from(30u64).inner());
        assert!(cs.check_circuit_satisfiability(&[]).is_ok());
        Ok(())
    }
}
