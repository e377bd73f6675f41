//! Checks an AMM side of a trade against its pricing curve and updates its
//! virtual balances
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use ark_ff::Zero;
use circuit_macros::circuit_type;
use circuit_types::{
    Amount, PlonkCircuit,
    errors::SpotTradeError,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_biguint_bitlength, validate_bitlength,
};
use constants::{FEE_DIVIDER, NUM_BITS_AMOUNT, NUM_BITS_BIPS, Scalar, ScalarField};
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};
use num_bigint::BigUint;
use trade_crypto::fields::{biguint_to_scalar, scalar_to_biguint};

use crate::zk_gadgets::{
    TradeGadget,
    bits::BitRangeGadget,
    comparators::{EqZeroGadget, GreaterThanEqGadget},
    select::CondSelectGadget,
};

/// The bit width of the two sides of the curve inequality
///
/// The left side is a 96 bit balance times a sum of two products of a 96 bit
/// value and a factor of at most 10^4 < 2^14
const CURVE_BITS: usize = 2 * NUM_BITS_AMOUNT + 16;

/// One side of a trade as seen by its account's pool
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AmmInput {
    /// Whether the side is placed by an AMM
    pub amm: bool,
    /// The trading fee charged by the order
    pub fee_bips: u64,
    /// The fee the account charges on AMM orders
    pub fee_bips_amm: u64,
    /// Whether the token sold is an NFT
    pub is_nft_token_s: bool,
    /// Whether the token bought is an NFT
    pub is_nft_token_b: bool,
    /// The amount sold
    pub fill_s: Amount,
    /// The amount bought
    pub fill_b: Amount,
    /// The virtual balance of the token sold before the trade
    pub virtual_balance_s: Scalar,
    /// The virtual balance of the token bought before the trade
    pub virtual_balance_b: Scalar,
    /// The weight of the sold token's slot if the side is not an AMM
    pub weight_s: Scalar,
    /// The weight of the bought token's slot if the side is not an AMM
    pub weight_b: Scalar,
}

/// The slot weights after the trade
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AmmWeights {
    /// The new weight of the sold token's slot
    pub weight_s: Scalar,
    /// The new weight of the bought token's slot
    pub weight_b: Scalar,
}

/// Enforces the constant product curve on AMM sides
///
/// With virtual balances `vS`, `vB` and `vS' = vS - fillS`, an AMM side must
/// satisfy `vS' * (vB * 10^4 + fillB * (10^4 - feeBips)) >= vS * vB * 10^4`.
/// Its new weights are `vS'` and `vB + fillB`. Sides not placed by an AMM pass
/// their weights through unchecked.
pub struct AmmGadget;
impl AmmGadget {
    /// Check the AMM preconditions natively
    fn check_preconditions(input: &AmmInput) -> Result<(BigUint, BigUint), SpotTradeError> {
        if input.fee_bips != input.fee_bips_amm {
            return Err(SpotTradeError::AmmFeeMismatch {
                order_fee_bips: input.fee_bips,
                amm_fee_bips: input.fee_bips_amm,
            });
        }

        if input.is_nft_token_s || input.is_nft_token_b {
            return Err(SpotTradeError::AmmInvariant("AMM orders cannot trade NFTs".to_string()));
        }

        let virtual_s = scalar_to_biguint(&input.virtual_balance_s);
        let virtual_b = scalar_to_biguint(&input.virtual_balance_b);
        validate_biguint_bitlength("virtual_balance_s", &virtual_s, NUM_BITS_AMOUNT)?;
        validate_biguint_bitlength("virtual_balance_b", &virtual_b, NUM_BITS_AMOUNT)?;
        if virtual_s.is_zero() || virtual_b.is_zero() {
            return Err(SpotTradeError::AmmInvariant("AMM has no liquidity".to_string()));
        }

        Ok((virtual_s, virtual_b))
    }

    /// Constrain the AMM preconditions when the side is an AMM
    fn constrain_preconditions(
        input: &AmmInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let fee_diff = cs.sub(input.fee_bips, input.fee_bips_amm)?;
        let amm_fee_diff = cs.mul(input.amm.into(), fee_diff)?;
        cs.enforce_constant(amm_fee_diff, ScalarField::zero())?;

        let amm_nft_s = cs.logic_and(input.amm, input.is_nft_token_s)?;
        let amm_nft_b = cs.logic_and(input.amm, input.is_nft_token_b)?;
        cs.enforce_false(amm_nft_s)?;
        cs.enforce_false(amm_nft_b)?;

        // The product of the virtual balances is nonzero on an AMM side
        let one = cs.one();
        let product = cs.mul(input.virtual_balance_s, input.virtual_balance_b)?;
        let liquidity = CondSelectGadget::select(&product, &one, input.amm, cs)?;
        EqZeroGadget::constrain_nonzero(&liquidity, cs)
    }
}

impl TradeGadget for AmmGadget {
    type Input = AmmInput;
    type Output = AmmWeights;

    fn evaluate(input: &AmmInput) -> Result<AmmWeights, SpotTradeError> {
        validate_bitlength("fee_bips", input.fee_bips as u128, NUM_BITS_BIPS)?;
        if !input.amm {
            return Ok(AmmWeights { weight_s: input.weight_s, weight_b: input.weight_b });
        }

        let (virtual_s, virtual_b) = Self::check_preconditions(input)?;
        if virtual_s < BigUint::from(input.fill_s) {
            return Err(SpotTradeError::AmmInvariant(format!(
                "fill of {} exceeds the virtual balance {virtual_s}",
                input.fill_s
            )));
        }

        let virtual_s_after = &virtual_s - BigUint::from(input.fill_s);
        let virtual_b_after = &virtual_b + BigUint::from(input.fill_b);
        validate_biguint_bitlength("virtual_balance_b", &virtual_b_after, NUM_BITS_AMOUNT)?;

        let divider = BigUint::from(FEE_DIVIDER);
        let fee_factor = FEE_DIVIDER - input.fee_bips;
        let received = &virtual_b * &divider + BigUint::from(input.fill_b) * fee_factor;
        let lhs = &virtual_s_after * received;
        let rhs = &virtual_s * &virtual_b * &divider;
        if lhs < rhs {
            return Err(SpotTradeError::AmmInvariant(format!(
                "selling {} for {} moves the pool below its curve",
                input.fill_s, input.fill_b
            )));
        }

        Ok(AmmWeights {
            weight_s: biguint_to_scalar(&virtual_s_after),
            weight_b: biguint_to_scalar(&virtual_b_after),
        })
    }

    fn constrain(
        input: &AmmInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<AmmWeightsVar, CircuitError> {
        BitRangeGadget::constrain_bit_range(input.fee_bips, NUM_BITS_BIPS, cs)?;
        Self::constrain_preconditions(input, cs)?;

        // Range checks apply to an AMM side's balances only, other sides carry
        // arbitrary weights
        let virtual_s = CondSelectGadget::select_or_zero(&input.virtual_balance_s, input.amm, cs)?;
        let virtual_b = CondSelectGadget::select_or_zero(&input.virtual_balance_b, input.amm, cs)?;
        let fill_s = CondSelectGadget::select_or_zero(&input.fill_s, input.amm, cs)?;
        let fill_b = CondSelectGadget::select_or_zero(&input.fill_b, input.amm, cs)?;

        let virtual_s_after = cs.sub(virtual_s, fill_s)?;
        let virtual_b_after = cs.add(virtual_b, fill_b)?;
        BitRangeGadget::constrain_bit_range(virtual_s, NUM_BITS_AMOUNT, cs)?;
        BitRangeGadget::constrain_bit_range(virtual_b, NUM_BITS_AMOUNT, cs)?;
        BitRangeGadget::constrain_bit_range(virtual_s_after, NUM_BITS_AMOUNT, cs)?;
        BitRangeGadget::constrain_bit_range(virtual_b_after, NUM_BITS_AMOUNT, cs)?;

        // vS' * (vB * 10^4 + fillB * (10^4 - feeBips)) >= vS * vB * 10^4
        let divider = ScalarField::from(FEE_DIVIDER);
        let one = cs.one();
        let zero = cs.zero();
        let fee_factor = cs.lc(
            &[one, input.fee_bips, zero, zero],
            &[divider, -ScalarField::from(1u64), ScalarField::zero(), ScalarField::zero()],
        )?;
        let scaled_b = cs.mul_constant(virtual_b, &divider)?;
        let fee_b = cs.mul(fill_b, fee_factor)?;
        let received = cs.add(scaled_b, fee_b)?;
        let lhs = cs.mul(virtual_s_after, received)?;
        let product = cs.mul(virtual_s, virtual_b)?;
        let rhs = cs.mul_constant(product, &divider)?;
        GreaterThanEqGadget::constrain_greater_than_eq(lhs, rhs, CURVE_BITS, cs)?;

        let weight_s = CondSelectGadget::select(&virtual_s_after, &input.weight_s, input.amm, cs)?;
        let weight_b = CondSelectGadget::select(&virtual_b_after, &input.weight_b, input.amm, cs)?;
        Ok(AmmWeightsVar { weight_s, weight_b })
    }
}

#[cfg(test)]
mod test {
    use circuit_types::{errors::SpotTradeError, test_helpers::random_scalar};
    use constants::Scalar;
    use eyre::Result;

    use super::{AmmGadget, AmmInput, AmmWeights};
    use crate::zk_gadgets::test_helpers::{assert_gadget_accepts, assert_gadget_rejects};

    /// A pool of 1000/1000 charging 30 bips, selling 50 for 55
    fn amm_input() -> AmmInput {
        AmmInput {
            amm: true,
            fee_bips: 30,
            fee_bips_amm: 30,
            fill_s: 50,
            fill_b: 55,
            virtual_balance_s: Scalar::from(1000u64),
            virtual_balance_b: Scalar::from(1000u64),
            ..Default::default()
        }
    }

    #[test]
    fn test_amm_trade() -> Result<()> {
        let weights = assert_gadget_accepts::<AmmGadget>(&amm_input())?;
        assert_eq!(
            weights,
            AmmWeights { weight_s: Scalar::from(950u64), weight_b: Scalar::from(1055u64) }
        );
        Ok(())
    }

    #[test]
    fn test_non_amm_pass_through() -> Result<()> {
        let input = AmmInput {
            amm: false,
            fee_bips: 20,
            is_nft_token_b: true,
            fill_s: 50,
            fill_b: 1,
            virtual_balance_s: random_scalar(),
            weight_s: random_scalar(),
            weight_b: random_scalar(),
            ..Default::default()
        };

        let weights = assert_gadget_accepts::<AmmGadget>(&input)?;
        assert_eq!(weights, AmmWeights { weight_s: input.weight_s, weight_b: input.weight_b });
        Ok(())
    }

    #[test]
    fn test_curve_violation() -> Result<()> {
        // 950 * (1000 * 10^4 + 52 * 9970) < 1000 * 1000 * 10^4
        let input = AmmInput { fill_b: 52, ..amm_input() };
        let err = assert_gadget_rejects::<AmmGadget>(&input)?;
        assert!(matches!(err, SpotTradeError::AmmInvariant(_)));
        Ok(())
    }

    #[test]
    fn test_amm_preconditions() -> Result<()> {
        let wrong_fee = AmmInput { fee_bips: 20, ..amm_input() };
        let err = assert_gadget_rejects::<AmmGadget>(&wrong_fee)?;
        assert_eq!(err, SpotTradeError::AmmFeeMismatch { order_fee_bips: 20, amm_fee_bips: 30 });

        let nft = AmmInput { is_nft_token_b: true, ..amm_input() };
        let err = assert_gadget_rejects::<AmmGadget>(&nft)?;
        assert!(matches!(err, SpotTradeError::AmmInvariant(_)));

        let empty =
            AmmInput { virtual_balance_b: Scalar::zero(), fill_s: 0, fill_b: 0, ..amm_input() };
        let err = assert_gadget_rejects::<AmmGadget>(&empty)?;
        assert!(matches!(err, SpotTradeError::AmmInvariant(_)));
        Ok(())
    }

    #[test]
    fn test_fill_exceeds_pool() -> Result<()> {
        let input = AmmInput { fill_s: 1001, fill_b: 1_000_000, ..amm_input() };
        let err = assert_gadget_rejects::<AmmGadget>(&input)?;
        assert!(matches!(err, SpotTradeError::AmmInvariant(_)));
        Ok(())
    }
}
