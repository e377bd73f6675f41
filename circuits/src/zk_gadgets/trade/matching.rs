//! Checks a fill against an order's price, remaining amount, validity window
//! and taker restriction
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use ark_ff::Zero;
use circuit_macros::circuit_type;
use circuit_types::{
    Amount, PlonkCircuit,
    errors::SpotTradeError,
    order::Order,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_bitlength,
};
use constants::{
    NUM_BITS_AMOUNT, NUM_BITS_FLOAT24_ROUNDING, NUM_BITS_TIMESTAMP, Scalar, ScalarField,
};
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};
use num_bigint::BigUint;

use crate::zk_gadgets::{
    TradeGadget,
    bits::BitRangeGadget,
    comparators::{EqZeroGadget, GreaterThanEqGadget},
    select::CondSelectGadget,
};

/// The bit width of the fill rate products
///
/// The bought side multiplies an amount by a fill plus its rounding, which
/// stays below `2^(NUM_BITS_FLOAT24_ROUNDING + 1)`
const FILL_RATE_BITS: usize = NUM_BITS_AMOUNT + NUM_BITS_FLOAT24_ROUNDING + 1;

/// A fill of an order and the state it is checked against
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderMatchInput {
    /// The order filled
    pub order: Order,
    /// The amount the order sells in the trade
    pub fill_s: Amount,
    /// The amount the order buys in the trade
    pub fill_b: Amount,
    /// The most the encoding of `fill_b` may have rounded off
    pub fill_b_rounding: Amount,
    /// The amount filled before the trade
    pub filled: Amount,
    /// The block timestamp
    pub timestamp: u64,
    /// The owner of the counterparty's account
    pub counterparty: BigUint,
}

/// Checks a single order's side of a trade and returns the order's filled
/// amount after the trade
///
/// The order and fills must already be range checked
pub struct OrderMatchingGadget;
impl OrderMatchingGadget {
    /// Constrain the fill to be no worse than the order's price, up to what
    /// the encoding of the bought fill rounded off, and the fills to be zero
    /// together
    fn constrain_fill_rate(
        input: &OrderMatchInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let order = &input.order;
        BitRangeGadget::constrain_bit_range(
            input.fill_b_rounding,
            NUM_BITS_FLOAT24_ROUNDING,
            cs,
        )?;

        // fill_s * amount_b <= (fill_b + fill_b_rounding) * amount_s
        let sell_product = cs.mul(input.fill_s, order.amount_b)?;
        let max_fill_b = cs.add(input.fill_b, input.fill_b_rounding)?;
        let buy_product = cs.mul(max_fill_b, order.amount_s)?;
        GreaterThanEqGadget::constrain_greater_than_eq(
            buy_product,
            sell_product,
            FILL_RATE_BITS,
            cs,
        )?;

        let fill_s_zero = EqZeroGadget::eq_zero(&input.fill_s, cs)?;
        let fill_b_zero = EqZeroGadget::eq_zero(&input.fill_b, cs)?;
        cs.enforce_equal(fill_s_zero.into(), fill_b_zero.into())
    }

    /// Constrain the timestamp to lie in the order's validity window and the
    /// counterparty to be the order's taker, if it names one
    fn constrain_counterparty(
        input: &OrderMatchInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let order = &input.order;
        GreaterThanEqGadget::constrain_greater_than_eq(
            input.timestamp,
            order.valid_since,
            NUM_BITS_TIMESTAMP,
            cs,
        )?;
        GreaterThanEqGadget::constrain_less_than(
            input.timestamp,
            order.valid_until,
            NUM_BITS_TIMESTAMP,
            cs,
        )?;

        // taker * (taker - counterparty) == 0
        let diff = cs.sub(order.taker, input.counterparty)?;
        let product = cs.mul(order.taker, diff)?;
        cs.enforce_constant(product, ScalarField::zero())
    }

    /// Check the fill rate natively
    fn check_fill_rate(input: &OrderMatchInput) -> Result<(), SpotTradeError> {
        let order = &input.order;
        validate_bitlength("fill_b_rounding", input.fill_b_rounding, NUM_BITS_FLOAT24_ROUNDING)?;

        let sell_product = BigUint::from(input.fill_s) * order.amount_b;
        let max_fill_b = BigUint::from(input.fill_b) + input.fill_b_rounding;
        if sell_product > max_fill_b * order.amount_s {
            return Err(SpotTradeError::InvalidFillRate {
                fill_s: input.fill_s,
                fill_b: input.fill_b,
            });
        }

        if (input.fill_s == 0) != (input.fill_b == 0) {
            return Err(SpotTradeError::FillMismatch(format!(
                "fills of {} sold and {} bought must be zero together",
                input.fill_s, input.fill_b
            )));
        }

        Ok(())
    }

    /// Check the validity window and taker natively
    fn check_counterparty(input: &OrderMatchInput) -> Result<(), SpotTradeError> {
        let order = &input.order;
        if input.timestamp < order.valid_since {
            return Err(SpotTradeError::OrderNotYetValid {
                valid_since: order.valid_since,
                timestamp: input.timestamp,
            });
        }

        if input.timestamp >= order.valid_until {
            return Err(SpotTradeError::OrderExpired {
                valid_until: order.valid_until,
                timestamp: input.timestamp,
            });
        }

        if !order.taker.is_zero() && order.taker != input.counterparty {
            return Err(SpotTradeError::InvalidTaker {
                taker: order.taker.clone(),
                counterparty: input.counterparty.clone(),
            });
        }

        Ok(())
    }
}

impl TradeGadget for OrderMatchingGadget {
    type Input = OrderMatchInput;
    type Output = Amount;

    fn evaluate(input: &OrderMatchInput) -> Result<Amount, SpotTradeError> {
        Self::check_fill_rate(input)?;

        let order = &input.order;
        let fill = if order.fill_amount_b_or_s { input.fill_b } else { input.fill_s };
        let filled_after = input
            .filled
            .checked_add(fill)
            .ok_or(SpotTradeError::RangeCheck { field: "filled_after", bits: NUM_BITS_AMOUNT })?;
        validate_bitlength("filled_after", filled_after, NUM_BITS_AMOUNT)?;

        let limit = order.fill_limit();
        if filled_after > limit {
            return Err(SpotTradeError::FillLimitExceeded { filled_after, limit });
        }

        Self::check_counterparty(input)?;
        Ok(filled_after)
    }

    fn constrain(
        input: &OrderMatchInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<Variable, CircuitError> {
        let order = &input.order;
        Self::constrain_fill_rate(input, cs)?;

        // The fill is tracked in the token the order's limit is expressed in
        let fill = CondSelectGadget::select(
            &input.fill_b,
            &input.fill_s,
            order.fill_amount_b_or_s,
            cs,
        )?;
        let limit = CondSelectGadget::select(
            &order.amount_b,
            &order.amount_s,
            order.fill_amount_b_or_s,
            cs,
        )?;
        let filled_after = cs.add(input.filled, fill)?;
        BitRangeGadget::constrain_bit_range(filled_after, NUM_BITS_AMOUNT, cs)?;
        GreaterThanEqGadget::constrain_greater_than_eq(limit, filled_after, NUM_BITS_AMOUNT, cs)?;

        Self::constrain_counterparty(input, cs)?;
        Ok(filled_after)
    }
}

#[cfg(test)]
mod test {
    use circuit_types::{errors::SpotTradeError, order::Order};
    use eyre::Result;
    use num_bigint::BigUint;

    use super::{OrderMatchInput, OrderMatchingGadget};
    use crate::zk_gadgets::test_helpers::{assert_gadget_accepts, assert_gadget_rejects};

    /// An order selling 1000 for 100, half filled, matched 100 for 10
    fn input() -> OrderMatchInput {
        let order = Order {
            token_s: 1,
            token_b: 2,
            amount_s: 1000,
            amount_b: 100,
            valid_since: 10,
            valid_until: 100,
            ..Default::default()
        };

        OrderMatchInput {
            order,
            fill_s: 100,
            fill_b: 10,
            fill_b_rounding: 0,
            filled: 500,
            timestamp: 50,
            counterparty: BigUint::from(0xcafeu64),
        }
    }

    #[test]
    fn test_valid_fill() -> Result<()> {
        assert_eq!(assert_gadget_accepts::<OrderMatchingGadget>(&input())?, 600);

        // Filled by the amount bought
        let mut by_buy = input();
        by_buy.order.fill_amount_b_or_s = true;
        by_buy.filled = 50;
        assert_eq!(assert_gadget_accepts::<OrderMatchingGadget>(&by_buy)?, 60);
        Ok(())
    }

    /// An exactly encoded fill must meet the limit price exactly
    #[test]
    fn test_exact_fill_rate() -> Result<()> {
        let mut input = input();
        input.order.amount_s = 500_000;
        input.order.amount_b = 500_000;
        input.filled = 0;
        input.fill_s = 500_000;

        input.fill_b = 500_000;
        assert_gadget_accepts::<OrderMatchingGadget>(&input)?;

        // 499 short of the limit price, with nothing lost to rounding
        input.fill_b = 499_501;
        let err = assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        assert_eq!(err, SpotTradeError::InvalidFillRate { fill_s: 500_000, fill_b: 499_501 });

        input.fill_b = 499_999;
        assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        Ok(())
    }

    /// A fill encoded with exponent 1 may fall short of the price by at most
    /// the 9 units its encoding rounds off
    #[test]
    fn test_rounded_fill_rate() -> Result<()> {
        let mut input = input();
        input.order.amount_s = 10_000_000;
        input.order.amount_b = 10_000_000;
        input.filled = 0;
        input.fill_b = 5_242_870;
        input.fill_b_rounding = 9;

        input.fill_s = 5_242_879;
        assert_gadget_accepts::<OrderMatchingGadget>(&input)?;

        input.fill_s = 5_242_880;
        let err = assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        assert_eq!(err, SpotTradeError::InvalidFillRate { fill_s: 5_242_880, fill_b: 5_242_870 });
        Ok(())
    }

    #[test]
    fn test_zero_fill_mismatch() -> Result<()> {
        let mut input = input();
        input.fill_s = 0;
        let err = assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        assert!(matches!(err, SpotTradeError::FillMismatch(_)));

        // A zero fill on both sides is allowed
        input.fill_b = 0;
        assert_eq!(assert_gadget_accepts::<OrderMatchingGadget>(&input)?, 500);
        Ok(())
    }

    #[test]
    fn test_fill_limit() -> Result<()> {
        let mut input = input();
        input.filled = 901;
        let err = assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        assert_eq!(err, SpotTradeError::FillLimitExceeded { filled_after: 1001, limit: 1000 });
        Ok(())
    }

    #[test]
    fn test_validity_window() -> Result<()> {
        let mut input = input();
        input.timestamp = 9;
        let err = assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        assert_eq!(err, SpotTradeError::OrderNotYetValid { valid_since: 10, timestamp: 9 });

        input.timestamp = 10;
        assert_gadget_accepts::<OrderMatchingGadget>(&input)?;

        input.timestamp = 100;
        let err = assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        assert_eq!(err, SpotTradeError::OrderExpired { valid_until: 100, timestamp: 100 });
        Ok(())
    }

    #[test]
    fn test_taker() -> Result<()> {
        let mut input = input();
        input.order.taker = input.counterparty.clone();
        assert_gadget_accepts::<OrderMatchingGadget>(&input)?;

        input.order.taker = BigUint::from(0xbeefu64);
        let err = assert_gadget_rejects::<OrderMatchingGadget>(&input)?;
        assert!(matches!(err, SpotTradeError::InvalidTaker { .. }));
        Ok(())
    }
}
