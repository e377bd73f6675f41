//! Computes the trading and protocol fees of a trade
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use circuit_types::{
    Amount, PlonkCircuit,
    errors::SpotTradeError,
    fee::{FeeTake, FeeTakeVar, ProtocolFeeSplit, ProtocolFeeSplitVar},
    traits::{BaseType, CircuitBaseType, CircuitVarType},
};
use constants::{FEE_DIVIDER, NUM_BITS_AMOUNT, Scalar};
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};

use crate::zk_gadgets::{TradeGadget, arithmetic::MulDivGadget, select::CondSelectGadget};

/// An amount received by an order and the rates charged on it
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FeeInput {
    /// The amount the fee is taken from
    pub amount: Amount,
    /// The trading fee rate
    pub fee_bips: u64,
    /// The protocol fee rate
    pub protocol_fee_bips: u64,
}

/// Takes the trading and protocol fee from a received amount
///
/// Both fees round down
pub struct FeeGadget;

impl TradeGadget for FeeGadget {
    type Input = FeeInput;
    type Output = FeeTake;

    fn evaluate(input: &FeeInput) -> Result<FeeTake, SpotTradeError> {
        FeeTake::compute(input.amount, input.fee_bips, input.protocol_fee_bips)
    }

    fn constrain(input: &FeeInputVar, cs: &mut PlonkCircuit) -> Result<FeeTakeVar, CircuitError> {
        let fee =
            MulDivGadget::mul_div(input.amount, input.fee_bips, FEE_DIVIDER, NUM_BITS_AMOUNT, cs)?;
        let protocol_fee = MulDivGadget::mul_div(
            input.amount,
            input.protocol_fee_bips,
            FEE_DIVIDER,
            NUM_BITS_AMOUNT,
            cs,
        )?;

        Ok(FeeTakeVar { fee, protocol_fee })
    }
}

/// A side's protocol fee rate and the token classes of its order
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProtocolFeeInput {
    /// The protocol fee rate the side pays
    pub protocol_fee_bips: u64,
    /// Whether the order buys an NFT
    pub is_nft_token_b: bool,
    /// Whether the order trades two NFTs
    pub is_nft_token_s_and_b: bool,
}

/// Splits a side's protocol fee rate between the tokens it sells and buys
pub struct ProtocolFeeGadget;
impl TradeGadget for ProtocolFeeGadget {
    type Input = ProtocolFeeInput;
    type Output = ProtocolFeeSplit;

    fn evaluate(input: &ProtocolFeeInput) -> Result<ProtocolFeeSplit, SpotTradeError> {
        Ok(ProtocolFeeSplit::select(
            input.protocol_fee_bips,
            input.is_nft_token_b,
            input.is_nft_token_s_and_b,
        ))
    }

    fn constrain(
        input: &ProtocolFeeInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<ProtocolFeeSplitVar, CircuitError> {
        let charged = cs.logic_neg(input.is_nft_token_s_and_b)?;
        let bips = CondSelectGadget::select_or_zero(&input.protocol_fee_bips, charged, cs)?;

        let zero = cs.zero();
        let fee_bips_s = CondSelectGadget::select(&bips, &zero, input.is_nft_token_b, cs)?;
        let fee_bips_b = CondSelectGadget::select(&zero, &bips, input.is_nft_token_b, cs)?;
        Ok(ProtocolFeeSplitVar { fee_bips_s, fee_bips_b })
    }
}

#[cfg(test)]
mod test {
    use circuit_types::{
        Amount,
        errors::SpotTradeError,
        fee::{FeeTake, ProtocolFeeSplit},
        test_helpers::random_amount,
    };
    use eyre::Result;

    use super::{FeeGadget, FeeInput, ProtocolFeeGadget, ProtocolFeeInput};
    use crate::zk_gadgets::test_helpers::{assert_gadget_accepts, assert_gadget_rejects};

    #[test]
    fn test_fee_rounds_down() -> Result<()> {
        let input = FeeInput { amount: 12_345, fee_bips: 25, protocol_fee_bips: 5 };
        let take = assert_gadget_accepts::<FeeGadget>(&input)?;
        assert_eq!(take, FeeTake { fee: 30, protocol_fee: 6 });
        Ok(())
    }

    #[test]
    fn test_random_fees() -> Result<()> {
        for _ in 0..5 {
            let amount = random_amount();
            let input = FeeInput { amount, fee_bips: 255, protocol_fee_bips: 17 };
            let take = assert_gadget_accepts::<FeeGadget>(&input)?;
            let expected =
                FeeTake { fee: amount * 255 / 10_000, protocol_fee: amount * 17 / 10_000 };
            assert_eq!(take, expected);
        }

        Ok(())
    }

    /// A fee whose quotient does not fit an amount is rejected
    #[test]
    fn test_fee_overflow() -> Result<()> {
        let input = FeeInput { amount: 1 << 110, fee_bips: 20, protocol_fee_bips: 0 };
        let err = assert_gadget_rejects::<FeeGadget>(&input)?;
        assert_eq!(err, SpotTradeError::RangeCheck { field: "fee", bits: 96 });

        // A product past 128 bits is rejected natively rather than panicking
        let input = FeeInput { amount: Amount::MAX, fee_bips: 0, protocol_fee_bips: 3 };
        let err = assert_gadget_rejects::<FeeGadget>(&input)?;
        assert_eq!(err, SpotTradeError::RangeCheck { field: "protocol_fee", bits: 96 });
        Ok(())
    }

    #[test]
    fn test_protocol_fee_split() -> Result<()> {
        let fungible = ProtocolFeeInput {
            protocol_fee_bips: 5,
            is_nft_token_b: false,
            is_nft_token_s_and_b: false,
        };
        let split = assert_gadget_accepts::<ProtocolFeeGadget>(&fungible)?;
        assert_eq!(split, ProtocolFeeSplit { fee_bips_s: 0, fee_bips_b: 5 });

        let buys_nft = ProtocolFeeInput { is_nft_token_b: true, ..fungible.clone() };
        let split = assert_gadget_accepts::<ProtocolFeeGadget>(&buys_nft)?;
        assert_eq!(split, ProtocolFeeSplit { fee_bips_s: 5, fee_bips_b: 0 });

        let swaps_nfts = ProtocolFeeInput { is_nft_token_s_and_b: true, ..buys_nft };
        let split = assert_gadget_accepts::<ProtocolFeeGadget>(&swaps_nfts)?;
        assert_eq!(split, ProtocolFeeSplit::default());
        Ok(())
    }
}
