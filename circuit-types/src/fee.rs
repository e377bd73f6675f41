//! Groups the fee types and the native fee math of a spot trade
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use constants::{FEE_DIVIDER, NUM_BITS_AMOUNT, Scalar};
use mpc_relation::Variable;
use serde::{Deserialize, Serialize};

use crate::{
    Amount,
    errors::SpotTradeError,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_bitlength,
};

/// Apply a basis point rate to an amount, rounding down
///
/// Fails if the fee does not fit an amount, which the circuit's range checked
/// quotient cannot represent either
pub fn apply_bips(
    field: &'static str,
    amount: Amount,
    bips: u64,
) -> Result<Amount, SpotTradeError> {
    let fee = amount
        .checked_mul(bips as Amount)
        .map(|product| product / FEE_DIVIDER as Amount)
        .ok_or(SpotTradeError::RangeCheck { field, bits: NUM_BITS_AMOUNT })?;
    validate_bitlength(field, fee, NUM_BITS_AMOUNT)?;
    Ok(fee)
}

/// The fees taken from a single transferred amount
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeTake {
    /// The trading fee paid to the operator
    pub fee: Amount,
    /// The protocol fee the operator forwards to the fee pool
    pub protocol_fee: Amount,
}

impl FeeTake {
    /// Compute the fees on an amount
    pub fn compute(
        amount: Amount,
        fee_bips: u64,
        protocol_fee_bips: u64,
    ) -> Result<Self, SpotTradeError> {
        let fee = apply_bips("fee", amount, fee_bips)?;
        let protocol_fee = apply_bips("protocol_fee", amount, protocol_fee_bips)?;
        Ok(Self { fee, protocol_fee })
    }
}

/// The protocol fee rates one side of a trade pays on the token it sells and
/// the token it buys
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolFeeSplit {
    /// The rate on the token sold
    pub fee_bips_s: u64,
    /// The rate on the token bought
    pub fee_bips_b: u64,
}

impl ProtocolFeeSplit {
    /// Split a side's protocol fee rate between its tokens
    ///
    /// A side pays on the token it buys unless that token is an NFT, in which
    /// case it pays on the token it sells. A side trading two NFTs pays nothing.
    pub fn select(bips: u64, is_nft_token_b: bool, is_nft_token_s_and_b: bool) -> Self {
        let bips = if is_nft_token_s_and_b { 0 } else { bips };
        if is_nft_token_b {
            Self { fee_bips_s: bips, fee_bips_b: 0 }
        } else {
            Self { fee_bips_s: 0, fee_bips_b: bips }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fee_rounds_down() {
        let take = FeeTake::compute(12_345, 25, 5).unwrap();
        assert_eq!(take.fee, 30);
        assert_eq!(take.protocol_fee, 6);

        let take = FeeTake::compute(399, 25, 0).unwrap();
        assert_eq!(take, FeeTake { fee: 0, protocol_fee: 0 });
    }

    /// A product that overflows is reported as a range failure, not a panic
    #[test]
    fn test_fee_overflow() {
        let err = FeeTake::compute(Amount::MAX, 0, 2).unwrap_err();
        let expected = SpotTradeError::RangeCheck { field: "protocol_fee", bits: NUM_BITS_AMOUNT };
        assert_eq!(err, expected);

        let err = apply_bips("fee", 1 << 110, 20).unwrap_err();
        assert_eq!(err, SpotTradeError::RangeCheck { field: "fee", bits: NUM_BITS_AMOUNT });
    }

    #[test]
    fn test_protocol_fee_selection() {
        let split = ProtocolFeeSplit::select(5, false, false);
        assert_eq!(split, ProtocolFeeSplit { fee_bips_s: 0, fee_bips_b: 5 });

        let split = ProtocolFeeSplit::select(3, true, false);
        assert_eq!(split, ProtocolFeeSplit { fee_bips_s: 3, fee_bips_b: 0 });

        let split = ProtocolFeeSplit::select(3, true, true);
        assert_eq!(split, ProtocolFeeSplit::default());
    }
}
