//! Groups the base type and derived types for the `Order` entity
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use constants::{
    NUM_BITS_ACCOUNT, NUM_BITS_ADDRESS, NUM_BITS_AMOUNT, NUM_BITS_BIPS, NUM_BITS_STORAGEID,
    NUM_BITS_TIMESTAMP, NUM_BITS_TOKEN, Scalar,
};
use mpc_relation::Variable;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};
use trade_crypto::{fields::biguint_to_scalar, hash::compute_poseidon_hash};

use crate::{
    Amount, biguint_from_hex_string, biguint_to_hex_string,
    errors::SpotTradeError,
    is_nft_token, scalar_from_hex_string, scalar_to_hex_string,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_biguint_bitlength, validate_bitlength,
};

/// An order to sell `amount_s` of `token_s` for `amount_b` of `token_b`
///
/// The order is owned by the account it is placed from; its owner signs the
/// order hash unless the account is an AMM
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// The replay protection slot id of the order
    pub storage_id: u64,
    /// The account the order trades from
    pub account_id: u64,
    /// The token sold
    pub token_s: u64,
    /// The token bought
    pub token_b: u64,
    /// The maximum amount of `token_s` sold
    pub amount_s: Amount,
    /// The minimum amount of `token_b` bought for `amount_s`
    pub amount_b: Amount,
    /// The first timestamp the order may be filled at
    pub valid_since: u64,
    /// The timestamp from which the order may no longer be filled
    pub valid_until: u64,
    /// The maximum fee the owner agrees to pay
    pub max_fee_bips: u64,
    /// The fee charged by the operator, at most `max_fee_bips`
    pub fee_bips: u64,
    /// Whether the order is filled up to `amount_b` (true) or up to
    /// `amount_s` (false)
    pub fill_amount_b_or_s: bool,
    /// The only counterparty allowed to fill the order, or zero for any
    #[serde(
        serialize_with = "biguint_to_hex_string",
        deserialize_with = "biguint_from_hex_string"
    )]
    pub taker: BigUint,
    /// Whether the order is placed by an AMM account
    pub amm: bool,
    /// The NFT data expected in the bought token's slot
    #[serde(serialize_with = "scalar_to_hex_string", deserialize_with = "scalar_from_hex_string")]
    pub nft_data_b: Scalar,
}

impl Order {
    /// Whether the token sold is an NFT
    pub fn is_nft_token_s(&self) -> bool {
        is_nft_token(self.token_s)
    }

    /// Whether the token bought is an NFT
    pub fn is_nft_token_b(&self) -> bool {
        is_nft_token(self.token_b)
    }

    /// Whether both tokens are NFTs
    pub fn is_nft_token_s_and_b(&self) -> bool {
        self.is_nft_token_s() && self.is_nft_token_b()
    }

    /// The trading fee rate charged on the token sold
    ///
    /// The trading fee is charged on the fungible side of an NFT trade, which
    /// is the sold token only when the bought token is an NFT
    pub fn fee_bips_s(&self) -> u64 {
        if self.is_nft_token_b() { self.fee_bips } else { 0 }
    }

    /// The trading fee rate charged on the token bought
    pub fn fee_bips_b(&self) -> u64 {
        if self.is_nft_token_b() { 0 } else { self.fee_bips }
    }

    /// The amount the order's fill is limited by, in the filled token
    pub fn fill_limit(&self) -> Amount {
        if self.fill_amount_b_or_s { self.amount_b } else { self.amount_s }
    }

    /// Whether the owner must sign the order
    pub fn signature_required(&self) -> bool {
        !self.amm
    }

    /// The scalars hashed into the order's signature hash
    ///
    /// The fee and AMM flag are set by the operator and the account, so they
    /// are not part of the signed message
    pub fn hash_inputs(&self, exchange: &BigUint) -> Vec<Scalar> {
        vec![
            biguint_to_scalar(exchange),
            Scalar::from(self.storage_id),
            Scalar::from(self.account_id),
            Scalar::from(self.token_s),
            Scalar::from(self.token_b),
            Scalar::from(self.amount_s),
            Scalar::from(self.amount_b),
            Scalar::from(self.valid_since),
            Scalar::from(self.valid_until),
            Scalar::from(self.max_fee_bips),
            Scalar::from(self.fill_amount_b_or_s as u64),
            biguint_to_scalar(&self.taker),
            self.nft_data_b,
        ]
    }

    /// The hash of the order that the owner signs
    pub fn hash(&self, exchange: &BigUint) -> Scalar {
        compute_poseidon_hash(&self.hash_inputs(exchange))
    }

    /// Check that every field fits its width and the fee is within the owner's
    /// limit
    pub fn validate(&self) -> Result<(), SpotTradeError> {
        validate_bitlength("storage_id", self.storage_id as u128, NUM_BITS_STORAGEID)?;
        validate_bitlength("account_id", self.account_id as u128, NUM_BITS_ACCOUNT)?;
        validate_bitlength("token_s", self.token_s as u128, NUM_BITS_TOKEN)?;
        validate_bitlength("token_b", self.token_b as u128, NUM_BITS_TOKEN)?;
        validate_bitlength("amount_s", self.amount_s, NUM_BITS_AMOUNT)?;
        validate_bitlength("amount_b", self.amount_b, NUM_BITS_AMOUNT)?;
        validate_bitlength("valid_since", self.valid_since as u128, NUM_BITS_TIMESTAMP)?;
        validate_bitlength("valid_until", self.valid_until as u128, NUM_BITS_TIMESTAMP)?;
        validate_bitlength("max_fee_bips", self.max_fee_bips as u128, NUM_BITS_BIPS)?;
        validate_bitlength("fee_bips", self.fee_bips as u128, NUM_BITS_BIPS)?;
        validate_biguint_bitlength("taker", &self.taker, NUM_BITS_ADDRESS)?;

        if self.fee_bips > self.max_fee_bips {
            return Err(SpotTradeError::FeeBipsTooHigh {
                fee_bips: self.fee_bips,
                max_fee_bips: self.max_fee_bips,
            });
        }

        if self.token_s == self.token_b {
            return Err(SpotTradeError::SameToken(self.token_s));
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use constants::NFT_TOKEN_ID_START;

    use super::*;

    /// A fungible order selling 100 of token 1 for 10 of token 2
    fn fungible_order() -> Order {
        Order {
            storage_id: 3,
            account_id: 10,
            token_s: 1,
            token_b: 2,
            amount_s: 100,
            amount_b: 10,
            valid_until: 1000,
            max_fee_bips: 30,
            fee_bips: 20,
            ..Default::default()
        }
    }

    #[test]
    fn test_fee_split() {
        let order = fungible_order();
        assert_eq!(order.fee_bips_s(), 0);
        assert_eq!(order.fee_bips_b(), 20);

        let nft_buy = Order { token_b: NFT_TOKEN_ID_START + 1, ..order };
        assert_eq!(nft_buy.fee_bips_s(), 20);
        assert_eq!(nft_buy.fee_bips_b(), 0);
    }

    #[test]
    fn test_validate() {
        assert!(fungible_order().validate().is_ok());

        let too_expensive = Order { fee_bips: 31, ..fungible_order() };
        assert!(matches!(too_expensive.validate(), Err(SpotTradeError::FeeBipsTooHigh { .. })));

        let same_token = Order { token_b: 1, ..fungible_order() };
        assert_eq!(same_token.validate(), Err(SpotTradeError::SameToken(1)));

        let wide_token = Order { token_s: 1 << 16, ..fungible_order() };
        assert_eq!(
            wide_token.validate(),
            Err(SpotTradeError::RangeCheck { field: "token_s", bits: NUM_BITS_TOKEN })
        );
    }

    /// The operator controlled fields do not change the signed hash
    #[test]
    fn test_hash_excludes_operator_fields() {
        let exchange = BigUint::from(0xdeadbeefu64);
        let order = fungible_order();
        let rebated = Order { fee_bips: 5, amm: true, ..order.clone() };
        assert_eq!(order.hash(&exchange), rebated.hash(&exchange));

        let different_amount = Order { amount_b: 11, ..order.clone() };
        assert_ne!(order.hash(&exchange), different_amount.hash(&exchange));
        assert_ne!(order.hash(&exchange), order.hash(&BigUint::from(1u8)));
    }

    #[test]
    fn test_order_serde() {
        let order = Order { taker: BigUint::from(0xabcu64), ..fungible_order() };
        let serialized = serde_json::to_string(&order).unwrap();
        let deserialized: Order = serde_json::from_str(&serialized).unwrap();

        assert_eq!(order, deserialized);
    }
}
