//! Decodes an order: range checks its fields and derives its token classes,
//! fee split and signature hash
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use circuit_types::{
    PlonkCircuit,
    errors::SpotTradeError,
    order::{Order, OrderVar},
    traits::{BaseType, CircuitBaseType, CircuitVarType},
};
use constants::{
    NUM_BITS_ACCOUNT, NUM_BITS_ADDRESS, NUM_BITS_AMOUNT, NUM_BITS_BIPS, NUM_BITS_STORAGEID,
    NUM_BITS_TIMESTAMP, NUM_BITS_TOKEN, Scalar,
};
use mpc_relation::{BoolVar, Variable, errors::CircuitError, traits::Circuit};
use num_bigint::BigUint;

use crate::zk_gadgets::{
    TradeGadget,
    bits::{BitRangeGadget, ToBitsGadget},
    comparators::{GreaterThanEqGadget, NotEqualGadget},
    poseidon::hash_vars,
    select::CondSelectGadget,
};

/// An order and the exchange its hash is bound to
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OrderDecodeInput {
    /// The order to decode
    pub order: Order,
    /// The exchange address
    pub exchange: BigUint,
}

/// The values derived from an order
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DecodedOrder {
    /// Whether the token sold is an NFT
    pub is_nft_token_s: bool,
    /// Whether the token bought is an NFT
    pub is_nft_token_b: bool,
    /// Whether both tokens are NFTs
    pub is_nft_token_s_and_b: bool,
    /// The trading fee rate charged on the token sold
    pub fee_bips_s: u64,
    /// The trading fee rate charged on the token bought
    pub fee_bips_b: u64,
    /// Whether the owner must sign the order
    pub signature_required: bool,
    /// The hash the owner signs
    pub hash: Scalar,
}

impl DecodedOrder {
    /// Derive the values of a validated order
    pub fn new(order: &Order, exchange: &BigUint) -> Self {
        Self {
            is_nft_token_s: order.is_nft_token_s(),
            is_nft_token_b: order.is_nft_token_b(),
            is_nft_token_s_and_b: order.is_nft_token_s_and_b(),
            fee_bips_s: order.fee_bips_s(),
            fee_bips_b: order.fee_bips_b(),
            signature_required: order.signature_required(),
            hash: order.hash(exchange),
        }
    }
}

/// Classifies token ids as NFT or fungible
pub struct NftTokenGadget;
impl NftTokenGadget {
    /// Range check a token id and return its top bit, which marks NFT slots
    pub fn is_nft(token: Variable, cs: &mut PlonkCircuit) -> Result<BoolVar, CircuitError> {
        let bits = ToBitsGadget::<NUM_BITS_TOKEN>::to_bits(token, cs)?;
        Ok(bits[NUM_BITS_TOKEN - 1])
    }
}

/// Decodes and validates a single order
pub struct OrderDecoderGadget;
impl OrderDecoderGadget {
    /// Range check every field of the order and enforce its field relations
    fn constrain_valid_order(
        order: &OrderVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        BitRangeGadget::constrain_bit_range(order.storage_id, NUM_BITS_STORAGEID, cs)?;
        BitRangeGadget::constrain_bit_range(order.account_id, NUM_BITS_ACCOUNT, cs)?;
        BitRangeGadget::constrain_bit_range(order.amount_s, NUM_BITS_AMOUNT, cs)?;
        BitRangeGadget::constrain_bit_range(order.amount_b, NUM_BITS_AMOUNT, cs)?;
        BitRangeGadget::constrain_bit_range(order.valid_since, NUM_BITS_TIMESTAMP, cs)?;
        BitRangeGadget::constrain_bit_range(order.valid_until, NUM_BITS_TIMESTAMP, cs)?;
        BitRangeGadget::constrain_bit_range(order.max_fee_bips, NUM_BITS_BIPS, cs)?;
        BitRangeGadget::constrain_bit_range(order.fee_bips, NUM_BITS_BIPS, cs)?;
        BitRangeGadget::constrain_bit_range(order.taker, NUM_BITS_ADDRESS, cs)?;
        BitRangeGadget::constrain_binary(order.fill_amount_b_or_s.into(), cs)?;
        BitRangeGadget::constrain_binary(order.amm.into(), cs)?;

        GreaterThanEqGadget::constrain_greater_than_eq(
            order.max_fee_bips,
            order.fee_bips,
            NUM_BITS_BIPS,
            cs,
        )?;
        NotEqualGadget::constrain_not_equal(order.token_s, order.token_b, cs)
    }
}

impl TradeGadget for OrderDecoderGadget {
    type Input = OrderDecodeInput;
    type Output = DecodedOrder;

    fn evaluate(input: &OrderDecodeInput) -> Result<DecodedOrder, SpotTradeError> {
        input.order.validate()?;
        Ok(DecodedOrder::new(&input.order, &input.exchange))
    }

    fn constrain(
        input: &OrderDecodeInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<DecodedOrderVar, CircuitError> {
        let order = &input.order;
        Self::constrain_valid_order(order, cs)?;

        let is_nft_token_s = NftTokenGadget::is_nft(order.token_s, cs)?;
        let is_nft_token_b = NftTokenGadget::is_nft(order.token_b, cs)?;
        let is_nft_token_s_and_b = cs.logic_and(is_nft_token_s, is_nft_token_b)?;

        // The trading fee is charged on the token sold only when the token
        // bought is an NFT
        let zero = cs.zero();
        let fee_bips_s = CondSelectGadget::select(&order.fee_bips, &zero, is_nft_token_b, cs)?;
        let fee_bips_b = CondSelectGadget::select(&zero, &order.fee_bips, is_nft_token_b, cs)?;
        let signature_required = cs.logic_neg(order.amm)?;

        let hash = hash_vars(
            &[
                input.exchange,
                order.storage_id,
                order.account_id,
                order.token_s,
                order.token_b,
                order.amount_s,
                order.amount_b,
                order.valid_since,
                order.valid_until,
                order.max_fee_bips,
                order.fill_amount_b_or_s.into(),
                order.taker,
                order.nft_data_b,
            ],
            cs,
        )?;

        Ok(DecodedOrderVar {
            is_nft_token_s,
            is_nft_token_b,
            is_nft_token_s_and_b,
            fee_bips_s,
            fee_bips_b,
            signature_required,
            hash,
        })
    }
}
