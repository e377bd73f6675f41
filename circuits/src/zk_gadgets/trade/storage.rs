//! Reads an order's replay protection slot
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use circuit_types::{
    Amount, PlonkCircuit,
    errors::SpotTradeError,
    storage::{StorageLeaf, storage_address},
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_bitlength,
};
use constants::{NUM_BITS_AMOUNT, NUM_BITS_STORAGE_ADDRESS, NUM_BITS_STORAGEID, Scalar};
use mpc_relation::{Variable, errors::CircuitError};

use crate::zk_gadgets::{
    TradeGadget,
    bits::{BitRangeGadget, ToBitsGadget, bit_reconstruct},
    comparators::{EqGadget, GreaterThanEqGadget},
    select::CondSelectGadget,
};

/// A replay slot and the slot id of the order reading it
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplaySlotInput {
    /// The leaf at the order's slot address
    pub leaf: StorageLeaf,
    /// The order's slot id
    pub storage_id: u64,
}

/// The state of the slot as seen by the order
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplaySlot {
    /// The amount the order has filled before the trade
    pub filled: Amount,
    /// The address of the slot in the storage tree
    pub address: u64,
}

/// Reads the filled amount of an order from its slot
///
/// An order may take over a slot held by an order with a lower slot id, in
/// which case it starts from zero; an order with a lower slot id than the
/// slot's is rejected
pub struct ReplaySlotGadget;
impl TradeGadget for ReplaySlotGadget {
    type Input = ReplaySlotInput;
    type Output = ReplaySlot;

    fn evaluate(input: &ReplaySlotInput) -> Result<ReplaySlot, SpotTradeError> {
        validate_bitlength("storage_id", input.storage_id as u128, NUM_BITS_STORAGEID)?;
        validate_bitlength("leaf_data", input.leaf.data, NUM_BITS_AMOUNT)?;
        if input.storage_id < input.leaf.storage_id {
            return Err(SpotTradeError::ReplaySlotRegression {
                order_storage_id: input.storage_id,
                leaf_storage_id: input.leaf.storage_id,
            });
        }

        Ok(ReplaySlot {
            filled: input.leaf.filled(input.storage_id),
            address: storage_address(input.storage_id),
        })
    }

    fn constrain(
        input: &ReplaySlotInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<ReplaySlotVar, CircuitError> {
        let bits = ToBitsGadget::<NUM_BITS_STORAGEID>::to_bits(input.storage_id, cs)?;
        BitRangeGadget::constrain_bit_range(input.leaf.data, NUM_BITS_AMOUNT, cs)?;
        GreaterThanEqGadget::constrain_greater_than_eq(
            input.storage_id,
            input.leaf.storage_id,
            NUM_BITS_STORAGEID,
            cs,
        )?;

        let same_order = EqGadget::eq(&input.storage_id, &input.leaf.storage_id, cs)?;
        let filled = CondSelectGadget::select_or_zero(&input.leaf.data, same_order, cs)?;
        let address = bit_reconstruct(&bits[..NUM_BITS_STORAGE_ADDRESS], cs)?;

        Ok(ReplaySlotVar { filled, address })
    }
}
