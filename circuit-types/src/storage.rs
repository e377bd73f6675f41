//! Groups the base types for replay protection slots
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use constants::{NUM_BITS_STORAGE_ADDRESS, Scalar};
use mpc_relation::Variable;
use serde::{Deserialize, Serialize};

use crate::{
    Amount,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
};

/// A replay protection leaf of an account's storage tree
///
/// A slot is addressed by the low bits of an order's slot id; an order with a
/// newer slot id at the same address reuses the slot from zero
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageLeaf {
    /// The amount filled by the order occupying the slot
    pub data: Amount,
    /// The slot id of the order occupying the slot
    pub storage_id: u64,
}

impl StorageLeaf {
    /// The amount already filled for an order with the given slot id
    pub fn filled(&self, storage_id: u64) -> Amount {
        if storage_id == self.storage_id { self.data } else { 0 }
    }
}

/// A write to a replay protection slot
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageUpdate {
    /// The address of the slot in the storage tree
    pub address: u64,
    /// The slot id of the order now occupying the slot
    pub storage_id: u64,
    /// The order's filled amount after the trade
    pub data: Amount,
}

/// The storage tree address of a slot id
pub fn storage_address(storage_id: u64) -> u64 {
    storage_id & ((1 << NUM_BITS_STORAGE_ADDRESS) - 1)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_slot_reuse() {
        let leaf = StorageLeaf { data: 70, storage_id: 5 };
        assert_eq!(leaf.filled(5), 70);
        assert_eq!(leaf.filled(5 + (1 << NUM_BITS_STORAGE_ADDRESS)), 0);
    }

    #[test]
    fn test_storage_address() {
        assert_eq!(storage_address(3), 3);
        assert_eq!(storage_address((7 << NUM_BITS_STORAGE_ADDRESS) + 3), 3);
    }
}
