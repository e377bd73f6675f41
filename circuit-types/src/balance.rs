//! Groups the base types for token balance slots
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use constants::Scalar;
use mpc_relation::Variable;
use serde::{Deserialize, Serialize};

use crate::{
    Amount,
    scalar_from_hex_string, scalar_to_hex_string,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
};

/// A balance leaf of an account's balance tree
///
/// The weight is auxiliary data: an AMM's virtual balance, or the data
/// identifying the NFT held in the slot
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceLeaf {
    /// The amount of the token held
    pub balance: Amount,
    /// The auxiliary weight of the slot
    #[serde(serialize_with = "scalar_to_hex_string", deserialize_with = "scalar_from_hex_string")]
    pub weight: Scalar,
}

impl BalanceLeaf {
    /// Construct a fungible balance with no weight
    pub fn new(balance: Amount) -> Self {
        Self { balance, weight: Scalar::zero() }
    }
}

/// The new state of a balance leaf after a trade
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceUpdate {
    /// The token id addressing the leaf
    pub token: u64,
    /// The new balance
    pub balance: Amount,
    /// The new weight
    #[serde(serialize_with = "scalar_to_hex_string", deserialize_with = "scalar_from_hex_string")]
    pub weight: Scalar,
}
