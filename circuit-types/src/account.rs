//! Groups the base types for the accounts touched by a trade
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use constants::Scalar;
use mpc_relation::Variable;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
    Amount, biguint_from_hex_string, biguint_to_hex_string,
    balance::{BalanceLeaf, BalanceUpdate},
    storage::StorageLeaf,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
};

/// The state of a trading account read before the trade
///
/// Only the leaves the trade touches are included: the balances of the
/// order's sell and buy tokens and the order's replay protection slot
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradingAccountState {
    /// The owner address of the account
    #[serde(
        serialize_with = "biguint_to_hex_string",
        deserialize_with = "biguint_from_hex_string"
    )]
    pub owner: BigUint,
    /// The fee an AMM account charges on its orders
    pub fee_bips_amm: u64,
    /// The balance of the token sold
    pub balance_s: BalanceLeaf,
    /// The balance of the token bought
    pub balance_b: BalanceLeaf,
    /// The replay protection slot of the order
    pub storage: StorageLeaf,
}

/// The balances of a fee collecting account read before the trade
///
/// `balance_a` holds the token sold by order A, `balance_b` the token sold by
/// order B
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAccountState {
    /// The balance of order A's sell token
    pub balance_a: Amount,
    /// The balance of order B's sell token
    pub balance_b: Amount,
}

/// The new balances of a trading account after the trade
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountUpdate {
    /// The account updated
    pub account_id: u64,
    /// The new leaf of the token sold
    pub balance_s: BalanceUpdate,
    /// The new leaf of the token bought
    pub balance_b: BalanceUpdate,
}

/// The new balances of a fee collecting account after the trade
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeAccountUpdate {
    /// The new balance of order A's sell token
    pub balance_a: Amount,
    /// The new balance of order B's sell token
    pub balance_b: Amount,
}
