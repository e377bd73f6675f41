//! Groups the types describing a spot trade and its effect on the state
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use constants::{NUM_BITS_ADDRESS, NUM_BITS_BIPS, NUM_BITS_TIMESTAMP, Scalar};
use mpc_relation::Variable;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use crate::{
    Amount,
    account::{AccountUpdate, FeeAccountUpdate},
    biguint_from_hex_string, biguint_to_hex_string,
    errors::SpotTradeError,
    float::Float24,
    order::Order,
    scalar_from_hex_string, scalar_to_hex_string,
    storage::StorageUpdate,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_biguint_bitlength, validate_bitlength,
};

/// A trade of two orders against each other
///
/// Order A sells `fill_s_a` of its sell token to order B, which sells
/// `fill_s_b` of its sell token to order A
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotTrade {
    /// The taker order
    pub order_a: Order,
    /// The maker order
    pub order_b: Order,
    /// The float encoded amount sold by order A
    pub fill_s_a: Float24,
    /// The float encoded amount sold by order B
    pub fill_s_b: Float24,
}

impl SpotTrade {
    /// The decoded amount sold by order A
    pub fn fill_amount_a(&self) -> Amount {
        self.fill_s_a.decode()
    }

    /// The decoded amount sold by order B
    pub fn fill_amount_b(&self) -> Amount {
        self.fill_s_b.decode()
    }
}

/// The block level parameters a trade is executed under
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeParameters {
    /// The address of the exchange, bound into every order hash
    #[serde(
        serialize_with = "biguint_to_hex_string",
        deserialize_with = "biguint_from_hex_string"
    )]
    pub exchange: BigUint,
    /// The block timestamp
    pub timestamp: u64,
    /// The protocol fee rate charged to the taker (order A)
    pub protocol_taker_fee_bips: u64,
    /// The protocol fee rate charged to the maker (order B)
    pub protocol_maker_fee_bips: u64,
}

impl TradeParameters {
    /// Check that the parameters fit their widths
    pub fn validate(&self) -> Result<(), SpotTradeError> {
        validate_biguint_bitlength("exchange", &self.exchange, NUM_BITS_ADDRESS)?;
        validate_bitlength("timestamp", self.timestamp as u128, NUM_BITS_TIMESTAMP)?;
        validate_bitlength(
            "protocol_taker_fee_bips",
            self.protocol_taker_fee_bips as u128,
            NUM_BITS_BIPS,
        )?;
        validate_bitlength(
            "protocol_maker_fee_bips",
            self.protocol_maker_fee_bips as u128,
            NUM_BITS_BIPS,
        )
    }
}

/// Every state write and signature obligation produced by a trade
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotTradeUpdates {
    /// The write to order A's replay slot
    pub storage_a: StorageUpdate,
    /// The write to order B's replay slot
    pub storage_b: StorageUpdate,
    /// The new balances of order A's account
    pub account_a: AccountUpdate,
    /// The new balances of order B's account
    pub account_b: AccountUpdate,
    /// The new balances of the protocol fee pool
    pub pool: FeeAccountUpdate,
    /// The new balances of the operator
    pub operator: FeeAccountUpdate,
    /// The hash order A's owner signs
    #[serde(serialize_with = "scalar_to_hex_string", deserialize_with = "scalar_from_hex_string")]
    pub hash_a: Scalar,
    /// The hash order B's owner signs
    #[serde(serialize_with = "scalar_to_hex_string", deserialize_with = "scalar_from_hex_string")]
    pub hash_b: Scalar,
    /// Whether order A must carry a signature
    pub signature_required_a: bool,
    /// Whether order B must carry a signature
    pub signature_required_b: bool,
}

#[cfg(test)]
mod test {
    use crate::{PlonkCircuit, traits::CircuitBaseType};

    use super::*;

    /// A nested type survives allocation and evaluation in a constraint system
    #[test]
    fn test_updates_allocation() {
        let updates = SpotTradeUpdates {
            storage_a: StorageUpdate { address: 1, storage_id: 1, data: 50 },
            hash_a: Scalar::from(7u64),
            signature_required_a: true,
            ..Default::default()
        };

        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = updates.create_witness(&mut cs).unwrap();

        assert_eq!(var.to_vars().len(), SpotTradeUpdates::NUM_SCALARS);
        assert_eq!(var.eval(&cs).unwrap(), updates);
    }
}
