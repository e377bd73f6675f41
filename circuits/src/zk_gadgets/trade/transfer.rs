//! Moves an amount between two balances
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use circuit_types::{
    Amount, PlonkCircuit,
    errors::SpotTradeError,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_bitlength,
};
use constants::{NUM_BITS_AMOUNT, Scalar};
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};

use crate::zk_gadgets::{TradeGadget, bits::BitRangeGadget};

/// A transfer of `amount` between two balances
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferInput {
    /// The balance debited
    pub from_balance: Amount,
    /// The balance credited
    pub to_balance: Amount,
    /// The amount moved
    pub amount: Amount,
}

/// The balances after a transfer
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TransferOutput {
    /// The debited balance
    pub from_balance: Amount,
    /// The credited balance
    pub to_balance: Amount,
}

/// Debits one balance and credits another
///
/// Both resulting balances are range checked, which rules out a debit below
/// zero since a negative difference wraps to a field element far outside the
/// amount range
pub struct BalanceTransferGadget;
impl TradeGadget for BalanceTransferGadget {
    type Input = TransferInput;
    type Output = TransferOutput;

    fn evaluate(input: &TransferInput) -> Result<TransferOutput, SpotTradeError> {
        let from_balance = input.from_balance.checked_sub(input.amount).ok_or(
            SpotTradeError::InsufficientBalance {
                balance: input.from_balance,
                amount: input.amount,
            },
        )?;
        validate_bitlength("from_balance", from_balance, NUM_BITS_AMOUNT)?;

        let to_balance = input
            .to_balance
            .checked_add(input.amount)
            .ok_or(SpotTradeError::RangeCheck { field: "to_balance", bits: NUM_BITS_AMOUNT })?;
        validate_bitlength("to_balance", to_balance, NUM_BITS_AMOUNT)?;

        Ok(TransferOutput { from_balance, to_balance })
    }

    fn constrain(
        input: &TransferInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<TransferOutputVar, CircuitError> {
        let from_balance = cs.sub(input.from_balance, input.amount)?;
        let to_balance = cs.add(input.to_balance, input.amount)?;
        BitRangeGadget::constrain_bit_range(from_balance, NUM_BITS_AMOUNT, cs)?;
        BitRangeGadget::constrain_bit_range(to_balance, NUM_BITS_AMOUNT, cs)?;

        Ok(TransferOutputVar { from_balance, to_balance })
    }
}
