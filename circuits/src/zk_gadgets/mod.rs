//! Groups gadgets used in the spot-trade circuit
//!
//! The generic gadgets (bits, comparators, selection, arithmetic, hashing) are
//! built on the low level gates of `mpc-jellyfish`. The trade gadgets in
//! `trade` build the relation itself on top of them.

pub mod arithmetic;
pub mod bits;
pub mod comparators;
pub mod poseidon;
pub mod select;
pub mod trade;

#[cfg(test)]
pub mod test_helpers;

use circuit_types::{PlonkCircuit, errors::SpotTradeError, traits::CircuitBaseType};
use mpc_relation::errors::CircuitError;

/// The variable type of a gadget's input
pub type GadgetInputVar<G> = <<G as TradeGadget>::Input as CircuitBaseType>::VarType;
/// The variable type of a gadget's output
pub type GadgetOutputVar<G> = <<G as TradeGadget>::Output as CircuitBaseType>::VarType;

/// A unit of the spot-trade relation with a native and an in-circuit phase
///
/// `evaluate` computes the output natively and fails exactly when `constrain`
/// would leave the constraint system unsatisfiable on the same input; when it
/// succeeds the two phases agree on the output
pub trait TradeGadget {
    /// The values the gadget reads
    type Input: CircuitBaseType;
    /// The values the gadget derives
    type Output: CircuitBaseType;

    /// Compute the gadget's output natively
    fn evaluate(input: &Self::Input) -> Result<Self::Output, SpotTradeError>;

    /// Constrain the gadget's output in a constraint system
    fn constrain(
        input: &<Self::Input as CircuitBaseType>::VarType,
        cs: &mut PlonkCircuit,
    ) -> Result<<Self::Output as CircuitBaseType>::VarType, CircuitError>;
}
