//! Test helpers for ZK gadgets

use std::fmt::Debug;

use circuit_types::{
    PlonkCircuit,
    errors::SpotTradeError,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
};
use constants::Scalar;
use eyre::{Result, eyre};
use mpc_relation::traits::Circuit;

use super::TradeGadget;

/// Evaluate a variable as the base type it was allocated from
///
/// Differs from `CircuitVarType::eval` for primitive base types, whose
/// variables evaluate to scalars
pub fn eval_as<T: CircuitBaseType>(var: &T::VarType, cs: &PlonkCircuit) -> Result<T> {
    let scalars = var
        .to_vars()
        .into_iter()
        .map(|v| cs.witness(v).map(Scalar::new))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(T::from_scalars(&mut scalars.into_iter()))
}

/// Constrain a gadget on the given input in a fresh constraint system
///
/// Returns the output the circuit derives and whether the constraints are
/// satisfied
pub fn constrain_gadget<G: TradeGadget>(input: &G::Input) -> Result<(G::Output, bool)> {
    let mut cs = PlonkCircuit::new_turbo_plonk();
    let input_var = input.create_witness(&mut cs)?;
    let output_var = G::constrain(&input_var, &mut cs)?;

    let output = eval_as::<G::Output>(&output_var, &cs)?;
    Ok((output, cs.check_circuit_satisfiability(&[]).is_ok()))
}

/// Assert that both phases of a gadget accept the input and agree on the
/// output, returning the output
pub fn assert_gadget_accepts<G>(input: &G::Input) -> Result<G::Output>
where
    G: TradeGadget,
    G::Output: Debug + PartialEq,
{
    let native = G::evaluate(input)?;
    let (output, satisfied) = constrain_gadget::<G>(input)?;

    assert!(satisfied, "constraints unsatisfied on an accepted input");
    assert_eq!(output, native);
    Ok(native)
}

/// Assert that both phases of a gadget reject the input, returning the native
/// error
pub fn assert_gadget_rejects<G>(input: &G::Input) -> Result<SpotTradeError>
where
    G: TradeGadget,
    G::Output: Debug,
{
    let err = match G::evaluate(input) {
        Ok(output) => return Err(eyre!("native evaluation accepted the input: {output:?}")),
        Err(e) => e,
    };

    let (_, satisfied) = constrain_gadget::<G>(input)?;
    assert!(!satisfied, "constraints satisfied on a rejected input");
    Ok(err)
}
