//! Circuit helpers for testing

use circuit_types::{
    PlonkCircuit,
    traits::{BaseType, CircuitBaseType, SingleProverCircuit},
};
use constants::Scalar;
use itertools::Itertools;
use mpc_relation::{errors::CircuitError, traits::Circuit};

/// Check that the constraints for a given circuit are satisfied on the
/// given witness, statement pair
pub fn check_constraints_satisfied<C: SingleProverCircuit>(
    witness: &C::Witness,
    statement: &C::Statement,
) -> bool {
    let mut cs = PlonkCircuit::new_turbo_plonk();
    match apply_circuit::<C>(witness, statement, &mut cs) {
        Ok(()) => {},
        // A witness that cannot be allocated cannot satisfy the circuit
        Err(_) => return false,
    }

    let statement_scalars = statement.to_scalars().iter().map(Scalar::inner).collect_vec();
    cs.check_circuit_satisfiability(&statement_scalars).is_ok()
}

/// Allocate a witness and statement and apply the circuit's constraints
fn apply_circuit<C: SingleProverCircuit>(
    witness: &C::Witness,
    statement: &C::Statement,
    cs: &mut PlonkCircuit,
) -> Result<(), CircuitError> {
    let witness_var = witness.create_witness(cs)?;
    let statement_var = statement.create_public_var(cs)?;
    C::apply_constraints(witness_var, statement_var, cs)
}
