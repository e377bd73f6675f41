//! Groups gadgets for conditional selection

use circuit_types::{PlonkCircuit, traits::CircuitVarType};
use itertools::Itertools;
use mpc_relation::{BoolVar, errors::CircuitError, traits::Circuit};

/// Implements the control flow gate if selector { a } else { b }
pub struct CondSelectGadget;
impl CondSelectGadget {
    /// Computes the control flow statement if selector { a } else { b }
    pub fn select<V: CircuitVarType>(
        a: &V,
        b: &V,
        selector: BoolVar,
        cs: &mut PlonkCircuit,
    ) -> Result<V, CircuitError> {
        let selected = a
            .to_vars()
            .into_iter()
            .zip(b.to_vars())
            .map(|(a_var, b_var)| cs.mux(selector, a_var, b_var))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(V::from_vars(&mut selected.into_iter()))
    }

    /// Computes if selector { a } else { 0 }
    pub fn select_or_zero<V: CircuitVarType>(
        a: &V,
        selector: BoolVar,
        cs: &mut PlonkCircuit,
    ) -> Result<V, CircuitError> {
        let zero = cs.zero();
        let zeros = a.to_vars().iter().map(|_| zero).collect_vec();
        Self::select(a, &V::from_vars(&mut zeros.into_iter()), selector, cs)
    }
}

#[cfg(test)]
mod cond_select_test {
    use circuit_types::{PlonkCircuit, traits::CircuitBaseType};
    use constants::Scalar;
    use eyre::Result;
    use mpc_relation::traits::Circuit;
    use rand::thread_rng;

    use super::CondSelectGadget;

    /// Test the cond select gadget on both selector values
    #[test]
    fn test_cond_select() -> Result<()> {
        let mut rng = thread_rng();
        let a = [Scalar::random(&mut rng), Scalar::random(&mut rng)];
        let b = [Scalar::random(&mut rng), Scalar::random(&mut rng)];

        for selector in [true, false] {
            let mut cs = PlonkCircuit::new_turbo_plonk();
            let a_var = a.create_witness(&mut cs)?;
            let b_var = b.create_witness(&mut cs)?;
            let sel_var = selector.create_witness(&mut cs)?;

            let res = CondSelectGadget::select(&a_var, &b_var, sel_var, &mut cs)?;
            let expected = if selector { a } else { b };
            assert_eq!(res.map(|v| Scalar::new(cs.witness(v).unwrap())), expected);

            let zeroed = CondSelectGadget::select_or_zero(&a_var, sel_var, &mut cs)?;
            let expected = if selector { a } else { [Scalar::zero(); 2] };
            assert_eq!(zeroed.map(|v| Scalar::new(cs.witness(v).unwrap())), expected);

            assert!(cs.check_circuit_satisfiability(&[]).is_ok());
        }

        Ok(())
    }
}
