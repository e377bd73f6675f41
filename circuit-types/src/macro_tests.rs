//! Defines tests for macros in the `circuit_macros` crate. We do this so that
//! we may define the bulk of the traits, data structures, etc outside of the
//! `circuit-macros` crate; as a proc-macro crate cannot export non proc-macro
//! items

#[allow(clippy::missing_docs_in_private_items)]
#[cfg(test)]
mod test {
    use circuit_macros::circuit_type;
    use constants::Scalar;
    use mpc_relation::{Variable, traits::Circuit};

    use crate::{
        PlonkCircuit,
        traits::{BaseType, CircuitBaseType, CircuitVarType},
    };

    #[circuit_type(singleprover_circuit)]
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct Inner {
        flag: bool,
        amount: u128,
    }

    #[circuit_type(singleprover_circuit)]
    #[derive(Clone, Debug, PartialEq, Eq)]
    struct TestType {
        val: Scalar,
        inner: Inner,
        arr: [u64; 2],
    }

    impl TestType {
        fn check_equal(&self, val: Scalar) -> bool {
            self.val.eq(&val)
        }
    }

    fn test_value() -> TestType {
        TestType {
            val: Scalar::from(2u64),
            inner: Inner { flag: true, amount: 1 << 90 },
            arr: [3, 4],
        }
    }

    #[test]
    fn test_base_type_preserved() {
        // Test that the base type may still be constructed
        let a = TestType { val: Scalar::one(), ..test_value() };
        assert!(a.check_equal(Scalar::one()))
    }

    #[test]
    fn test_base_type_implementation() {
        let a = test_value();
        let serialized = a.to_scalars();
        assert_eq!(serialized.len(), TestType::NUM_SCALARS);
        assert_eq!(TestType::NUM_SCALARS, 5);

        let deserialized = TestType::from_scalars(&mut serialized.into_iter());
        assert_eq!(a, deserialized)
    }

    #[test]
    fn test_circuit_base_type_implementation() {
        let a = test_value();
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var: TestTypeVar = a.create_witness(&mut cs).unwrap();

        // The derived var type exposes the fields as variables
        assert_eq!(cs.witness(var.val).unwrap(), a.val.inner());
        assert_eq!(cs.witness(var.inner.amount).unwrap(), Scalar::from(1u128 << 90).inner());
        assert_eq!(var.eval(&cs).unwrap(), a);

        // Constraining a field of the var type constrains the witness
        let expected = cs.create_variable(Scalar::from(2u64).inner()).unwrap();
        cs.enforce_equal(var.val, expected).unwrap();
        assert!(cs.check_circuit_satisfiability(&[]).is_ok());
    }

    #[test]
    fn test_public_var_allocation() {
        let a = test_value();
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let var = a.create_public_var(&mut cs).unwrap();

        let vars: Vec<Variable> = var.to_vars();
        assert_eq!(vars.len(), TestType::NUM_SCALARS);

        let public_inputs = a.to_scalars().iter().map(Scalar::inner).collect::<Vec<_>>();
        assert!(cs.check_circuit_satisfiability(&public_inputs).is_ok());
    }
}
