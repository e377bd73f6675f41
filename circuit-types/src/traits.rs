//! Defines traits which group derived types and translations between them
//!
//! Inputs to the spot-trade circuitry are strongly typed so that gadgets read
//! like the native code they mirror, and so that a witness element cannot be
//! silently dropped or reordered.
//!
//! At a high level the types are:
//!     - Base types: application level types that have semantically meaningful
//!       values and serialize to a fixed number of scalars
//!     - Single-prover variable types: base types allocated in a PLONK
//!       constraint system

use constants::Scalar;
use mpc_relation::{BoolVar, Variable, errors::CircuitError, traits::Circuit};
use num_bigint::BigUint;
use trade_crypto::fields::{biguint_to_scalar, scalar_to_biguint, scalar_to_u64, scalar_to_u128};

use crate::PlonkCircuit;

/// The error message emitted when too few scalars are given
const ERR_TOO_FEW_SCALARS: &str = "from_scalars: Invalid number of scalars";
/// The error message emitted when too few variables are given
const ERR_TOO_FEW_VARS: &str = "from_vars: Invalid number of variables";

// ---------------
// | Type Traits |
// ---------------

/// Implementing types are base (application level) types that define
/// serialization to/from `Scalars`
///
/// Variable types are implemented automatically from serialization and
/// deserialization
pub trait BaseType: Clone {
    /// The number of scalars this type serializes into
    const NUM_SCALARS: usize;

    /// Convert the base type to its serialized scalar representation in the
    /// circuit
    fn to_scalars(&self) -> Vec<Scalar>;
    /// Convert from a serialized scalar representation to the base type
    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self;
}

/// The base type that may be allocated in a single-prover circuit
pub trait CircuitBaseType: BaseType {
    /// The variable type for this base type
    type VarType: CircuitVarType;

    /// Allocate the base type in the proof system and return the variable type
    /// associated with the base type
    fn create_witness(&self, circuit: &mut PlonkCircuit) -> Result<Self::VarType, CircuitError> {
        let vars = self
            .to_scalars()
            .into_iter()
            .map(|s| circuit.create_variable(s.inner()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::VarType::from_vars(&mut vars.into_iter()))
    }

    /// Allocate the base type as a public variable in a constraint system
    fn create_public_var(&self, circuit: &mut PlonkCircuit) -> Result<Self::VarType, CircuitError> {
        let vars = self
            .to_scalars()
            .into_iter()
            .map(|s| circuit.create_public_variable(s.inner()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::VarType::from_vars(&mut vars.into_iter()))
    }
}

/// Implementing types are variable types that may appear in constraints in
/// a constraint system
pub trait CircuitVarType: Clone {
    /// The base type that this variable type is a representation of
    type BaseType: CircuitBaseType;

    /// Convert to a collection of serialized variables for the type
    fn to_vars(&self) -> Vec<Variable>;
    /// Convert from an iterable of variables representing the serialized type
    fn from_vars<I: Iterator<Item = Variable>>(i: &mut I) -> Self;

    /// Evaluate the variable type in the constraint system to retrieve the base
    /// type
    fn eval(&self, circuit: &PlonkCircuit) -> Result<Self::BaseType, CircuitError> {
        let scalars = self
            .to_vars()
            .into_iter()
            .map(|v| circuit.witness(v).map(Scalar::new))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::BaseType::from_scalars(&mut scalars.into_iter()))
    }
}

// ------------------
// | Circuit Traits |
// ------------------

/// Defines the abstraction of a circuit
///
/// A circuit represents a provable unit: a complete NP statement that takes as
/// input a series of values and applies constraints to them
///
/// The input types are broken out into the witness type and the statement
/// type. The witness is known only to the prover, the statement is the set of
/// public inputs that both prover and verifier have access to
pub trait SingleProverCircuit {
    /// The witness type, given only to the prover
    type Witness: CircuitBaseType;
    /// The statement type, given to both the prover and verifier
    type Statement: CircuitBaseType;

    /// The name of the circuit
    fn name() -> String;

    /// Apply the constraints of the circuit to a given constraint system
    fn apply_constraints(
        witness_var: <Self::Witness as CircuitBaseType>::VarType,
        statement_var: <Self::Statement as CircuitBaseType>::VarType,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError>;
}

// ---------------------------
// | Base Type Implementations |
// ---------------------------

impl BaseType for Scalar {
    const NUM_SCALARS: usize = 1;

    fn to_scalars(&self) -> Vec<Scalar> {
        vec![*self]
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self {
        i.next().expect(ERR_TOO_FEW_SCALARS)
    }
}

impl BaseType for u64 {
    const NUM_SCALARS: usize = 1;

    fn to_scalars(&self) -> Vec<Scalar> {
        vec![Scalar::from(*self)]
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self {
        scalar_to_u64(&i.next().expect(ERR_TOO_FEW_SCALARS))
    }
}

impl BaseType for u128 {
    const NUM_SCALARS: usize = 1;

    fn to_scalars(&self) -> Vec<Scalar> {
        vec![Scalar::from(*self)]
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self {
        scalar_to_u128(&i.next().expect(ERR_TOO_FEW_SCALARS))
    }
}

impl BaseType for bool {
    const NUM_SCALARS: usize = 1;

    fn to_scalars(&self) -> Vec<Scalar> {
        vec![Scalar::from(*self as u64)]
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self {
        i.next().expect(ERR_TOO_FEW_SCALARS) != Scalar::zero()
    }
}

impl BaseType for BigUint {
    const NUM_SCALARS: usize = 1;

    fn to_scalars(&self) -> Vec<Scalar> {
        vec![biguint_to_scalar(self)]
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self {
        scalar_to_biguint(&i.next().expect(ERR_TOO_FEW_SCALARS))
    }
}

impl BaseType for () {
    const NUM_SCALARS: usize = 0;

    fn to_scalars(&self) -> Vec<Scalar> {
        vec![]
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(_: &mut I) -> Self {}
}

impl<const N: usize, T: BaseType> BaseType for [T; N] {
    const NUM_SCALARS: usize = N * T::NUM_SCALARS;

    fn to_scalars(&self) -> Vec<Scalar> {
        self.iter().flat_map(|x| x.to_scalars()).collect()
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self {
        std::array::from_fn(|_| T::from_scalars(i))
    }
}

// ----------------------------------
// | Circuit Type Implementations |
// ----------------------------------

impl CircuitBaseType for Scalar {
    type VarType = Variable;
}

impl CircuitBaseType for u64 {
    type VarType = Variable;
}

impl CircuitBaseType for u128 {
    type VarType = Variable;
}

impl CircuitBaseType for bool {
    type VarType = BoolVar;

    fn create_witness(&self, circuit: &mut PlonkCircuit) -> Result<Self::VarType, CircuitError> {
        circuit.create_boolean_variable(Scalar::from(*self as u64).inner())
    }

    /// A public boolean is linked to a constrained private boolean so that a
    /// non-binary public input is unsatisfiable
    fn create_public_var(&self, circuit: &mut PlonkCircuit) -> Result<Self::VarType, CircuitError> {
        let value = Scalar::from(*self as u64).inner();
        let public = circuit.create_public_variable(value)?;
        let bit = circuit.create_boolean_variable(value)?;
        circuit.enforce_equal(public, bit.into())?;

        Ok(BoolVar::new_unchecked(public))
    }
}

impl CircuitBaseType for BigUint {
    type VarType = Variable;
}

impl CircuitBaseType for () {
    type VarType = ();
}

impl<const N: usize, T: CircuitBaseType> CircuitBaseType for [T; N] {
    type VarType = [T::VarType; N];
}

impl CircuitVarType for Variable {
    type BaseType = Scalar;

    fn to_vars(&self) -> Vec<Variable> {
        vec![*self]
    }

    fn from_vars<I: Iterator<Item = Variable>>(i: &mut I) -> Self {
        i.next().expect(ERR_TOO_FEW_VARS)
    }
}

impl CircuitVarType for BoolVar {
    type BaseType = bool;

    fn to_vars(&self) -> Vec<Variable> {
        vec![(*self).into()]
    }

    fn from_vars<I: Iterator<Item = Variable>>(i: &mut I) -> Self {
        BoolVar::new_unchecked(i.next().expect(ERR_TOO_FEW_VARS))
    }
}

impl CircuitVarType for () {
    type BaseType = ();

    fn to_vars(&self) -> Vec<Variable> {
        vec![]
    }

    fn from_vars<I: Iterator<Item = Variable>>(_: &mut I) -> Self {}
}

impl<const N: usize, T: CircuitVarType> CircuitVarType for [T; N] {
    type BaseType = [T::BaseType; N];

    fn to_vars(&self) -> Vec<Variable> {
        self.iter().flat_map(|x| x.to_vars()).collect()
    }

    fn from_vars<I: Iterator<Item = Variable>>(i: &mut I) -> Self {
        std::array::from_fn(|_| T::from_vars(i))
    }
}
