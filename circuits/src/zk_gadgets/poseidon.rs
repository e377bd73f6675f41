//! Groups logic for adding Poseidon2 hash function constraints to a PLONK
//! constraint system

use ark_ff::Zero;
use constants::ScalarField;
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};
use trade_crypto::hash::{CAPACITY, POSEIDON2_CONSTANTS, R_F, R_P, RATE, WIDTH};

/// The external MDS matrix `circ(2, 1, 1)`
const EXTERNAL_MDS: [[u64; WIDTH]; WIDTH] = [[2, 1, 1], [1, 2, 1], [1, 1, 2]];
/// The internal MDS matrix
const INTERNAL_MDS: [[u64; WIDTH]; WIDTH] = [[2, 1, 1], [1, 2, 1], [1, 1, 3]];

/// A hash gadget that applies the Poseidon2 sponge to the given constraint
/// system
///
/// The gadget mirrors `Poseidon2Sponge`: the capacity element leads the
/// state, and the sponge permutes when the rate is exhausted or on switching
/// from absorbing to squeezing
#[derive(Clone, Debug)]
pub struct PoseidonHashGadget {
    /// The hash state
    state: [Variable; WIDTH],
    /// The next index in the state to being absorbing inputs at
    next_index: usize,
    /// Whether the sponge is in squeezing mode. For simplicity, we disallow
    /// the case in which a caller wishes to squeeze values and the absorb more.
    in_squeeze_state: bool,
}

impl PoseidonHashGadget {
    // -------------
    // | Interface |
    // -------------

    /// Construct a new hash gadget with the given parameterization
    pub fn new(zero_var: Variable) -> Self {
        Self { state: [zero_var; WIDTH], next_index: 0, in_squeeze_state: false }
    }

    /// Hash the given input and return the first squeezed element
    pub fn hash<C: Circuit<ScalarField>>(
        &mut self,
        hash_input: &[Variable],
        cs: &mut C,
    ) -> Result<Variable, CircuitError> {
        self.batch_absorb(hash_input, cs)?;
        self.squeeze(cs)
    }

    /// Absorb an input into the hasher state
    pub fn absorb<C: Circuit<ScalarField>>(
        &mut self,
        a: Variable,
        cs: &mut C,
    ) -> Result<(), CircuitError> {
        assert!(
            !self.in_squeeze_state,
            "Cannot absorb from a sponge that has already been squeezed"
        );

        // Permute the digest state if we have filled up the rate sized buffer
        if self.next_index == RATE {
            self.permute(cs)?;
            self.next_index = 0;
        }

        let access_index = self.next_index + CAPACITY;
        self.state[access_index] = cs.add(a, self.state[access_index])?;
        self.next_index += 1;
        Ok(())
    }

    /// Absorb a batch of inputs into the hasher state
    pub fn batch_absorb<C: Circuit<ScalarField>>(
        &mut self,
        a: &[Variable],
        cs: &mut C,
    ) -> Result<(), CircuitError> {
        a.iter().try_for_each(|val| self.absorb(*val, cs))
    }

    /// Squeeze an element from the sponge and return its representation in the
    /// constraint system
    pub fn squeeze<C: Circuit<ScalarField>>(
        &mut self,
        cs: &mut C,
    ) -> Result<Variable, CircuitError> {
        // Once we exit the absorb state, ensure that the digest state is permuted
        // before squeezing
        if !self.in_squeeze_state || self.next_index == RATE {
            self.permute(cs)?;
            self.next_index = 0;
            self.in_squeeze_state = true;
        }

        let res = self.state[CAPACITY + self.next_index];
        self.next_index += 1;
        Ok(res)
    }

    /// Squeeze a batch of elements from the sponge
    pub fn batch_squeeze<C: Circuit<ScalarField>>(
        &mut self,
        num_elements: usize,
        cs: &mut C,
    ) -> Result<Vec<Variable>, CircuitError> {
        (0..num_elements).map(|_| self.squeeze(cs)).collect()
    }

    /// Squeeze an output from the hasher, and constrain its value to equal the
    /// provided variable
    pub fn constrained_squeeze<C: Circuit<ScalarField>>(
        &mut self,
        expected: Variable,
        cs: &mut C,
    ) -> Result<(), CircuitError> {
        let squeezed_elem = self.squeeze(cs)?;
        cs.enforce_equal(expected, squeezed_elem)
    }

    // -----------------------
    // | Permutation Helpers |
    // -----------------------

    /// Permute the state using the Poseidon2 permutation
    ///
    /// Each linear layer adds the round constants of the following round, so
    /// that a round costs its s-boxes and a single linear combination per
    /// state element
    fn permute<C: Circuit<ScalarField>>(&mut self, cs: &mut C) -> Result<(), CircuitError> {
        let full = &POSEIDON2_CONSTANTS.full;
        let partial = &POSEIDON2_CONSTANTS.partial;
        let partial_rc = |rc: ScalarField| {
            let mut padded = [ScalarField::zero(); WIDTH];
            padded[0] = rc;
            padded
        };

        self.linear_layer(&EXTERNAL_MDS, &full[0], cs)?;

        // --- First Set of External Rounds --- //
        const HALF: usize = R_F / 2;
        for round in 0..HALF {
            let next_rc = if round + 1 < HALF { full[round + 1] } else { partial_rc(partial[0]) };
            self.full_sbox(cs)?;
            self.linear_layer(&EXTERNAL_MDS, &next_rc, cs)?;
        }

        // --- Internal Rounds --- //
        for round in 0..R_P {
            let next_rc = if round + 1 < R_P { partial_rc(partial[round + 1]) } else { full[HALF] };
            self.state[0] = Self::sbox(self.state[0], cs)?;
            self.linear_layer(&INTERNAL_MDS, &next_rc, cs)?;
        }

        // --- Second Set of External Rounds --- //
        for round in HALF..R_F {
            let next_rc =
                if round + 1 < R_F { full[round + 1] } else { [ScalarField::zero(); WIDTH] };
            self.full_sbox(cs)?;
            self.linear_layer(&EXTERNAL_MDS, &next_rc, cs)?;
        }

        Ok(())
    }

    /// Apply the s-box to every element of the state
    fn full_sbox<C: Circuit<ScalarField>>(&mut self, cs: &mut C) -> Result<(), CircuitError> {
        for i in 0..WIDTH {
            self.state[i] = Self::sbox(self.state[i], cs)?;
        }

        Ok(())
    }

    /// Compute x^5
    fn sbox<C: Circuit<ScalarField>>(x: Variable, cs: &mut C) -> Result<Variable, CircuitError> {
        let x2 = cs.mul(x, x)?;
        let x4 = cs.mul(x2, x2)?;
        cs.mul(x4, x)
    }

    /// Multiply the state by a matrix and add the next round's constants
    fn linear_layer<C: Circuit<ScalarField>>(
        &mut self,
        matrix: &[[u64; WIDTH]; WIDTH],
        round_constants: &[ScalarField; WIDTH],
        cs: &mut C,
    ) -> Result<(), CircuitError> {
        let one = cs.one();
        let wires = [self.state[0], self.state[1], self.state[2], one];

        let mut new_state = self.state;
        for (i, row) in matrix.iter().enumerate() {
            let coeffs = [
                ScalarField::from(row[0]),
                ScalarField::from(row[1]),
                ScalarField::from(row[2]),
                round_constants[i],
            ];
            new_state[i] = cs.lc(&wires, &coeffs)?;
        }

        self.state = new_state;
        Ok(())
    }
}

/// Hash a sequence of variables and return the result
pub fn hash_vars<C: Circuit<ScalarField>>(
    values: &[Variable],
    cs: &mut C,
) -> Result<Variable, CircuitError> {
    let mut hasher = PoseidonHashGadget::new(cs.zero() /* zero_var */);
    hasher.hash(values, cs)
}
