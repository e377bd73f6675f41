//! Defines an implementation of the Poseidon 2 hash function: https://eprint.iacr.org/2023/323.pdf

use ark_ff::{Field, Zero};
use std::ops::MulAssign;

use super::{CAPACITY, POSEIDON2_CONSTANTS, R_F, R_P, RATE, ScalarField, WIDTH};

/// A sponge construction on top of the Poseidon2 permutation
#[derive(Clone, Debug, Default)]
pub struct Poseidon2Sponge {
    /// The internal state of the sponge
    pub(crate) state: [ScalarField; WIDTH],
    /// The next index in the state to absorb inputs at or squeeze outputs
    /// from
    next_index: usize,
    /// Whether or not the sponge is in the squeeze state; once squeezing the
    /// sponge may not absorb again
    squeezing: bool,
}

impl Poseidon2Sponge {
    /// Constructor
    pub fn new() -> Self {
        Self { state: [ScalarField::zero(); WIDTH], next_index: 0, squeezing: false }
    }

    // --------------------
    // | Sponge Interface |
    // --------------------

    /// Hash the given input and return a single squeeze
    pub fn hash(&mut self, seq: &[ScalarField]) -> ScalarField {
        self.absorb_batch(seq);
        self.squeeze()
    }

    /// Absorb a single scalar into the sponge
    pub fn absorb(&mut self, x: &ScalarField) {
        assert!(!self.squeezing, "cannot absorb while squeezing");

        // Permute when the rate is full
        if self.next_index == RATE {
            self.permute();
            self.next_index = 0;
        }

        let entry = self.next_index + CAPACITY;
        self.state[entry] += x;
        self.next_index += 1;
    }

    /// Absorb a batch of scalars into the sponge
    pub fn absorb_batch(&mut self, x: &[ScalarField]) {
        x.iter().for_each(|x| self.absorb(x));
    }

    /// Squeeze a single scalar from the sponge
    pub fn squeeze(&mut self) -> ScalarField {
        // Permute on leaving the absorb state, and every `RATE` squeezes
        if !self.squeezing || self.next_index == RATE {
            self.permute();
            self.next_index = 0;
            self.squeezing = true;
        }

        let entry = self.next_index + CAPACITY;
        self.next_index += 1;
        self.state[entry]
    }

    /// Squeeze a batch of scalars from the sponge
    pub fn squeeze_batch(&mut self, n: usize) -> Vec<ScalarField> {
        (0..n).map(|_| self.squeeze()).collect()
    }

    // --------------------
    // | Internal Methods |
    // --------------------

    /// Permute the inner state
    pub(crate) fn permute(&mut self) {
        self.external_mds();

        const HALF: usize = R_F / 2;
        for i in 0..HALF {
            self.external_round(i);
        }

        for i in 0..R_P {
            self.internal_round(i);
        }

        for i in HALF..R_F {
            self.external_round(i);
        }
    }

    /// Run an external round on the state
    #[cfg_attr(feature = "inline", inline)]
    fn external_round(&mut self, round_number: usize) {
        let rc = &POSEIDON2_CONSTANTS.full[round_number];
        for (state_elem, rc) in self.state.iter_mut().zip(rc.iter()) {
            *state_elem += rc;
            Self::apply_sbox(state_elem);
        }

        self.external_mds();
    }

    /// Apply the external MDS matrix M_E to the state
    ///
    /// For t = 3, this is the circulant matrix `circ(2, 1, 1)`, equivalently
    /// adding the sum of the state to each element
    #[cfg_attr(feature = "inline", inline)]
    fn external_mds(&mut self) {
        let sum = self.state.iter().fold(ScalarField::zero(), |acc, x| acc + x);

        for state_elem in self.state.iter_mut() {
            *state_elem += sum;
        }
    }

    /// Run an internal round on the state
    ///
    /// Round numbers start at zero for the first internal round
    #[cfg_attr(feature = "inline", inline)]
    fn internal_round(&mut self, round_number: usize) {
        self.state[0] += POSEIDON2_CONSTANTS.partial[round_number];
        Self::apply_sbox(&mut self.state[0]);
        self.internal_mds();
    }

    /// Apply the internal MDS matrix M_I to the state
    ///
    /// For t = 3, this is the matrix:
    ///     [2, 1, 1]
    ///     [1, 2, 1]
    ///     [1, 1, 3]
    #[cfg_attr(feature = "inline", inline)]
    fn internal_mds(&mut self) {
        let sum = self.state.iter().fold(ScalarField::zero(), |acc, x| acc + x);

        self.state[WIDTH - 1].double_in_place();
        for state_elem in self.state.iter_mut() {
            *state_elem += sum;
        }
    }

    /// Apply the s-box x^5 to an element of the state
    #[cfg_attr(feature = "inline", inline)]
    fn apply_sbox(val: &mut ScalarField) {
        let base_val = *val;

        val.square_in_place();
        val.square_in_place();
        val.mul_assign(&base_val);
    }
}
