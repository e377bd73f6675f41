//! Parameters and round constants of the Poseidon2 permutation
//!
//! Round constants are sampled from the Grain LFSR specified in the Poseidon
//! paper (https://eprint.iacr.org/2019/458.pdf, Appendix F), parameterized by
//! the field size, state width and round counts below. Every round samples a
//! full state's worth of constants; internal rounds only use the first.

pub use ::constants::ScalarField;
use ark_ff::PrimeField;
use lazy_static::lazy_static;
use num_bigint::BigUint;

use crate::fields::{biguint_to_field, get_scalar_field_modulus};

/// The number of field elements absorbed per permutation
pub const RATE: usize = 2;
/// The number of field elements of the state that are never absorbed into
pub const CAPACITY: usize = 1;
/// The width of the permutation's state
pub const WIDTH: usize = RATE + CAPACITY;
/// The number of full (external) rounds
pub const R_F: usize = 8;
/// The number of partial (internal) rounds
pub const R_P: usize = 56;

/// The size of the Grain LFSR's state in bits
const GRAIN_STATE_BITS: usize = 80;
/// The number of output bits discarded after seeding the LFSR
const GRAIN_WARMUP_BITS: usize = 160;
/// The field type tag in the LFSR seed; 1 denotes a prime field
const GRAIN_FIELD_TAG: u64 = 1;
/// The s-box tag in the LFSR seed; 0 denotes x^alpha
const GRAIN_SBOX_TAG: u64 = 0;

lazy_static! {
    /// The round constants of the permutation
    pub static ref POSEIDON2_CONSTANTS: RoundConstants = RoundConstants::generate();
}

/// The round constants used by the permutation
#[derive(Clone, Debug)]
pub struct RoundConstants {
    /// The constants added in each external round, in round order
    pub full: Vec<[ScalarField; WIDTH]>,
    /// The constants added to the first state element in each internal round
    pub partial: Vec<ScalarField>,
}

impl RoundConstants {
    /// Sample the round constants from a freshly seeded LFSR
    pub fn generate() -> Self {
        let n_bits = ScalarField::MODULUS_BIT_SIZE as usize;
        let mut lfsr = GrainLfsr::new(n_bits, WIDTH, R_F, R_P);

        let mut full = Vec::with_capacity(R_F);
        let mut partial = Vec::with_capacity(R_P);
        for round in 0..R_F + R_P {
            let round_constants: [ScalarField; WIDTH] =
                std::array::from_fn(|_| lfsr.next_field_element());

            let is_full_round = round < R_F / 2 || round >= R_F / 2 + R_P;
            if is_full_round {
                full.push(round_constants);
            } else {
                partial.push(round_constants[0]);
            }
        }

        Self { full, partial }
    }
}

// --------
// | LFSR |
// --------

/// The self-shrinking Grain LFSR used to derive round constants
struct GrainLfsr {
    /// The current 80 bit state
    state: [bool; GRAIN_STATE_BITS],
    /// The bit length of field elements to sample
    n_bits: usize,
    /// The field modulus; candidates at or above it are rejected
    modulus: BigUint,
}

impl GrainLfsr {
    /// Seed the LFSR with the permutation's parameters and run the warmup
    fn new(n_bits: usize, width: usize, r_f: usize, r_p: usize) -> Self {
        let mut seed = Vec::with_capacity(GRAIN_STATE_BITS);
        Self::push_bits(&mut seed, GRAIN_FIELD_TAG, 2);
        Self::push_bits(&mut seed, GRAIN_SBOX_TAG, 4);
        Self::push_bits(&mut seed, n_bits as u64, 12);
        Self::push_bits(&mut seed, width as u64, 12);
        Self::push_bits(&mut seed, r_f as u64, 10);
        Self::push_bits(&mut seed, r_p as u64, 10);
        seed.resize(GRAIN_STATE_BITS, true);

        let mut state = [false; GRAIN_STATE_BITS];
        state.copy_from_slice(&seed);

        let mut lfsr = Self { state, n_bits, modulus: get_scalar_field_modulus() };
        for _ in 0..GRAIN_WARMUP_BITS {
            lfsr.next_raw_bit();
        }

        lfsr
    }

    /// Append the `n` low bits of `value` to `bits`, most significant first
    fn push_bits(bits: &mut Vec<bool>, value: u64, n: usize) {
        bits.extend((0..n).rev().map(|i| (value >> i) & 1 == 1));
    }

    /// Clock the register once and return the new bit
    fn next_raw_bit(&mut self) -> bool {
        let s = &self.state;
        let new_bit = s[62] ^ s[51] ^ s[38] ^ s[23] ^ s[13] ^ s[0];

        self.state.rotate_left(1);
        self.state[GRAIN_STATE_BITS - 1] = new_bit;
        new_bit
    }

    /// Output bits in pairs, emitting the second bit only when the first is
    /// set
    fn next_bit(&mut self) -> bool {
        loop {
            let emit = self.next_raw_bit();
            let bit = self.next_raw_bit();
            if emit {
                return bit;
            }
        }
    }

    /// Sample `n_bits` bits, most significant first, rejecting values outside
    /// the field
    fn next_field_element(&mut self) -> ScalarField {
        loop {
            let mut candidate = BigUint::from(0u8);
            for _ in 0..self.n_bits {
                candidate <<= 1usize;
                if self.next_bit() {
                    candidate += 1u8;
                }
            }

            if candidate < self.modulus {
                return biguint_to_field(&candidate);
            }
        }
    }
}
