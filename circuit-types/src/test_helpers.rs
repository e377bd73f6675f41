//! Random value generators for tests and benchmarks

use constants::{NUM_BITS_ADDRESS, NUM_BITS_AMOUNT, Scalar};
use num_bigint::{BigUint, RandBigInt};
use rand::{Rng, thread_rng};

use crate::Amount;

/// Sample a random address
pub fn random_address() -> BigUint {
    thread_rng().gen_biguint(NUM_BITS_ADDRESS as u64)
}

/// Sample a random amount that fits in the amount width
pub fn random_amount() -> Amount {
    thread_rng().gen_range(0..1 << NUM_BITS_AMOUNT)
}

/// Sample a random amount below the given bound
pub fn random_amount_below(bound: Amount) -> Amount {
    thread_rng().gen_range(0..bound)
}

/// Sample a random scalar, e.g. as NFT data
pub fn random_scalar() -> Scalar {
    Scalar::random(&mut thread_rng())
}
