//! Helpers for translating between field elements and native integer types

use ark_ff::PrimeField;
use constants::{Scalar, ScalarField};
use num_bigint::BigUint;

// -----------
// | Helpers |
// -----------

/// Return the modulus `p` of the `Scalar` ($Z_p$) field as a `BigUint`
pub fn get_scalar_field_modulus() -> BigUint {
    ScalarField::MODULUS.into()
}

// ---------------------------
// | Conversions From Scalar |
// ---------------------------

/// Convert a scalar to a BigUint
pub fn scalar_to_biguint(a: &Scalar) -> BigUint {
    a.to_biguint()
}

/// Reduces the scalar to a u64, truncating anything above 2^64 - 1
pub fn scalar_to_u64(a: &Scalar) -> u64 {
    a.to_biguint().to_u64_digits().first().copied().unwrap_or_default()
}

/// Reduces the scalar to a u128, truncating anything above 2^128 - 1
pub fn scalar_to_u128(a: &Scalar) -> u128 {
    let digits = a.to_biguint().to_u64_digits();
    let low = digits.first().copied().unwrap_or_default() as u128;
    let high = digits.get(1).copied().unwrap_or_default() as u128;

    (high << 64) | low
}

/// Reduces the scalar to a usize, truncating anything above usize::MAX
pub fn scalar_to_usize(a: &Scalar) -> usize {
    scalar_to_u64(a) as usize
}

/// Returns the `n` least significant bits of a scalar, little endian
pub fn scalar_to_bits_le(a: &Scalar, n: usize) -> Vec<bool> {
    let value = a.to_biguint();
    (0..n as u64).map(|i| value.bit(i)).collect()
}

// ----------------------------
// | Conversions from Bigints |
// ----------------------------

/// Convert a BigUint to a scalar, reducing modulo the field
pub fn biguint_to_scalar(a: &BigUint) -> Scalar {
    Scalar::from(a.clone())
}

/// Convert a BigUint to an element of the scalar field, reducing modulo the
/// field
pub fn biguint_to_field(a: &BigUint) -> ScalarField {
    ScalarField::from_be_bytes_mod_order(&a.to_bytes_be())
}

/// Reconstruct a scalar from little endian bits
pub fn scalar_from_bits_le(bits: &[bool]) -> Scalar {
    let value = bits
        .iter()
        .rev()
        .fold(BigUint::from(0u8), |acc, bit| (acc << 1usize) + BigUint::from(*bit as u8));
    biguint_to_scalar(&value)
}

// ---------
// | Tests |
// ---------

#[cfg(test)]
mod field_helper_test {
    use constants::Scalar;
    use num_bigint::BigUint;
    use rand::{Rng, RngCore, thread_rng};

    use super::*;

    #[test]
    fn test_scalar_to_u64() {
        let rand_val = thread_rng().next_u64();
        let res = scalar_to_u64(&Scalar::from(rand_val));

        assert_eq!(res, rand_val);
    }

    #[test]
    fn test_scalar_to_u128() {
        let rand_val: u128 = thread_rng().gen_range(0..u128::MAX);
        let res = scalar_to_u128(&Scalar::from(rand_val));

        assert_eq!(res, rand_val);
    }

    #[test]
    fn test_biguint_to_scalar() {
        let rand_val = thread_rng().next_u64();
        let res = biguint_to_scalar(&BigUint::from(rand_val));

        assert_eq!(res, Scalar::from(rand_val));
    }

    /// The modulus itself reduces to zero
    #[test]
    fn test_modulus_reduces_to_zero() {
        let modulus = get_scalar_field_modulus();
        assert_eq!(biguint_to_scalar(&modulus), Scalar::zero());
        assert_eq!(biguint_to_scalar(&(modulus - 1u8)), -Scalar::one());
    }

    #[test]
    fn test_bits_roundtrip() {
        let mut rng = thread_rng();
        let value: u128 = rng.gen_range(0..(1u128 << 96));
        let scalar = Scalar::from(value);

        let bits = scalar_to_bits_le(&scalar, 96);
        assert_eq!(bits.len(), 96);
        assert_eq!(scalar_from_bits_le(&bits), scalar);
    }
}
