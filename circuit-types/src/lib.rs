//! Groups type definitions and abstractions used by the spot-trade circuitry
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

pub mod account;
pub mod balance;
pub mod errors;
pub mod fee;
pub mod float;
pub mod macro_tests;
pub mod order;
pub mod public_data;
pub mod spot_trade;
pub mod storage;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod traits;

use constants::{NFT_TOKEN_ID_START, Scalar, ScalarField};
use errors::SpotTradeError;
use mpc_relation::PlonkCircuit as GenericPlonkCircuit;
use num_bigint::BigUint;
use num_traits::Num;
use serde::{Deserialize, Deserializer, Serializer, de::Error as SerdeErr};
use trade_crypto::fields::{biguint_to_scalar, scalar_to_biguint};

/// A type alias for the PLONK constraint system over the system scalar field
pub type PlonkCircuit = GenericPlonkCircuit<ScalarField>;

/// An amount or balance of a token
///
/// Amounts are range checked to `NUM_BITS_AMOUNT` bits; the native type leaves
/// headroom for intermediate sums
pub type Amount = u128;

// -----------
// | Helpers |
// -----------

/// Whether the given token id addresses an NFT slot
pub fn is_nft_token(token: u64) -> bool {
    token >= NFT_TOKEN_ID_START
}

/// Check that an integer value fits in the given number of bits
pub fn validate_bitlength(
    field: &'static str,
    value: u128,
    bits: usize,
) -> Result<(), SpotTradeError> {
    if bits < 128 && value >> bits != 0 {
        return Err(SpotTradeError::RangeCheck { field, bits });
    }

    Ok(())
}

/// Check that a big integer value fits in the given number of bits
pub fn validate_biguint_bitlength(
    field: &'static str,
    value: &BigUint,
    bits: usize,
) -> Result<(), SpotTradeError> {
    if value.bits() > bits as u64 {
        return Err(SpotTradeError::RangeCheck { field, bits });
    }

    Ok(())
}

// -----------------------------------------
// | Serialization Deserialization Helpers |
// -----------------------------------------

/// A helper to serialize a Scalar to a hex string
pub fn scalar_to_hex_string<S>(val: &Scalar, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    biguint_to_hex_string(&scalar_to_biguint(val), s)
}

/// A helper to deserialize a Scalar from a hex string
pub fn scalar_from_hex_string<'de, D>(d: D) -> Result<Scalar, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(biguint_to_scalar(&biguint_from_hex_string(d)?))
}

/// A helper to serialize a BigUint to a hex string
pub fn biguint_to_hex_string<S>(val: &BigUint, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&format!("0x{}", val.to_str_radix(16 /* radix */)))
}

/// A helper to deserialize a BigUint from a hex string
pub fn biguint_from_hex_string<'de, D>(d: D) -> Result<BigUint, D::Error>
where
    D: Deserializer<'de>,
{
    // Deserialize as a string and remove "0x" if present
    let hex_string = String::deserialize(d)?;
    let hex_string = hex_string.strip_prefix("0x").unwrap_or(&hex_string);

    BigUint::from_str_radix(hex_string, 16 /* radix */)
        .map_err(|e| SerdeErr::custom(format!("error deserializing BigUint from hex string: {e}")))
}
