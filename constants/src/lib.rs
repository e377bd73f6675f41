//! Defines system-wide constants for spot-trade circuits

#![deny(unsafe_code)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(missing_docs)]

use ark_ec::Group;
#[cfg(feature = "scalar")]
use ark_mpc::algebra::Scalar as GenericScalar;

// ------------------------------------
// | System Specific Type Definitions |
// ------------------------------------

/// The curve that our proof system operates over
pub type SystemCurve = ark_bn254::Bn254;

/// The curve group that our proof system operates over
pub type SystemCurveGroup = ark_bn254::G1Projective;

/// The scalar field the curve is defined over
pub type ScalarField = <ark_bn254::G1Projective as Group>::ScalarField;

/// The scalar type that the circuits are defined over
#[cfg(feature = "scalar")]
pub type Scalar = GenericScalar<SystemCurveGroup>;

// -------------------
// | Field Bitwidths |
// -------------------

/// The number of bits in a token amount or balance
pub const NUM_BITS_AMOUNT: usize = 96;
/// The number of bits in a replay-protection slot id
pub const NUM_BITS_STORAGEID: usize = 32;
/// The number of low-order bits of a slot id that address the storage tree
pub const NUM_BITS_STORAGE_ADDRESS: usize = 14;
/// The number of bits in an account id
pub const NUM_BITS_ACCOUNT: usize = 32;
/// The number of bits in a token id
pub const NUM_BITS_TOKEN: usize = 16;
/// The number of bits in a timestamp
pub const NUM_BITS_TIMESTAMP: usize = 32;
/// The number of bits in a fee rate expressed in basis points
pub const NUM_BITS_BIPS: usize = 8;
/// The number of bits in an owner or taker address
pub const NUM_BITS_ADDRESS: usize = 160;

// ------------------
// | Token Classes |
// ------------------

/// The first token id that designates a non-fungible token slot
///
/// Token ids are `NUM_BITS_TOKEN` wide, so the top bit marks an NFT
pub const NFT_TOKEN_ID_START: u64 = 1 << (NUM_BITS_TOKEN - 1);

// ------------------
// | Fee Parameters |
// ------------------

/// The divisor applied to a basis point fee rate
pub const FEE_DIVIDER: u64 = 10_000;

// -------------------
// | Float Encoding |
// -------------------

/// The number of exponent bits in a `Float24`
pub const FLOAT24_EXPONENT_BITS: usize = 5;
/// The number of mantissa bits in a `Float24`
pub const FLOAT24_MANTISSA_BITS: usize = 19;
/// The total number of bits in a `Float24`
pub const FLOAT24_BITS: usize = FLOAT24_EXPONENT_BITS + FLOAT24_MANTISSA_BITS;
/// The base that a `Float24` exponent is applied to
pub const FLOAT24_EXPONENT_BASE: u64 = 10;
/// The smallest mantissa of a canonical `Float24` with a nonzero exponent
///
/// Encoding only raises the exponent while the mantissa exceeds its width, so
/// a scaled mantissa is at least `2^19 / 10`
pub const FLOAT24_MIN_SCALED_MANTISSA: u64 = (1 << FLOAT24_MANTISSA_BITS) / FLOAT24_EXPONENT_BASE;
/// The bit width of the most a `Float24` encoding may round off, `10^31 - 1`
pub const NUM_BITS_FLOAT24_ROUNDING: usize = 103;

// ---------------
// | Public Data |
// ---------------

/// The number of bits of public data a spot trade emits
pub const PUBLIC_DATA_BITS: usize = 260;
/// The number of bits packed into each public data field element
pub const PUBLIC_DATA_CHUNK_BITS: usize = 248;
/// The number of field elements the public data packs into
pub const NUM_PUBLIC_DATA_CHUNKS: usize = PUBLIC_DATA_BITS.div_ceil(PUBLIC_DATA_CHUNK_BITS);
