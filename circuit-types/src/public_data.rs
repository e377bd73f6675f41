//! The public data a spot trade publishes to the rollup's data availability
//! layer
//!
//! The record is a fixed 260 bit string. Each field is written least
//! significant bit first and the concatenation is then reversed as a whole,
//! so the string reads the fields in reverse order, each most significant bit
//! first. The string is packed most significant bit first into field elements
//! of `PUBLIC_DATA_CHUNK_BITS` bits for the statement.
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use constants::{
    FLOAT24_BITS, NUM_BITS_ACCOUNT, NUM_BITS_BIPS, NUM_BITS_STORAGEID, NUM_BITS_TOKEN,
    NUM_PUBLIC_DATA_CHUNKS, PUBLIC_DATA_BITS, PUBLIC_DATA_CHUNK_BITS, Scalar,
};
use itertools::Itertools;
use mpc_relation::Variable;
use serde::{Deserialize, Serialize};
use trade_crypto::fields::{scalar_from_bits_le, scalar_to_bits_le};

use crate::{
    errors::{SpotTradeError, TypeConversionError},
    float::Float24,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_bitlength,
};

/// The number of low fee bits published next to the fill direction flag
pub const FEE_BIPS_LOW_BITS: usize = 6;
/// The number of high fee bits published at the end of the record
pub const FEE_BIPS_HIGH_BITS: usize = NUM_BITS_BIPS - FEE_BIPS_LOW_BITS;

/// The width of each field of the record, in publication order
///
/// Fields: storage ids (A, B), account ids (A, B), sell tokens (A, B), fills
/// (A, B), then for each of A and B the fill direction flag, a zero bit and
/// the low fee bits, then the tokens credited by the B to A and A to B
/// transfers, then the high fee bits (A, B)
pub const PUBLIC_DATA_WIDTHS: [usize; 18] = [
    NUM_BITS_STORAGEID,
    NUM_BITS_STORAGEID,
    NUM_BITS_ACCOUNT,
    NUM_BITS_ACCOUNT,
    NUM_BITS_TOKEN,
    NUM_BITS_TOKEN,
    FLOAT24_BITS,
    FLOAT24_BITS,
    1,
    1,
    FEE_BIPS_LOW_BITS,
    1,
    1,
    FEE_BIPS_LOW_BITS,
    NUM_BITS_TOKEN,
    NUM_BITS_TOKEN,
    FEE_BIPS_HIGH_BITS,
    FEE_BIPS_HIGH_BITS,
];

/// The packed public data of a trade
pub type PackedPublicData = [Scalar; NUM_PUBLIC_DATA_CHUNKS];

/// The fields published for a spot trade
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotTradePublicData {
    /// The replay slot id of order A
    pub storage_id_a: u64,
    /// The replay slot id of order B
    pub storage_id_b: u64,
    /// The account of order A
    pub account_id_a: u64,
    /// The account of order B
    pub account_id_b: u64,
    /// The token sold by order A
    pub token_s_a: u64,
    /// The token sold by order B
    pub token_s_b: u64,
    /// The float encoded amount sold by order A
    pub fill_s_a: Float24,
    /// The float encoded amount sold by order B
    pub fill_s_b: Float24,
    /// The fill direction of order A
    pub fill_amount_b_or_s_a: bool,
    /// The fill direction of order B
    pub fill_amount_b_or_s_b: bool,
    /// The trading fee rate of order A
    pub fee_bips_a: u64,
    /// The trading fee rate of order B
    pub fee_bips_b: u64,
    /// The token credited to A by the B to A transfer
    pub token_b_a: u64,
    /// The token credited to B by the A to B transfer
    pub token_b_b: u64,
}

impl SpotTradePublicData {
    /// The value of each field of the record, in publication order
    fn field_values(&self) -> [u64; 18] {
        let low_mask = (1 << FEE_BIPS_LOW_BITS) - 1;
        [
            self.storage_id_a,
            self.storage_id_b,
            self.account_id_a,
            self.account_id_b,
            self.token_s_a,
            self.token_s_b,
            self.fill_s_a.encoded() as u64,
            self.fill_s_b.encoded() as u64,
            self.fill_amount_b_or_s_a as u64,
            0,
            self.fee_bips_a & low_mask,
            self.fill_amount_b_or_s_b as u64,
            0,
            self.fee_bips_b & low_mask,
            self.token_b_a,
            self.token_b_b,
            self.fee_bips_a >> FEE_BIPS_LOW_BITS,
            self.fee_bips_b >> FEE_BIPS_LOW_BITS,
        ]
    }

    /// Check that every field fits its width in the record
    pub fn validate(&self) -> Result<(), SpotTradeError> {
        validate_bitlength("storage_id_a", self.storage_id_a as u128, NUM_BITS_STORAGEID)?;
        validate_bitlength("storage_id_b", self.storage_id_b as u128, NUM_BITS_STORAGEID)?;
        validate_bitlength("account_id_a", self.account_id_a as u128, NUM_BITS_ACCOUNT)?;
        validate_bitlength("account_id_b", self.account_id_b as u128, NUM_BITS_ACCOUNT)?;
        validate_bitlength("token_s_a", self.token_s_a as u128, NUM_BITS_TOKEN)?;
        validate_bitlength("token_s_b", self.token_s_b as u128, NUM_BITS_TOKEN)?;
        validate_bitlength("fee_bips_a", self.fee_bips_a as u128, NUM_BITS_BIPS)?;
        validate_bitlength("fee_bips_b", self.fee_bips_b as u128, NUM_BITS_BIPS)?;
        validate_bitlength("token_b_a", self.token_b_a as u128, NUM_BITS_TOKEN)?;
        validate_bitlength("token_b_b", self.token_b_b as u128, NUM_BITS_TOKEN)
    }

    /// Serialize the record to its bit string
    ///
    /// Values are truncated to their field widths; `validate` checks that
    /// they fit
    pub fn to_bits(&self) -> Vec<bool> {
        let mut bits = self
            .field_values()
            .into_iter()
            .zip(PUBLIC_DATA_WIDTHS)
            .flat_map(|(value, width)| (0..width).map(move |i| (value >> i) & 1 == 1))
            .collect_vec();
        bits.reverse();

        bits
    }

    /// Parse a record from its bit string
    pub fn from_bits(bits: &[bool]) -> Result<Self, SpotTradeError> {
        if bits.len() != PUBLIC_DATA_BITS {
            return Err(TypeConversionError(format!(
                "expected {PUBLIC_DATA_BITS} bits of public data, got {}",
                bits.len()
            ))
            .into());
        }

        let mut forward = bits.to_vec();
        forward.reverse();

        let mut cursor = forward.into_iter();
        let values = PUBLIC_DATA_WIDTHS.map(|width| {
            let field_bits = cursor.by_ref().take(width).enumerate();
            field_bits.fold(0u64, |acc, (i, bit)| acc | (bit as u64) << i)
        });

        let [
            storage_id_a,
            storage_id_b,
            account_id_a,
            account_id_b,
            token_s_a,
            token_s_b,
            fill_s_a,
            fill_s_b,
            fill_dir_a,
            pad_a,
            fee_low_a,
            fill_dir_b,
            pad_b,
            fee_low_b,
            token_b_a,
            token_b_b,
            fee_high_a,
            fee_high_b,
        ] = values;
        if pad_a != 0 || pad_b != 0 {
            return Err(TypeConversionError("nonzero padding in public data".to_string()).into());
        }

        Ok(Self {
            storage_id_a,
            storage_id_b,
            account_id_a,
            account_id_b,
            token_s_a,
            token_s_b,
            fill_s_a: Float24::try_from(fill_s_a as u32)?,
            fill_s_b: Float24::try_from(fill_s_b as u32)?,
            fill_amount_b_or_s_a: fill_dir_a == 1,
            fill_amount_b_or_s_b: fill_dir_b == 1,
            fee_bips_a: fee_low_a | fee_high_a << FEE_BIPS_LOW_BITS,
            fee_bips_b: fee_low_b | fee_high_b << FEE_BIPS_LOW_BITS,
            token_b_a,
            token_b_b,
        })
    }

    /// Pack the record into field elements
    pub fn pack(&self) -> PackedPublicData {
        pack_bits(&self.to_bits())
    }

    /// Unpack a record from its field elements
    pub fn unpack(packed: &PackedPublicData) -> Result<Self, SpotTradeError> {
        let bits = packed
            .iter()
            .zip(chunk_widths())
            .flat_map(|(chunk, width)| {
                let mut chunk_bits = scalar_to_bits_le(chunk, width);
                chunk_bits.reverse();
                chunk_bits
            })
            .collect_vec();

        Self::from_bits(&bits)
    }
}

/// The bit widths of the packed chunks; every chunk is full except the last
pub fn chunk_widths() -> [usize; NUM_PUBLIC_DATA_CHUNKS] {
    std::array::from_fn(|i| {
        PUBLIC_DATA_CHUNK_BITS.min(PUBLIC_DATA_BITS - i * PUBLIC_DATA_CHUNK_BITS)
    })
}

/// Pack a bit string into field elements, most significant bit first
pub fn pack_bits(bits: &[bool]) -> PackedPublicData {
    let mut chunks = bits.chunks(PUBLIC_DATA_CHUNK_BITS);
    std::array::from_fn(|_| {
        let mut chunk = chunks.next().unwrap_or_default().to_vec();
        chunk.reverse();
        scalar_from_bits_le(&chunk)
    })
}
