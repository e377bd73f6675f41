//! A compact decimal floating point encoding for fill amounts
//!
//! A `Float24` packs a 19 bit mantissa `m` and a 5 bit decimal exponent `e`
//! as `e * 2^19 + m`, representing the value `m * 10^e`. Encoding rounds
//! down and only raises the exponent while the mantissa overflows, so the
//! decoded value `v'` of `v` satisfies `v - v' < 10^e <= v / 52428`, a
//! relative error below `2^-15`. Only canonical encodings, whose mantissa is
//! at least 52428 whenever the exponent is nonzero, carry this bound.

use constants::{
    FLOAT24_BITS, FLOAT24_EXPONENT_BASE, FLOAT24_EXPONENT_BITS, FLOAT24_MANTISSA_BITS,
    FLOAT24_MIN_SCALED_MANTISSA, Scalar,
};
use mpc_relation::Variable;
use serde::{Deserialize, Serialize};
use trade_crypto::fields::scalar_to_u64;

use crate::{
    Amount,
    errors::TypeConversionError,
    traits::{BaseType, CircuitBaseType},
};

/// The largest mantissa a `Float24` may carry
const MAX_MANTISSA: u64 = (1 << FLOAT24_MANTISSA_BITS) - 1;
/// The largest exponent a `Float24` may carry
const MAX_EXPONENT: u32 = (1 << FLOAT24_EXPONENT_BITS) - 1;
/// The mask of the bits a `Float24` encoding occupies
const ENCODING_MASK: u64 = (1 << FLOAT24_BITS) - 1;

/// A float encoded amount
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Float24(u32);

impl Float24 {
    /// Encode an amount, rounding down to the nearest representable value
    pub fn encode(value: Amount) -> Result<Self, TypeConversionError> {
        let mut mantissa = value;
        let mut exponent = 0u32;
        while mantissa > MAX_MANTISSA as Amount {
            mantissa /= FLOAT24_EXPONENT_BASE as Amount;
            exponent += 1;
        }

        if exponent > MAX_EXPONENT {
            return Err(TypeConversionError(format!("{value} is too large for a Float24")));
        }

        Ok(Self((exponent << FLOAT24_MANTISSA_BITS) | mantissa as u32))
    }

    /// Encode an amount, failing if it is not exactly representable
    pub fn encode_exact(value: Amount) -> Result<Self, TypeConversionError> {
        let float = Self::encode(value)?;
        if float.decode() != value {
            return Err(TypeConversionError(format!("{value} is not exactly representable")));
        }

        Ok(float)
    }

    /// Decode the float into the amount it represents
    pub fn decode(&self) -> Amount {
        self.mantissa() as Amount * (FLOAT24_EXPONENT_BASE as Amount).pow(self.exponent())
    }

    /// The most the encoding may have rounded off the amount it encodes,
    /// `10^e - 1`
    pub fn rounding(&self) -> Amount {
        (FLOAT24_EXPONENT_BASE as Amount).pow(self.exponent()) - 1
    }

    /// Whether the float is in the form `encode` produces
    pub fn is_canonical(&self) -> bool {
        self.exponent() == 0 || self.mantissa() >= FLOAT24_MIN_SCALED_MANTISSA
    }

    /// The raw 24 bit encoding
    pub fn encoded(&self) -> u32 {
        self.0
    }

    /// The mantissa of the float
    pub fn mantissa(&self) -> u64 {
        self.0 as u64 & MAX_MANTISSA
    }

    /// The decimal exponent of the float
    pub fn exponent(&self) -> u32 {
        self.0 >> FLOAT24_MANTISSA_BITS
    }
}

impl TryFrom<u32> for Float24 {
    type Error = TypeConversionError;

    fn try_from(encoded: u32) -> Result<Self, Self::Error> {
        if encoded >> FLOAT24_BITS != 0 {
            return Err(TypeConversionError(format!(
                "encoding {encoded:#x} exceeds {FLOAT24_BITS} bits"
            )));
        }

        Ok(Self(encoded))
    }
}

impl From<Float24> for u32 {
    fn from(float: Float24) -> Self {
        float.0
    }
}

// A float is allocated as its raw encoding; the decoder gadget range checks it
impl BaseType for Float24 {
    const NUM_SCALARS: usize = 1;

    fn to_scalars(&self) -> Vec<Scalar> {
        vec![Scalar::from(self.0 as u64)]
    }

    fn from_scalars<I: Iterator<Item = Scalar>>(i: &mut I) -> Self {
        let raw = scalar_to_u64(&i.next().expect("from_scalars: Invalid number of scalars"));
        Self((raw & ENCODING_MASK) as u32)
    }
}

impl CircuitBaseType for Float24 {
    type VarType = Variable;
}

#[cfg(test)]
mod test {
    use rand::{Rng, thread_rng};

    use super::*;

    #[test]
    fn test_small_values_exact() {
        for value in [0, 1, 100, MAX_MANTISSA as Amount] {
            let float = Float24::encode(value).unwrap();
            assert_eq!(float.exponent(), 0);
            assert_eq!(float.decode(), value);
        }
    }

    #[test]
    fn test_encode_rounds_down() {
        let value: Amount = 1_234_567_891;
        let float = Float24::encode(value).unwrap();

        assert_eq!(float.mantissa(), 123_456);
        assert_eq!(float.exponent(), 4);
        assert_eq!(float.decode(), 1_234_560_000);
        assert_eq!(float.rounding(), 9_999);
        assert!(Float24::encode_exact(value).is_err());

        let exact = Float24::encode(MAX_MANTISSA as Amount).unwrap();
        assert_eq!(exact.rounding(), 0);
    }

    /// Every encoded value is canonical, while a small mantissa under a
    /// nonzero exponent is not
    #[test]
    fn test_canonical_form() {
        let mut rng = thread_rng();
        for _ in 0..100 {
            let value: Amount = rng.gen_range(0..1 << 96);
            assert!(Float24::encode(value).unwrap().is_canonical());
        }

        // The smallest value that needs an exponent
        let float = Float24::encode(MAX_MANTISSA as Amount + 1).unwrap();
        assert_eq!(float.mantissa(), FLOAT24_MIN_SCALED_MANTISSA);

        let scaled_one = Float24::try_from((1 << FLOAT24_MANTISSA_BITS) | 1).unwrap();
        assert!(!scaled_one.is_canonical());
    }

    /// The rounding error stays within the documented bound
    #[test]
    fn test_precision_bound() {
        let mut rng = thread_rng();
        for _ in 0..100 {
            let value: Amount = rng.gen_range(1 << 19..1 << 96);
            let decoded = Float24::encode(value).unwrap().decode();

            assert!(decoded <= value);
            assert!((value - decoded) << 15 < value);
        }
    }

    #[test]
    fn test_raw_encoding_bounds() {
        assert!(Float24::try_from((1u32 << FLOAT24_BITS) - 1).is_ok());
        assert!(Float24::try_from(1u32 << FLOAT24_BITS).is_err());

        let max = Float24::try_from((1u32 << FLOAT24_BITS) - 1).unwrap();
        assert_eq!(max.mantissa(), MAX_MANTISSA);
        assert_eq!(max.exponent(), MAX_EXPONENT);
    }

    /// Scalars wider than an encoding are truncated to 24 bits, keeping the
    /// exponent within the range `decode` supports
    #[test]
    fn test_from_wide_scalar() {
        let raw = (1u64 << 40) | (1 << 30) | ((1u64 << FLOAT24_BITS) - 1);
        let float = Float24::from_scalars(&mut [Scalar::from(raw)].into_iter());

        assert_eq!(float.encoded(), (1 << FLOAT24_BITS) - 1);
        assert_eq!(float.exponent(), MAX_EXPONENT);
        assert_eq!(float.decode(), MAX_MANTISSA as Amount * 10u128.pow(MAX_EXPONENT));
    }
}
