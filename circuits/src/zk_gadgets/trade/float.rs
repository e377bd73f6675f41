//! Decodes a float encoded fill into the amount it represents
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_macros::circuit_type;
use circuit_types::{
    Amount, PlonkCircuit,
    errors::{SpotTradeError, TypeConversionError},
    float::Float24,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_bitlength,
};
use constants::{
    FLOAT24_BITS, FLOAT24_EXPONENT_BASE, FLOAT24_EXPONENT_BITS, FLOAT24_MANTISSA_BITS,
    FLOAT24_MIN_SCALED_MANTISSA, NUM_BITS_AMOUNT, Scalar, ScalarField,
};
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};

use crate::zk_gadgets::{
    TradeGadget,
    bits::{BitRangeGadget, ToBitsGadget, bit_reconstruct},
    comparators::{EqZeroGadget, GreaterThanEqGadget},
};

/// A decoded fill and the most its encoding may have rounded off
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DecodedFill {
    /// The amount the float represents
    pub amount: Amount,
    /// `10^exponent - 1`
    pub rounding: Amount,
}

/// Decodes a canonical `Float24` into `mantissa * 10^exponent`
///
/// The exponent is applied as a product of the powers `10^(2^i)` selected by
/// its bits, and the decoded amount is range checked to an amount's width. A
/// nonzero exponent requires a mantissa of at least `2^19 / 10`, which bounds
/// the rounding by the amount itself.
pub struct FillDecoderGadget;
impl TradeGadget for FillDecoderGadget {
    type Input = Float24;
    type Output = DecodedFill;

    fn evaluate(input: &Float24) -> Result<DecodedFill, SpotTradeError> {
        if !input.is_canonical() {
            let err = format!("fill encoding {:#x} is not canonical", input.encoded());
            return Err(TypeConversionError(err).into());
        }

        let amount = input.decode();
        validate_bitlength("fill", amount, NUM_BITS_AMOUNT)?;
        Ok(DecodedFill { amount, rounding: input.rounding() })
    }

    fn constrain(input: &Variable, cs: &mut PlonkCircuit) -> Result<DecodedFillVar, CircuitError> {
        let bits = ToBitsGadget::<FLOAT24_BITS>::to_bits(*input, cs)?;
        let (mantissa_bits, exponent_bits) = bits.split_at(FLOAT24_MANTISSA_BITS);
        debug_assert_eq!(exponent_bits.len(), FLOAT24_EXPONENT_BITS);

        // mantissa >= (exponent != 0) * 2^19 / 10
        let mantissa = bit_reconstruct(mantissa_bits, cs)?;
        let exponent = bit_reconstruct(exponent_bits, cs)?;
        let exponent_zero = EqZeroGadget::eq_zero(&exponent, cs)?;
        let scaled = cs.logic_neg(exponent_zero)?;
        let min_mantissa =
            cs.mul_constant(scaled.into(), &ScalarField::from(FLOAT24_MIN_SCALED_MANTISSA))?;
        GreaterThanEqGadget::constrain_greater_than_eq(
            mantissa,
            min_mantissa,
            FLOAT24_MANTISSA_BITS,
            cs,
        )?;
        let mut multiplier = cs.one();
        let mut power = ScalarField::from(FLOAT24_EXPONENT_BASE);
        for bit in exponent_bits {
            let scaled = cs.mul_constant(multiplier, &power)?;
            multiplier = cs.mux(*bit, scaled, multiplier)?;
            power = power * power;
        }

        let amount = cs.mul(mantissa, multiplier)?;
        BitRangeGadget::constrain_bit_range(amount, NUM_BITS_AMOUNT, cs)?;

        let one = cs.one();
        let rounding = cs.sub(multiplier, one)?;
        Ok(DecodedFillVar { amount, rounding })
    }
}

#[cfg(test)]
mod test {
    use circuit_types::{
        PlonkCircuit,
        errors::{SpotTradeError, TypeConversionError},
        float::Float24,
        test_helpers::random_amount,
        traits::CircuitBaseType,
    };
    use constants::{FLOAT24_BITS, NUM_BITS_AMOUNT};
    use eyre::Result;
    use mpc_relation::traits::Circuit;

    use super::{DecodedFill, FillDecoderGadget};
    use crate::zk_gadgets::{
        TradeGadget,
        test_helpers::{assert_gadget_accepts, assert_gadget_rejects},
    };

    /// Test the decoder against the native decoding on random amounts
    #[test]
    fn test_decode_random() -> Result<()> {
        for _ in 0..5 {
            let float = Float24::encode(random_amount())?;
            let decoded = assert_gadget_accepts::<FillDecoderGadget>(&float)?;
            assert_eq!(decoded.amount, float.decode());
            assert_eq!(decoded.rounding, float.rounding());
        }

        Ok(())
    }

    #[test]
    fn test_decode_exponent_boundaries() -> Result<()> {
        let zero = Float24::encode(0)?;
        let decoded = assert_gadget_accepts::<FillDecoderGadget>(&zero)?;
        assert_eq!(decoded, DecodedFill { amount: 0, rounding: 0 });

        // The largest mantissa with exponent 9 exercises every exponent bit
        // used by 96 bit amounts
        let float = Float24::try_from((9 << 19) | 0x7ffff)?;
        let decoded = assert_gadget_accepts::<FillDecoderGadget>(&float)?;
        let expected = DecodedFill { amount: 0x7ffff * 10u128.pow(9), rounding: 999_999_999 };
        assert_eq!(decoded, expected);
        Ok(())
    }

    /// A small mantissa scaled up by the exponent would round off more than
    /// the encoding's precision, so it is rejected
    #[test]
    fn test_non_canonical() -> Result<()> {
        // 1 * 10^5, which `encode` writes with a zero exponent
        let float = Float24::try_from((5 << 19) | 1)?;
        let err = assert_gadget_rejects::<FillDecoderGadget>(&float)?;
        assert!(matches!(err, SpotTradeError::InvalidFloat(TypeConversionError(_))));

        // The smallest scaled mantissa is accepted
        let float = Float24::try_from((1 << 19) | 52_428)?;
        let decoded = assert_gadget_accepts::<FillDecoderGadget>(&float)?;
        assert_eq!(decoded, DecodedFill { amount: 524_280, rounding: 9 });

        let float = Float24::try_from((1 << 19) | 52_427)?;
        assert_gadget_rejects::<FillDecoderGadget>(&float)?;
        Ok(())
    }

    /// A float decoding past an amount's width is rejected
    #[test]
    fn test_decode_overflow() -> Result<()> {
        let float = Float24::try_from((1 << FLOAT24_BITS) - 1)?;
        let err = assert_gadget_rejects::<FillDecoderGadget>(&float)?;
        assert_eq!(err, SpotTradeError::RangeCheck { field: "fill", bits: NUM_BITS_AMOUNT });
        Ok(())
    }

    /// An encoding wider than 24 bits cannot be decoded
    #[test]
    fn test_wide_encoding() -> Result<()> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let raw = (1u64 << FLOAT24_BITS).create_witness(&mut cs)?;
        FillDecoderGadget::constrain(&raw, &mut cs)?;

        assert!(cs.check_circuit_satisfiability(&[]).is_err());
        Ok(())
    }
}
