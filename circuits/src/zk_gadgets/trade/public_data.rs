//! Serializes and packs the published fields of a trade
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use circuit_types::{
    PlonkCircuit,
    errors::SpotTradeError,
    public_data::{
        FEE_BIPS_LOW_BITS, PackedPublicData, SpotTradePublicData, SpotTradePublicDataVar,
    },
    traits::{CircuitBaseType, CircuitVarType},
};
use constants::{
    FLOAT24_BITS, NUM_BITS_ACCOUNT, NUM_BITS_BIPS, NUM_BITS_STORAGEID, NUM_BITS_TOKEN,
    PUBLIC_DATA_CHUNK_BITS,
};
use itertools::Itertools;
use mpc_relation::{BoolVar, Variable, errors::CircuitError, traits::Circuit};

use crate::zk_gadgets::{
    TradeGadget,
    bits::{bit_reconstruct_be, decompose},
};

/// Packs the public data record into field elements
///
/// Decomposing each field into exactly its published width range checks it
pub struct PublicDataGadget;
impl PublicDataGadget {
    /// Serialize the record to its bit string, most significant bit first
    fn to_bits(
        data: &SpotTradePublicDataVar,
        cs: &mut PlonkCircuit,
    ) -> Result<Vec<BoolVar>, CircuitError> {
        let padding = cs.false_var();
        let fee_bits_a = decompose(data.fee_bips_a, NUM_BITS_BIPS, cs)?;
        let fee_bits_b = decompose(data.fee_bips_b, NUM_BITS_BIPS, cs)?;
        let (fee_low_a, fee_high_a) = fee_bits_a.split_at(FEE_BIPS_LOW_BITS);
        let (fee_low_b, fee_high_b) = fee_bits_b.split_at(FEE_BIPS_LOW_BITS);

        let mut bits = Vec::new();
        for (value, width) in [
            (data.storage_id_a, NUM_BITS_STORAGEID),
            (data.storage_id_b, NUM_BITS_STORAGEID),
            (data.account_id_a, NUM_BITS_ACCOUNT),
            (data.account_id_b, NUM_BITS_ACCOUNT),
            (data.token_s_a, NUM_BITS_TOKEN),
            (data.token_s_b, NUM_BITS_TOKEN),
            (data.fill_s_a, FLOAT24_BITS),
            (data.fill_s_b, FLOAT24_BITS),
        ] {
            bits.extend(decompose(value, width, cs)?);
        }

        bits.extend(decompose(data.fill_amount_b_or_s_a.into(), 1, cs)?);
        bits.push(padding);
        bits.extend_from_slice(fee_low_a);
        bits.extend(decompose(data.fill_amount_b_or_s_b.into(), 1, cs)?);
        bits.push(padding);
        bits.extend_from_slice(fee_low_b);
        bits.extend(decompose(data.token_b_a, NUM_BITS_TOKEN, cs)?);
        bits.extend(decompose(data.token_b_b, NUM_BITS_TOKEN, cs)?);
        bits.extend_from_slice(fee_high_a);
        bits.extend_from_slice(fee_high_b);

        bits.reverse();
        Ok(bits)
    }
}

impl TradeGadget for PublicDataGadget {
    type Input = SpotTradePublicData;
    type Output = PackedPublicData;

    fn evaluate(input: &SpotTradePublicData) -> Result<PackedPublicData, SpotTradeError> {
        input.validate()?;
        Ok(input.pack())
    }

    fn constrain(
        input: &SpotTradePublicDataVar,
        cs: &mut PlonkCircuit,
    ) -> Result<<PackedPublicData as CircuitBaseType>::VarType, CircuitError> {
        let bits = Self::to_bits(input, cs)?;
        let chunks = bits
            .chunks(PUBLIC_DATA_CHUNK_BITS)
            .map(|chunk| bit_reconstruct_be(chunk, cs))
            .collect::<Result<Vec<Variable>, _>>()?;

        Ok(CircuitVarType::from_vars(&mut chunks.into_iter()))
    }
}

#[cfg(test)]
mod test {
    use circuit_types::{errors::SpotTradeError, float::Float24, public_data::SpotTradePublicData};
    use constants::{NFT_TOKEN_ID_START, NUM_BITS_TOKEN};
    use eyre::Result;

    use super::PublicDataGadget;
    use crate::zk_gadgets::test_helpers::{assert_gadget_accepts, assert_gadget_rejects};

    fn public_data() -> Result<SpotTradePublicData> {
        Ok(SpotTradePublicData {
            storage_id_a: 0xdead_beef,
            storage_id_b: 17,
            account_id_a: 12,
            account_id_b: u32::MAX as u64,
            token_s_a: 3,
            token_s_b: NFT_TOKEN_ID_START + 2,
            fill_s_a: Float24::encode(1_234_567_891)?,
            fill_s_b: Float24::encode(1)?,
            fill_amount_b_or_s_a: true,
            fill_amount_b_or_s_b: false,
            fee_bips_a: 0b1011_0110,
            fee_bips_b: 20,
            token_b_a: NFT_TOKEN_ID_START + 2,
            token_b_b: 3,
        })
    }

    /// The circuit packs the record exactly as it is packed natively
    #[test]
    fn test_packing_matches() -> Result<()> {
        let data = public_data()?;
        let packed = assert_gadget_accepts::<PublicDataGadget>(&data)?;
        assert_eq!(SpotTradePublicData::unpack(&packed)?, data);

        assert_gadget_accepts::<PublicDataGadget>(&SpotTradePublicData::default())?;
        Ok(())
    }

    #[test]
    fn test_field_overflow() -> Result<()> {
        let data = SpotTradePublicData { token_b_b: 1 << NUM_BITS_TOKEN, ..public_data()? };
        let err = assert_gadget_rejects::<PublicDataGadget>(&data)?;
        assert_eq!(err, SpotTradeError::RangeCheck { field: "token_b_b", bits: NUM_BITS_TOKEN });

        let data = SpotTradePublicData { fee_bips_a: 256, ..public_data()? };
        assert_gadget_rejects::<PublicDataGadget>(&data)?;
        Ok(())
    }
}
