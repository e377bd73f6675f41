//! Moves NFT data alongside a transfer between two token slots
#![allow(missing_docs, clippy::missing_docs_in_private_items)]

use ark_ff::Zero;
use circuit_macros::circuit_type;
use circuit_types::{
    Amount, PlonkCircuit,
    errors::SpotTradeError,
    is_nft_token,
    traits::{BaseType, CircuitBaseType, CircuitVarType},
    validate_bitlength,
};
use constants::{NUM_BITS_TOKEN, Scalar, ScalarField};
use mpc_relation::{Variable, errors::CircuitError, traits::Circuit};

use crate::zk_gadgets::{
    TradeGadget, comparators::EqZeroGadget, select::CondSelectGadget, trade::order::NftTokenGadget,
};

/// The two slots a transfer moves between
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenTradeDataInput {
    /// The token debited
    pub from_token: u64,
    /// The weight of the debited slot
    pub from_weight: Scalar,
    /// The debited balance after the transfer
    pub from_balance_after: Amount,
    /// The token credited
    pub to_token: u64,
    /// The weight of the credited slot
    pub to_weight: Scalar,
    /// The NFT data the receiving order expects
    pub expected_nft_data: Scalar,
}

/// The weights of the two slots after the transfer
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenTradeData {
    /// The new weight of the debited slot
    pub from_weight: Scalar,
    /// The new weight of the credited slot
    pub to_weight: Scalar,
    /// The credited token as published
    pub to_token_da: u64,
}

/// Checks the token classes of a transfer and derives the new slot weights
///
/// Fungible transfers stay within one token and leave the weights to the AMM
/// derivation. An NFT transfer carries the debited slot's data into the
/// credited slot, which must be empty or already hold the same data, and
/// clears the debited slot once it is emptied.
pub struct TokenTradeDataGadget;
impl TradeGadget for TokenTradeDataGadget {
    type Input = TokenTradeDataInput;
    type Output = TokenTradeData;

    fn evaluate(input: &TokenTradeDataInput) -> Result<TokenTradeData, SpotTradeError> {
        validate_bitlength("from_token", input.from_token as u128, NUM_BITS_TOKEN)?;
        validate_bitlength("to_token", input.to_token as u128, NUM_BITS_TOKEN)?;

        let is_nft = is_nft_token(input.from_token);
        let token_mismatch = if is_nft {
            !is_nft_token(input.to_token)
        } else {
            input.from_token != input.to_token
        };
        if token_mismatch {
            let (from, to) = (input.from_token, input.to_token);
            return Err(SpotTradeError::TokenMismatch { from, to });
        }

        if !is_nft {
            return Ok(TokenTradeData {
                from_weight: input.from_weight,
                to_weight: input.to_weight,
                to_token_da: input.to_token,
            });
        }

        if input.from_weight != input.expected_nft_data {
            return Err(SpotTradeError::NftDataMismatch(format!(
                "token {} does not hold the NFT the order expects",
                input.from_token
            )));
        }

        if input.to_weight != Scalar::zero() && input.to_weight != input.from_weight {
            return Err(SpotTradeError::NftDataMismatch(format!(
                "token {} already holds a different NFT",
                input.to_token
            )));
        }

        let from_weight =
            if input.from_balance_after == 0 { Scalar::zero() } else { input.from_weight };
        Ok(TokenTradeData {
            from_weight,
            to_weight: input.from_weight,
            to_token_da: input.to_token,
        })
    }

    fn constrain(
        input: &TokenTradeDataInputVar,
        cs: &mut PlonkCircuit,
    ) -> Result<TokenTradeDataVar, CircuitError> {
        let is_nft = NftTokenGadget::is_nft(input.from_token, cs)?;
        let is_nft_to = NftTokenGadget::is_nft(input.to_token, cs)?;
        cs.enforce_equal(is_nft.into(), is_nft_to.into())?;

        // Fungible transfers stay within a single token
        let is_fungible = cs.logic_neg(is_nft)?;
        let token_diff = cs.sub(input.from_token, input.to_token)?;
        let fungible_diff = cs.mul(is_fungible.into(), token_diff)?;
        cs.enforce_constant(fungible_diff, ScalarField::zero())?;

        // The debited slot holds the expected NFT
        let data_diff = cs.sub(input.from_weight, input.expected_nft_data)?;
        let nft_data_diff = cs.mul(is_nft.into(), data_diff)?;
        cs.enforce_constant(nft_data_diff, ScalarField::zero())?;

        // The credited slot is empty or holds the same NFT
        let weight_diff = cs.sub(input.to_weight, input.from_weight)?;
        let occupied = cs.mul(input.to_weight, weight_diff)?;
        let nft_occupied = cs.mul(is_nft.into(), occupied)?;
        cs.enforce_constant(nft_occupied, ScalarField::zero())?;

        let emptied = EqZeroGadget::eq_zero(&input.from_balance_after, cs)?;
        let kept = cs.logic_neg(emptied)?;
        let nft_from_weight = CondSelectGadget::select_or_zero(&input.from_weight, kept, cs)?;
        let from_weight =
            CondSelectGadget::select(&nft_from_weight, &input.from_weight, is_nft, cs)?;
        let to_weight = CondSelectGadget::select(&input.from_weight, &input.to_weight, is_nft, cs)?;

        Ok(TokenTradeDataVar { from_weight, to_weight, to_token_da: input.to_token })
    }
}

#[cfg(test)]
mod test {
    use circuit_types::{errors::SpotTradeError, test_helpers::random_scalar};
    use constants::{NFT_TOKEN_ID_START, Scalar};
    use eyre::Result;

    use super::{TokenTradeData, TokenTradeDataGadget, TokenTradeDataInput};
    use crate::zk_gadgets::test_helpers::{assert_gadget_accepts, assert_gadget_rejects};

    /// A transfer of one NFT out of a slot holding two
    fn nft_input() -> TokenTradeDataInput {
        let data = random_scalar();
        TokenTradeDataInput {
            from_token: NFT_TOKEN_ID_START + 3,
            from_weight: data,
            from_balance_after: 1,
            to_token: NFT_TOKEN_ID_START + 9,
            to_weight: Scalar::zero(),
            expected_nft_data: data,
        }
    }

    #[test]
    fn test_fungible_pass_through() -> Result<()> {
        let input = TokenTradeDataInput {
            from_token: 4,
            from_weight: Scalar::from(1000u64),
            from_balance_after: 0,
            to_token: 4,
            to_weight: Scalar::from(2000u64),
            expected_nft_data: random_scalar(),
        };

        let output = assert_gadget_accepts::<TokenTradeDataGadget>(&input)?;
        assert_eq!(
            output,
            TokenTradeData {
                from_weight: Scalar::from(1000u64),
                to_weight: Scalar::from(2000u64),
                to_token_da: 4,
            }
        );
        Ok(())
    }

    #[test]
    fn test_nft_transfer() -> Result<()> {
        let input = nft_input();
        let output = assert_gadget_accepts::<TokenTradeDataGadget>(&input)?;
        assert_eq!(output.from_weight, input.from_weight);
        assert_eq!(output.to_weight, input.from_weight);
        assert_eq!(output.to_token_da, input.to_token);

        // Emptying the slot clears its data
        let emptied = TokenTradeDataInput { from_balance_after: 0, ..input.clone() };
        let output = assert_gadget_accepts::<TokenTradeDataGadget>(&emptied)?;
        assert_eq!(output.from_weight, Scalar::zero());

        // The credited slot may already hold the same NFT
        let topped_up = TokenTradeDataInput { to_weight: input.from_weight, ..input };
        assert_gadget_accepts::<TokenTradeDataGadget>(&topped_up)?;
        Ok(())
    }

    #[test]
    fn test_token_mismatch() -> Result<()> {
        let fungible = TokenTradeDataInput { from_token: 4, to_token: 5, ..Default::default() };
        let err = assert_gadget_rejects::<TokenTradeDataGadget>(&fungible)?;
        assert_eq!(err, SpotTradeError::TokenMismatch { from: 4, to: 5 });

        let mixed = TokenTradeDataInput { to_token: 5, ..nft_input() };
        let err = assert_gadget_rejects::<TokenTradeDataGadget>(&mixed)?;
        assert!(matches!(err, SpotTradeError::TokenMismatch { .. }));
        Ok(())
    }

    #[test]
    fn test_nft_data_mismatch() -> Result<()> {
        let wrong_nft = TokenTradeDataInput { expected_nft_data: random_scalar(), ..nft_input() };
        let err = assert_gadget_rejects::<TokenTradeDataGadget>(&wrong_nft)?;
        assert!(matches!(err, SpotTradeError::NftDataMismatch(_)));

        let occupied = TokenTradeDataInput { to_weight: random_scalar(), ..nft_input() };
        let err = assert_gadget_rejects::<TokenTradeDataGadget>(&occupied)?;
        assert!(matches!(err, SpotTradeError::NftDataMismatch(_)));
        Ok(())
    }
}
