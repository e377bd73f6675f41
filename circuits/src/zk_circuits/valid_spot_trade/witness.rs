//! Native witness generation for `VALID SPOT TRADE`
//!
//! Computes the state writes and public data of a trade with the native half
//! of each gadget, in the order the circuit applies them. A trade the circuit
//! would not be satisfiable on is rejected with the first failing check.

use circuit_types::{
    Amount,
    account::{AccountUpdate, FeeAccountUpdate},
    balance::BalanceUpdate,
    errors::SpotTradeError,
    fee::FeeTake,
    public_data::{PackedPublicData, SpotTradePublicData},
    spot_trade::{SpotTradeUpdates, TradeParameters},
    storage::StorageUpdate,
};
use tracing::{debug, instrument, warn};

use super::{ValidSpotTradeStatement, ValidSpotTradeWitness};
use crate::zk_gadgets::{
    TradeGadget,
    trade::{
        amm::{AmmGadget, AmmInput},
        fee::{FeeGadget, FeeInput, ProtocolFeeGadget, ProtocolFeeInput},
        float::FillDecoderGadget,
        matching::{OrderMatchInput, OrderMatchingGadget},
        order::{DecodedOrder, OrderDecodeInput, OrderDecoderGadget},
        public_data::PublicDataGadget,
        storage::{ReplaySlotGadget, ReplaySlotInput},
        token_data::{TokenTradeDataGadget, TokenTradeDataInput},
        transfer::{BalanceTransferGadget, TransferInput},
    },
};

/// Generates the statement values of a spot trade
pub struct SpotTradeWitnessGenerator;
impl SpotTradeWitnessGenerator {
    /// Compute the state writes and packed public data of a trade
    #[instrument(
        name = "generate_spot_trade",
        skip_all,
        fields(
            account_a = witness.trade.order_a.account_id,
            account_b = witness.trade.order_b.account_id,
        )
    )]
    pub fn generate(
        witness: &ValidSpotTradeWitness,
        params: &TradeParameters,
    ) -> Result<(SpotTradeUpdates, PackedPublicData), SpotTradeError> {
        match Self::derive(witness, params) {
            Ok(res) => {
                debug!(
                    fill_a = res.0.storage_a.data,
                    fill_b = res.0.storage_b.data,
                    "spot trade accepted"
                );
                Ok(res)
            },
            Err(e) => {
                warn!("spot trade rejected: {e}");
                Err(e)
            },
        }
    }

    /// Compute the full statement of a trade
    pub fn statement(
        witness: &ValidSpotTradeWitness,
        params: &TradeParameters,
    ) -> Result<ValidSpotTradeStatement, SpotTradeError> {
        let (updates, public_data) = Self::generate(witness, params)?;
        Ok(ValidSpotTradeStatement { params: params.clone(), updates, public_data })
    }

    /// Evaluate every gadget of the relation natively
    fn derive(
        witness: &ValidSpotTradeWitness,
        params: &TradeParameters,
    ) -> Result<(SpotTradeUpdates, PackedPublicData), SpotTradeError> {
        params.validate()?;
        let trade = &witness.trade;
        let (order_a, order_b) = (&trade.order_a, &trade.order_b);
        let (account_a, account_b) = (&witness.account_a, &witness.account_b);

        // 1. Decode the orders and fills, and read the replay slots
        let decoded_a = OrderDecoderGadget::evaluate(&OrderDecodeInput {
            order: order_a.clone(),
            exchange: params.exchange.clone(),
        })?;
        let decoded_b = OrderDecoderGadget::evaluate(&OrderDecodeInput {
            order: order_b.clone(),
            exchange: params.exchange.clone(),
        })?;
        let decoded_fill_a = FillDecoderGadget::evaluate(&trade.fill_s_a)?;
        let decoded_fill_b = FillDecoderGadget::evaluate(&trade.fill_s_b)?;
        let (fill_a, fill_b) = (decoded_fill_a.amount, decoded_fill_b.amount);

        let slot_a = ReplaySlotGadget::evaluate(&ReplaySlotInput {
            leaf: account_a.storage.clone(),
            storage_id: order_a.storage_id,
        })?;
        let slot_b = ReplaySlotGadget::evaluate(&ReplaySlotInput {
            leaf: account_b.storage.clone(),
            storage_id: order_b.storage_id,
        })?;

        // 2. Match the orders
        let filled_after_a = OrderMatchingGadget::evaluate(&OrderMatchInput {
            order: order_a.clone(),
            fill_s: fill_a,
            fill_b,
            fill_b_rounding: decoded_fill_b.rounding,
            filled: slot_a.filled,
            timestamp: params.timestamp,
            counterparty: account_b.owner.clone(),
        })?;
        let filled_after_b = OrderMatchingGadget::evaluate(&OrderMatchInput {
            order: order_b.clone(),
            fill_s: fill_b,
            fill_b: fill_a,
            fill_b_rounding: decoded_fill_a.rounding,
            filled: slot_b.filled,
            timestamp: params.timestamp,
            counterparty: account_a.owner.clone(),
        })?;
        Self::check_nft_fill(&decoded_a, order_a.token_b, fill_b)?;
        Self::check_nft_fill(&decoded_b, order_b.token_b, fill_a)?;

        // 3. Compute the fees on each leg
        let protocol_a = ProtocolFeeGadget::evaluate(&ProtocolFeeInput {
            protocol_fee_bips: params.protocol_taker_fee_bips,
            is_nft_token_b: decoded_a.is_nft_token_b,
            is_nft_token_s_and_b: decoded_a.is_nft_token_s_and_b,
        })?;
        let protocol_b = ProtocolFeeGadget::evaluate(&ProtocolFeeInput {
            protocol_fee_bips: params.protocol_maker_fee_bips,
            is_nft_token_b: decoded_b.is_nft_token_b,
            is_nft_token_s_and_b: decoded_b.is_nft_token_s_and_b,
        })?;

        let fee_sa = Self::fee(fill_a, decoded_a.fee_bips_s, protocol_a.fee_bips_s)?;
        let fee_ba = Self::fee(fill_b, decoded_a.fee_bips_b, protocol_a.fee_bips_b)?;
        let fee_sb = Self::fee(fill_b, decoded_b.fee_bips_s, protocol_b.fee_bips_s)?;
        let fee_bb = Self::fee(fill_a, decoded_b.fee_bips_b, protocol_b.fee_bips_b)?;

        // 4. Move the balances
        let mut balance_s_a = account_a.balance_s.balance;
        let mut balance_b_a = account_a.balance_b.balance;
        let mut balance_s_b = account_b.balance_s.balance;
        let mut balance_b_b = account_b.balance_b.balance;
        let mut operator_a = witness.operator.balance_a;
        let mut operator_b = witness.operator.balance_b;
        let mut pool_a = witness.pool.balance_a;
        let mut pool_b = witness.pool.balance_b;

        Self::transfer(&mut balance_s_a, &mut balance_b_b, fill_a)?;
        Self::transfer(&mut balance_s_b, &mut balance_b_a, fill_b)?;

        Self::transfer(&mut balance_s_a, &mut operator_a, fee_sa.fee)?;
        Self::transfer(&mut balance_b_a, &mut operator_b, fee_ba.fee)?;
        Self::transfer(&mut balance_s_b, &mut operator_b, fee_sb.fee)?;
        Self::transfer(&mut balance_b_b, &mut operator_a, fee_bb.fee)?;

        Self::transfer(&mut operator_a, &mut pool_a, fee_sa.protocol_fee)?;
        Self::transfer(&mut operator_b, &mut pool_b, fee_ba.protocol_fee)?;
        Self::transfer(&mut operator_b, &mut pool_b, fee_sb.protocol_fee)?;
        Self::transfer(&mut operator_a, &mut pool_a, fee_bb.protocol_fee)?;

        // 5. Derive the new weights of the trading balances
        let token_data_ab = TokenTradeDataGadget::evaluate(&TokenTradeDataInput {
            from_token: order_a.token_s,
            from_weight: account_a.balance_s.weight,
            from_balance_after: balance_s_a,
            to_token: order_b.token_b,
            to_weight: account_b.balance_b.weight,
            expected_nft_data: order_b.nft_data_b,
        })?;
        let token_data_ba = TokenTradeDataGadget::evaluate(&TokenTradeDataInput {
            from_token: order_b.token_s,
            from_weight: account_b.balance_s.weight,
            from_balance_after: balance_s_b,
            to_token: order_a.token_b,
            to_weight: account_a.balance_b.weight,
            expected_nft_data: order_a.nft_data_b,
        })?;

        let weights_a = AmmGadget::evaluate(&AmmInput {
            amm: order_a.amm,
            fee_bips: order_a.fee_bips,
            fee_bips_amm: account_a.fee_bips_amm,
            is_nft_token_s: decoded_a.is_nft_token_s,
            is_nft_token_b: decoded_a.is_nft_token_b,
            fill_s: fill_a,
            fill_b,
            virtual_balance_s: account_a.balance_s.weight,
            virtual_balance_b: account_a.balance_b.weight,
            weight_s: token_data_ab.from_weight,
            weight_b: token_data_ba.to_weight,
        })?;
        let weights_b = AmmGadget::evaluate(&AmmInput {
            amm: order_b.amm,
            fee_bips: order_b.fee_bips,
            fee_bips_amm: account_b.fee_bips_amm,
            is_nft_token_s: decoded_b.is_nft_token_s,
            is_nft_token_b: decoded_b.is_nft_token_b,
            fill_s: fill_b,
            fill_b: fill_a,
            virtual_balance_s: account_b.balance_s.weight,
            virtual_balance_b: account_b.balance_b.weight,
            weight_s: token_data_ba.from_weight,
            weight_b: token_data_ab.to_weight,
        })?;

        // 6. Assign the outputs
        let updates = SpotTradeUpdates {
            storage_a: StorageUpdate {
                address: slot_a.address,
                storage_id: order_a.storage_id,
                data: filled_after_a,
            },
            storage_b: StorageUpdate {
                address: slot_b.address,
                storage_id: order_b.storage_id,
                data: filled_after_b,
            },
            account_a: AccountUpdate {
                account_id: order_a.account_id,
                balance_s: BalanceUpdate {
                    token: order_a.token_s,
                    balance: balance_s_a,
                    weight: weights_a.weight_s,
                },
                balance_b: BalanceUpdate {
                    token: order_a.token_b,
                    balance: balance_b_a,
                    weight: weights_a.weight_b,
                },
            },
            account_b: AccountUpdate {
                account_id: order_b.account_id,
                balance_s: BalanceUpdate {
                    token: order_b.token_s,
                    balance: balance_s_b,
                    weight: weights_b.weight_s,
                },
                balance_b: BalanceUpdate {
                    token: order_b.token_b,
                    balance: balance_b_b,
                    weight: weights_b.weight_b,
                },
            },
            pool: FeeAccountUpdate { balance_a: pool_a, balance_b: pool_b },
            operator: FeeAccountUpdate { balance_a: operator_a, balance_b: operator_b },
            hash_a: decoded_a.hash,
            hash_b: decoded_b.hash,
            signature_required_a: decoded_a.signature_required,
            signature_required_b: decoded_b.signature_required,
        };

        let public_data = PublicDataGadget::evaluate(&SpotTradePublicData {
            storage_id_a: order_a.storage_id,
            storage_id_b: order_b.storage_id,
            account_id_a: order_a.account_id,
            account_id_b: order_b.account_id,
            token_s_a: order_a.token_s,
            token_s_b: order_b.token_s,
            fill_s_a: trade.fill_s_a,
            fill_s_b: trade.fill_s_b,
            fill_amount_b_or_s_a: order_a.fill_amount_b_or_s,
            fill_amount_b_or_s_b: order_b.fill_amount_b_or_s,
            fee_bips_a: order_a.fee_bips,
            fee_bips_b: order_b.fee_bips,
            token_b_a: token_data_ba.to_token_da,
            token_b_b: token_data_ab.to_token_da,
        })?;

        Ok((updates, public_data))
    }

    /// Reject a zero fill received by an order buying an NFT
    fn check_nft_fill(
        decoded: &DecodedOrder,
        token_b: u64,
        fill_received: Amount,
    ) -> Result<(), SpotTradeError> {
        if decoded.is_nft_token_b && fill_received == 0 {
            return Err(SpotTradeError::NftZeroFill(token_b));
        }

        Ok(())
    }

    /// Compute the fees on a leg
    fn fee(
        amount: Amount,
        fee_bips: u64,
        protocol_fee_bips: u64,
    ) -> Result<FeeTake, SpotTradeError> {
        FeeGadget::evaluate(&FeeInput { amount, fee_bips, protocol_fee_bips })
    }

    /// Move `amount` between two balances, updating both in place
    fn transfer(from: &mut Amount, to: &mut Amount, amount: Amount) -> Result<(), SpotTradeError> {
        let output = BalanceTransferGadget::evaluate(&TransferInput {
            from_balance: *from,
            to_balance: *to,
            amount,
        })?;
        *from = output.from_balance;
        *to = output.to_balance;
        Ok(())
    }
}
