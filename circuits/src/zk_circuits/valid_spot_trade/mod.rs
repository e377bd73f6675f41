//! Defines the `VALID SPOT TRADE` circuit
//!
//! The circuit proves that two orders were matched against each other
//! correctly: both orders are well formed and live, the fills respect their
//! prices and remaining amounts, fees are split between the operator and the
//! protocol fee pool, every balance moves by exactly the amounts transferred
//! and AMM accounts stay on their pricing curve. The statement carries the
//! resulting state writes, the signature obligations of both orders and the
//! packed public data.

mod witness;
pub use witness::SpotTradeWitnessGenerator;

use circuit_macros::circuit_type;
use circuit_types::{
    PlonkCircuit,
    account::{AccountUpdateVar, FeeAccountState, FeeAccountUpdateVar, TradingAccountState},
    balance::BalanceUpdateVar,
    fee::FeeTakeVar,
    public_data::{PackedPublicData, SpotTradePublicDataVar},
    spot_trade::{
        SpotTrade, SpotTradeUpdates, SpotTradeUpdatesVar, TradeParameters, TradeParametersVar,
    },
    storage::StorageUpdateVar,
    traits::{BaseType, CircuitBaseType, CircuitVarType, SingleProverCircuit},
};
use constants::{NUM_BITS_ADDRESS, NUM_BITS_BIPS, NUM_BITS_TIMESTAMP, Scalar};
use mpc_relation::{BoolVar, Variable, errors::CircuitError, traits::Circuit};
use serde::{Deserialize, Serialize};

use crate::zk_gadgets::{
    TradeGadget,
    bits::BitRangeGadget,
    comparators::{EqGadget, EqZeroGadget},
    trade::{
        amm::{AmmGadget, AmmInputVar},
        fee::{FeeGadget, FeeInputVar, ProtocolFeeGadget, ProtocolFeeInputVar},
        float::FillDecoderGadget,
        matching::{OrderMatchInputVar, OrderMatchingGadget},
        order::{OrderDecodeInputVar, OrderDecoderGadget},
        public_data::PublicDataGadget,
        storage::{ReplaySlotGadget, ReplaySlotInputVar},
        token_data::{TokenTradeDataGadget, TokenTradeDataInputVar},
        transfer::{BalanceTransferGadget, TransferInputVar},
    },
};

/// The variable type of the packed public data
type PackedPublicDataVar = <PackedPublicData as CircuitBaseType>::VarType;

// ----------------------
// | Circuit Definition |
// ----------------------

/// The `VALID SPOT TRADE` circuit
pub struct ValidSpotTrade;

impl ValidSpotTrade {
    /// Apply the circuit constraints to a given constraint system
    pub fn circuit(
        statement: &ValidSpotTradeStatementVar,
        witness: &ValidSpotTradeWitnessVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let (updates, public_data) = Self::derive(witness, &statement.params, cs)?;
        EqGadget::constrain_eq(&updates, &statement.updates, cs)?;
        EqGadget::constrain_eq(&public_data, &statement.public_data, cs)
    }

    /// Constrain the trade and derive its state writes and public data
    ///
    /// The gadgets are applied in the same order as in
    /// `SpotTradeWitnessGenerator::generate`
    pub fn derive(
        witness: &ValidSpotTradeWitnessVar,
        params: &TradeParametersVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(SpotTradeUpdatesVar, PackedPublicDataVar), CircuitError> {
        Self::constrain_params(params, cs)?;
        let trade = &witness.trade;
        let (order_a, order_b) = (&trade.order_a, &trade.order_b);
        let (account_a, account_b) = (&witness.account_a, &witness.account_b);

        // 1. Decode the orders and fills, and read the replay slots
        let decoded_a = OrderDecoderGadget::constrain(
            &OrderDecodeInputVar { order: order_a.clone(), exchange: params.exchange },
            cs,
        )?;
        let decoded_b = OrderDecoderGadget::constrain(
            &OrderDecodeInputVar { order: order_b.clone(), exchange: params.exchange },
            cs,
        )?;
        let decoded_fill_a = FillDecoderGadget::constrain(&trade.fill_s_a, cs)?;
        let decoded_fill_b = FillDecoderGadget::constrain(&trade.fill_s_b, cs)?;
        let (fill_a, fill_b) = (decoded_fill_a.amount, decoded_fill_b.amount);

        let slot_a = ReplaySlotGadget::constrain(
            &ReplaySlotInputVar { leaf: account_a.storage.clone(), storage_id: order_a.storage_id },
            cs,
        )?;
        let slot_b = ReplaySlotGadget::constrain(
            &ReplaySlotInputVar { leaf: account_b.storage.clone(), storage_id: order_b.storage_id },
            cs,
        )?;

        // 2. Match the orders
        let filled_after_a = OrderMatchingGadget::constrain(
            &OrderMatchInputVar {
                order: order_a.clone(),
                fill_s: fill_a,
                fill_b,
                fill_b_rounding: decoded_fill_b.rounding,
                filled: slot_a.filled,
                timestamp: params.timestamp,
                counterparty: account_b.owner,
            },
            cs,
        )?;
        let filled_after_b = OrderMatchingGadget::constrain(
            &OrderMatchInputVar {
                order: order_b.clone(),
                fill_s: fill_b,
                fill_b: fill_a,
                fill_b_rounding: decoded_fill_a.rounding,
                filled: slot_b.filled,
                timestamp: params.timestamp,
                counterparty: account_a.owner,
            },
            cs,
        )?;
        Self::constrain_nft_fill(decoded_a.is_nft_token_b, fill_b, cs)?;
        Self::constrain_nft_fill(decoded_b.is_nft_token_b, fill_a, cs)?;

        // 3. Compute the fees on each leg
        let protocol_a = ProtocolFeeGadget::constrain(
            &ProtocolFeeInputVar {
                protocol_fee_bips: params.protocol_taker_fee_bips,
                is_nft_token_b: decoded_a.is_nft_token_b,
                is_nft_token_s_and_b: decoded_a.is_nft_token_s_and_b,
            },
            cs,
        )?;
        let protocol_b = ProtocolFeeGadget::constrain(
            &ProtocolFeeInputVar {
                protocol_fee_bips: params.protocol_maker_fee_bips,
                is_nft_token_b: decoded_b.is_nft_token_b,
                is_nft_token_s_and_b: decoded_b.is_nft_token_s_and_b,
            },
            cs,
        )?;

        let fee_sa = Self::fee(fill_a, decoded_a.fee_bips_s, protocol_a.fee_bips_s, cs)?;
        let fee_ba = Self::fee(fill_b, decoded_a.fee_bips_b, protocol_a.fee_bips_b, cs)?;
        let fee_sb = Self::fee(fill_b, decoded_b.fee_bips_s, protocol_b.fee_bips_s, cs)?;
        let fee_bb = Self::fee(fill_a, decoded_b.fee_bips_b, protocol_b.fee_bips_b, cs)?;

        // 4. Move the balances: the trade itself, then the trading fees to the
        // operator, then the protocol fees from the operator to the pool
        let mut balance_s_a = account_a.balance_s.balance;
        let mut balance_b_a = account_a.balance_b.balance;
        let mut balance_s_b = account_b.balance_s.balance;
        let mut balance_b_b = account_b.balance_b.balance;
        let mut operator_a = witness.operator.balance_a;
        let mut operator_b = witness.operator.balance_b;
        let mut pool_a = witness.pool.balance_a;
        let mut pool_b = witness.pool.balance_b;

        Self::transfer(&mut balance_s_a, &mut balance_b_b, fill_a, cs)?;
        Self::transfer(&mut balance_s_b, &mut balance_b_a, fill_b, cs)?;

        Self::transfer(&mut balance_s_a, &mut operator_a, fee_sa.fee, cs)?;
        Self::transfer(&mut balance_b_a, &mut operator_b, fee_ba.fee, cs)?;
        Self::transfer(&mut balance_s_b, &mut operator_b, fee_sb.fee, cs)?;
        Self::transfer(&mut balance_b_b, &mut operator_a, fee_bb.fee, cs)?;

        Self::transfer(&mut operator_a, &mut pool_a, fee_sa.protocol_fee, cs)?;
        Self::transfer(&mut operator_b, &mut pool_b, fee_ba.protocol_fee, cs)?;
        Self::transfer(&mut operator_b, &mut pool_b, fee_sb.protocol_fee, cs)?;
        Self::transfer(&mut operator_a, &mut pool_a, fee_bb.protocol_fee, cs)?;

        // 5. Derive the new weights of the trading balances
        let token_data_ab = TokenTradeDataGadget::constrain(
            &TokenTradeDataInputVar {
                from_token: order_a.token_s,
                from_weight: account_a.balance_s.weight,
                from_balance_after: balance_s_a,
                to_token: order_b.token_b,
                to_weight: account_b.balance_b.weight,
                expected_nft_data: order_b.nft_data_b,
            },
            cs,
        )?;
        let token_data_ba = TokenTradeDataGadget::constrain(
            &TokenTradeDataInputVar {
                from_token: order_b.token_s,
                from_weight: account_b.balance_s.weight,
                from_balance_after: balance_s_b,
                to_token: order_a.token_b,
                to_weight: account_a.balance_b.weight,
                expected_nft_data: order_a.nft_data_b,
            },
            cs,
        )?;

        let weights_a = AmmGadget::constrain(
            &AmmInputVar {
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
            },
            cs,
        )?;
        let weights_b = AmmGadget::constrain(
            &AmmInputVar {
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
            },
            cs,
        )?;

        // 6. Assign the outputs
        let updates = SpotTradeUpdatesVar {
            storage_a: StorageUpdateVar {
                address: slot_a.address,
                storage_id: order_a.storage_id,
                data: filled_after_a,
            },
            storage_b: StorageUpdateVar {
                address: slot_b.address,
                storage_id: order_b.storage_id,
                data: filled_after_b,
            },
            account_a: AccountUpdateVar {
                account_id: order_a.account_id,
                balance_s: BalanceUpdateVar {
                    token: order_a.token_s,
                    balance: balance_s_a,
                    weight: weights_a.weight_s,
                },
                balance_b: BalanceUpdateVar {
                    token: order_a.token_b,
                    balance: balance_b_a,
                    weight: weights_a.weight_b,
                },
            },
            account_b: AccountUpdateVar {
                account_id: order_b.account_id,
                balance_s: BalanceUpdateVar {
                    token: order_b.token_s,
                    balance: balance_s_b,
                    weight: weights_b.weight_s,
                },
                balance_b: BalanceUpdateVar {
                    token: order_b.token_b,
                    balance: balance_b_b,
                    weight: weights_b.weight_b,
                },
            },
            pool: FeeAccountUpdateVar { balance_a: pool_a, balance_b: pool_b },
            operator: FeeAccountUpdateVar { balance_a: operator_a, balance_b: operator_b },
            hash_a: decoded_a.hash,
            hash_b: decoded_b.hash,
            signature_required_a: decoded_a.signature_required,
            signature_required_b: decoded_b.signature_required,
        };

        let public_data = PublicDataGadget::constrain(
            &SpotTradePublicDataVar {
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
            },
            cs,
        )?;

        Ok((updates, public_data))
    }

    /// Range check the block parameters
    fn constrain_params(
        params: &TradeParametersVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        BitRangeGadget::constrain_bit_range(params.exchange, NUM_BITS_ADDRESS, cs)?;
        BitRangeGadget::constrain_bit_range(params.timestamp, NUM_BITS_TIMESTAMP, cs)?;
        BitRangeGadget::constrain_bit_range(params.protocol_taker_fee_bips, NUM_BITS_BIPS, cs)?;
        BitRangeGadget::constrain_bit_range(params.protocol_maker_fee_bips, NUM_BITS_BIPS, cs)
    }

    /// Constrain an order buying an NFT to receive a nonzero fill
    fn constrain_nft_fill(
        is_nft_token_b: BoolVar,
        fill_received: Variable,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let zero_fill = EqZeroGadget::eq_zero(&fill_received, cs)?;
        let nft_zero_fill = cs.logic_and(is_nft_token_b, zero_fill)?;
        cs.enforce_false(nft_zero_fill)
    }

    /// Compute the fees on a leg
    fn fee(
        amount: Variable,
        fee_bips: Variable,
        protocol_fee_bips: Variable,
        cs: &mut PlonkCircuit,
    ) -> Result<FeeTakeVar, CircuitError> {
        FeeGadget::constrain(&FeeInputVar { amount, fee_bips, protocol_fee_bips }, cs)
    }

    /// Move `amount` between two balances, updating both in place
    fn transfer(
        from: &mut Variable,
        to: &mut Variable,
        amount: Variable,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        let output = BalanceTransferGadget::constrain(
            &TransferInputVar { from_balance: *from, to_balance: *to, amount },
            cs,
        )?;
        *from = output.from_balance;
        *to = output.to_balance;
        Ok(())
    }
}

// ---------------------------
// | Witness Type Definition |
// ---------------------------

/// The witness type for `VALID SPOT TRADE`
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidSpotTradeWitness {
    /// The matched orders and their fills
    pub trade: SpotTrade,
    /// The state of order A's account
    pub account_a: TradingAccountState,
    /// The state of order B's account
    pub account_b: TradingAccountState,
    /// The balances of the protocol fee pool
    pub pool: FeeAccountState,
    /// The balances of the operator
    pub operator: FeeAccountState,
}

// -----------------------------
// | Statement Type Definition |
// -----------------------------

/// The statement type for `VALID SPOT TRADE`
#[circuit_type(singleprover_circuit)]
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidSpotTradeStatement {
    /// The block parameters the trade executes under
    pub params: TradeParameters,
    /// The state writes and signature obligations of the trade
    pub updates: SpotTradeUpdates,
    /// The packed public data of the trade
    pub public_data: PackedPublicData,
}

// ---------------------
// | Prove Verify Flow |
// ---------------------

impl SingleProverCircuit for ValidSpotTrade {
    type Witness = ValidSpotTradeWitness;
    type Statement = ValidSpotTradeStatement;

    fn name() -> String {
        "Valid Spot Trade".to_string()
    }

    fn apply_constraints(
        witness_var: ValidSpotTradeWitnessVar,
        statement_var: ValidSpotTradeStatementVar,
        cs: &mut PlonkCircuit,
    ) -> Result<(), CircuitError> {
        Self::circuit(&statement_var, &witness_var, cs)
    }
}

// ---------
// | Tests |
// ---------

#[cfg(any(test, feature = "test_helpers"))]
pub mod test_helpers {
    use circuit_types::{
        PlonkCircuit,
        account::{FeeAccountState, TradingAccountState},
        balance::BalanceLeaf,
        errors::SpotTradeError,
        float::Float24,
        order::Order,
        spot_trade::{SpotTrade, TradeParameters},
        storage::StorageLeaf,
        test_helpers::{random_address, random_scalar},
        traits::{CircuitBaseType, CircuitVarType},
    };
    use constants::{NFT_TOKEN_ID_START, Scalar};
    use mpc_relation::errors::CircuitError;
    use num_bigint::BigUint;

    use super::{
        SpotTradeWitnessGenerator, ValidSpotTrade, ValidSpotTradeStatement, ValidSpotTradeWitness,
    };
    use crate::test_helpers::check_constraints_satisfied;

    /// The block timestamp used in tests
    pub const TIMESTAMP: u64 = 1_700_000_000;
    /// The fungible token sold by order A
    pub const TOKEN_X: u64 = 1;
    /// The fungible token sold by order B
    pub const TOKEN_Y: u64 = 2;
    /// An NFT slot
    pub const NFT_1: u64 = NFT_TOKEN_ID_START + 1;
    /// Another NFT slot
    pub const NFT_2: u64 = NFT_TOKEN_ID_START + 2;

    // -----------
    // | Helpers |
    // -----------

    /// Check that the constraints are satisfied on the given witness and
    /// statement
    pub fn check_constraints(
        witness: &ValidSpotTradeWitness,
        statement: &ValidSpotTradeStatement,
    ) -> bool {
        check_constraints_satisfied::<ValidSpotTrade>(witness, statement)
    }

    /// The block parameters used in tests, charging the taker 5 bips and the
    /// maker 3 bips of protocol fees
    pub fn dummy_params() -> TradeParameters {
        TradeParameters {
            exchange: random_address(),
            timestamp: TIMESTAMP,
            protocol_taker_fee_bips: 5,
            protocol_maker_fee_bips: 3,
        }
    }

    /// An order selling `amount_s` of `token_s` for `amount_b` of `token_b`
    pub fn order(token_s: u64, token_b: u64, amount_s: u128, amount_b: u128) -> Order {
        Order {
            storage_id: 0,
            account_id: 0,
            token_s,
            token_b,
            amount_s,
            amount_b,
            valid_since: TIMESTAMP - 100,
            valid_until: TIMESTAMP + 100,
            max_fee_bips: 50,
            fee_bips: 0,
            fill_amount_b_or_s: false,
            taker: BigUint::default(),
            amm: false,
            nft_data_b: Scalar::zero(),
        }
    }

    /// A trading account holding the given balances of the tokens an order
    /// sells and buys
    pub fn account(balance_s: u128, balance_b: u128) -> TradingAccountState {
        TradingAccountState {
            owner: random_address(),
            fee_bips_amm: 0,
            balance_s: BalanceLeaf::new(balance_s),
            balance_b: BalanceLeaf::new(balance_b),
            storage: StorageLeaf::default(),
        }
    }

    /// Build a witness trading the two orders at the given fills
    pub fn trade_witness(
        order_a: Order,
        order_b: Order,
        fill_a: u128,
        fill_b: u128,
        account_a: TradingAccountState,
        account_b: TradingAccountState,
    ) -> Result<ValidSpotTradeWitness, SpotTradeError> {
        let trade = SpotTrade {
            order_a,
            order_b,
            fill_s_a: Float24::encode_exact(fill_a)?,
            fill_s_b: Float24::encode_exact(fill_b)?,
        };

        Ok(ValidSpotTradeWitness {
            trade,
            account_a,
            account_b,
            pool: FeeAccountState::default(),
            operator: FeeAccountState::default(),
        })
    }

    /// A fungible trade: A sells 1,000,000 X for 100,000 Y at 20 bips, B sells
    /// 100,000 Y for 1,000,000 X at 10 bips
    pub fn fungible_witness() -> Result<ValidSpotTradeWitness, SpotTradeError> {
        let mut order_a = order(TOKEN_X, TOKEN_Y, 1_000_000, 100_000);
        order_a.storage_id = 5;
        order_a.account_id = 10;
        order_a.fee_bips = 20;

        let mut order_b = order(TOKEN_Y, TOKEN_X, 100_000, 1_000_000);
        order_b.account_id = 11;
        order_b.fee_bips = 10;
        order_b.fill_amount_b_or_s = true;

        trade_witness(
            order_a,
            order_b,
            1_000_000,
            100_000,
            account(2_000_000, 0),
            account(500_000, 0),
        )
    }

    /// A trade of 100,000 X for one unit of an NFT held by B
    pub fn nft_witness() -> Result<ValidSpotTradeWitness, SpotTradeError> {
        let nft_data = random_scalar();
        let mut order_a = order(TOKEN_X, NFT_1, 100_000, 1);
        order_a.account_id = 10;
        order_a.fee_bips = 20;
        order_a.nft_data_b = nft_data;

        let mut order_b = order(NFT_1, TOKEN_X, 1, 100_000);
        order_b.account_id = 11;
        order_b.fee_bips = 10;

        let mut account_b = account(1, 0);
        account_b.balance_s.weight = nft_data;
        trade_witness(order_a, order_b, 100_000, 1, account(100_200, 0), account_b)
    }

    /// A swap of 10,000 units of one NFT for 10,000 units of another
    pub fn nft_swap_witness() -> Result<ValidSpotTradeWitness, SpotTradeError> {
        let (data_1, data_2) = (random_scalar(), random_scalar());
        let mut order_a = order(NFT_1, NFT_2, 10_000, 10_000);
        order_a.account_id = 10;
        order_a.nft_data_b = data_2;

        let mut order_b = order(NFT_2, NFT_1, 10_000, 10_000);
        order_b.account_id = 11;
        order_b.nft_data_b = data_1;

        let mut account_a = account(10_000, 0);
        account_a.balance_s.weight = data_1;
        let mut account_b = account(10_000, 0);
        account_b.balance_s.weight = data_2;
        trade_witness(order_a, order_b, 10_000, 10_000, account_a, account_b)
    }

    /// A trade against an AMM with virtual balances 1000/1000 and a 30 bip
    /// fee, selling 50 X for `fill_b` Y
    pub fn amm_witness(fill_b: u128) -> Result<ValidSpotTradeWitness, SpotTradeError> {
        let mut order_a = order(TOKEN_X, TOKEN_Y, 50, fill_b);
        order_a.account_id = 10;
        order_a.fee_bips = 30;
        order_a.amm = true;

        let mut order_b = order(TOKEN_Y, TOKEN_X, fill_b, 50);
        order_b.account_id = 11;

        let mut account_a = account(1000, 1000);
        account_a.fee_bips_amm = 30;
        account_a.balance_s.weight = Scalar::from(1000u64);
        account_a.balance_b.weight = Scalar::from(1000u64);
        trade_witness(order_a, order_b, 50, fill_b, account_a, account(1000, 0))
    }

    /// Build the statement of a valid witness with the native generator
    pub fn create_statement(
        witness: &ValidSpotTradeWitness,
        params: &TradeParameters,
    ) -> Result<ValidSpotTradeStatement, SpotTradeError> {
        SpotTradeWitnessGenerator::statement(witness, params)
    }

    /// Build a statement from the values the circuit derives on a witness
    ///
    /// Used for witnesses the native generator rejects, to check that the
    /// circuit rejects them too
    pub fn derive_statement(
        witness: &ValidSpotTradeWitness,
        params: &TradeParameters,
    ) -> Result<ValidSpotTradeStatement, CircuitError> {
        let mut cs = PlonkCircuit::new_turbo_plonk();
        let witness_var = witness.create_witness(&mut cs)?;
        let params_var = params.create_witness(&mut cs)?;
        let (updates, public_data) = ValidSpotTrade::derive(&witness_var, &params_var, &mut cs)?;

        Ok(ValidSpotTradeStatement {
            params: params.clone(),
            updates: updates.eval(&cs)?,
            public_data: public_data.eval(&cs)?,
        })
    }
}
