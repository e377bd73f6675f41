//! Groups error types for the spot-trade types and witness generation

use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

use num_bigint::BigUint;
use thiserror::Error;

use crate::Amount;

/// An error converting a native value into one of the circuit types
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeConversionError(pub String);

impl Display for TypeConversionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{:?}", self)
    }
}
impl Error for TypeConversionError {}

/// The reasons a spot trade may be rejected during witness generation
///
/// Each variant corresponds to a set of constraints in the circuit that the
/// offending witness would leave unsatisfied
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SpotTradeError {
    /// A value does not fit in the bit width its field is range checked to
    #[error("{field} does not fit in {bits} bits")]
    RangeCheck {
        /// The name of the offending field
        field: &'static str,
        /// The bit width of the field
        bits: usize,
    },
    /// A float encoded fill is malformed
    #[error("invalid float encoding: {0}")]
    InvalidFloat(#[from] TypeConversionError),
    /// A fill that should match a derived value does not
    #[error("fill mismatch: {0}")]
    FillMismatch(String),
    /// The fill exceeds the order's limit price beyond the tolerance
    #[error("fill rate of {fill_s} for {fill_b} is worse than the order's limit price")]
    InvalidFillRate {
        /// The amount sold by the order
        fill_s: Amount,
        /// The amount bought by the order
        fill_b: Amount,
    },
    /// The fill takes the order over its total amount
    #[error("filled amount {filled_after} exceeds the order's limit of {limit}")]
    FillLimitExceeded {
        /// The filled amount after the trade
        filled_after: Amount,
        /// The order's amount in the filled token
        limit: Amount,
    },
    /// The order's replay slot id is older than the one stored in its slot
    #[error("order slot id {order_storage_id} is below the stored slot id {leaf_storage_id}")]
    ReplaySlotRegression {
        /// The order's slot id
        order_storage_id: u64,
        /// The slot id stored in the leaf
        leaf_storage_id: u64,
    },
    /// The order is not yet valid at the block timestamp
    #[error("order is valid from {valid_since}, timestamp is {timestamp}")]
    OrderNotYetValid {
        /// The order's validity start
        valid_since: u64,
        /// The block timestamp
        timestamp: u64,
    },
    /// The order has expired at the block timestamp
    #[error("order expired at {valid_until}, timestamp is {timestamp}")]
    OrderExpired {
        /// The order's validity end
        valid_until: u64,
        /// The block timestamp
        timestamp: u64,
    },
    /// The order names a taker other than the counterparty
    #[error("order may only be filled by {taker:#x}, counterparty is {counterparty:#x}")]
    InvalidTaker {
        /// The taker named in the order
        taker: BigUint,
        /// The owner of the counterparty's account
        counterparty: BigUint,
    },
    /// Tokens on either side of a transfer belong to different classes, or
    /// differ while fungible
    #[error("cannot transfer token {from} into a slot of token {to}")]
    TokenMismatch {
        /// The token debited
        from: u64,
        /// The token credited
        to: u64,
    },
    /// An order sells and buys the same token
    #[error("order sells and buys the same token {0}")]
    SameToken(u64),
    /// The NFT data in a balance does not match the data the order expects
    #[error("NFT data mismatch: {0}")]
    NftDataMismatch(String),
    /// An order buying an NFT is matched against a zero fill
    #[error("order buying NFT token {0} received a zero fill")]
    NftZeroFill(u64),
    /// An order's fee exceeds its signed maximum
    #[error("fee of {fee_bips} bips exceeds the maximum of {max_fee_bips}")]
    FeeBipsTooHigh {
        /// The fee charged by the operator
        fee_bips: u64,
        /// The maximum fee signed by the owner
        max_fee_bips: u64,
    },
    /// A balance would go negative
    #[error("cannot debit {amount} from balance {balance}")]
    InsufficientBalance {
        /// The balance before the debit
        balance: Amount,
        /// The amount debited
        amount: Amount,
    },
    /// An AMM side violates its pricing curve or its preconditions
    #[error("AMM invariant violated: {0}")]
    AmmInvariant(String),
    /// An AMM order does not charge the account's AMM fee
    #[error("AMM order charges {order_fee_bips} bips, the account requires {amm_fee_bips}")]
    AmmFeeMismatch {
        /// The fee charged by the order
        order_fee_bips: u64,
        /// The fee configured on the AMM account
        amm_fee_bips: u64,
    },
}
