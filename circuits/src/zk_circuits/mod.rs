//! Groups the full circuits of the spot-trade relation
pub mod valid_spot_trade;
