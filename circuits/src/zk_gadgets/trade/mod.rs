//! Gadgets that make up the spot-trade relation
//!
//! Each gadget implements `TradeGadget`; the circuit and the native witness
//! generator call them in the same order

pub mod amm;
pub mod fee;
pub mod float;
pub mod matching;
pub mod order;
pub mod public_data;
pub mod storage;
pub mod token_data;
pub mod transfer;
