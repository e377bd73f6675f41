//! Helpers for testing and benchmarking the circuits

mod circuits;

pub use circuits::*;
