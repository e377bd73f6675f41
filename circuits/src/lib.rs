//! Groups the gadgets and circuits of the spot-trade relation
//!
//! Every gadget has a native counterpart that computes the values the gadget
//! constrains; the native side is used for witness generation and rejects a
//! trade with a typed error wherever the circuit would be unsatisfiable
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

#[cfg(any(test, feature = "test_helpers"))]
pub mod test_helpers;
pub mod zk_circuits;
pub mod zk_gadgets;
