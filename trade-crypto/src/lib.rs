//! Field helpers and hash primitives shared by the spot-trade circuits and
//! their native witness generation
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]

pub mod fields;
pub mod hash;
