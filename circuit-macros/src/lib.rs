//! Groups proc-macro definitions used by the spot-trade circuit types

#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(unsafe_code)]

mod circuit_type;

use circuit_type::{circuit_type_impl, parse_macro_args};
use proc_macro::TokenStream;
use syn::ItemStruct;

/// Derives the scalar serialization of an application level type and,
/// optionally, its constraint system representation
///
/// Accepted arguments:
///     - `singleprover_circuit`: build a `<Name>Var` type holding the allocated
///       variables of each field, along with the `CircuitBaseType` and
///       `CircuitVarType` implementations that translate between the two
///
/// The expansion refers to `BaseType`, `CircuitBaseType`, `CircuitVarType`,
/// `Scalar` and `Variable` by name, so these must be in scope at the call
/// site
#[proc_macro_attribute]
pub fn circuit_type(args: TokenStream, item: TokenStream) -> TokenStream {
    let macro_args = match parse_macro_args(args) {
        Ok(args) => args,
        Err(e) => return e.to_compile_error().into(),
    };

    let item: ItemStruct = match syn::parse(item) {
        Ok(item) => item,
        Err(e) => return e.to_compile_error().into(),
    };

    circuit_type_impl(&item, &macro_args)
}
