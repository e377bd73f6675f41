//! Groups type and trait definitions built when the `singleprover_circuit`
//! argument is given to the macro

use proc_macro2::TokenStream as TokenStream2;
use quote::ToTokens;
use syn::{Attribute, ItemImpl, ItemStruct, parse_quote};

use super::{
    build_deserialize_method, build_modified_struct_from_associated_types, build_serialize_method,
    ident_with_suffix, new_ident, path_from_ident,
};

// -------------
// | Constants |
// -------------

/// The name of the trait that base types implement
const BASE_TYPE_TRAIT_NAME: &str = "CircuitBaseType";
/// The name of the trait that the var type implements
const VAR_TYPE_TRAIT_NAME: &str = "CircuitVarType";

/// The name of the associated type for variables
const VAR_TYPE_ASSOCIATED_NAME: &str = "VarType";
/// The name of the associated type pointing a var type back at its base type
const BASE_TYPE_ASSOCIATED_NAME: &str = "BaseType";

/// The method name for converting from serialized variables to a variable type
const FROM_VARS_METHOD_NAME: &str = "from_vars";
/// The method name for converting a variable type to serialized variables
const TO_VARS_METHOD_NAME: &str = "to_vars";
/// The type that a `from_vars` method implementation converts from
const FROM_VARS_ITER_TYPE: &str = "Variable";

/// The suffix appended to a variable type of a base type
const VAR_TYPE_SUFFIX: &str = "Var";

// ------------------
// | Implementation |
// ------------------

/// Build single-prover circuit types for the base type
pub(crate) fn build_circuit_types(base_type: &ItemStruct) -> TokenStream2 {
    let mut res_stream = build_circuit_base_type_impl(base_type);
    res_stream.extend(build_var_type(base_type));

    res_stream
}

/// Build an `impl CircuitBaseType` block for the base type
fn build_circuit_base_type_impl(base_type: &ItemStruct) -> TokenStream2 {
    let base_name = base_type.ident.clone();
    let trait_ident = new_ident(BASE_TYPE_TRAIT_NAME);

    let var_type_associated = new_ident(VAR_TYPE_ASSOCIATED_NAME);
    let var_type_name = ident_with_suffix(&base_name.to_string(), VAR_TYPE_SUFFIX);

    let impl_block: ItemImpl = parse_quote! {
        impl #trait_ident for #base_name {
            type #var_type_associated = #var_type_name;
        }
    };
    impl_block.to_token_stream()
}

/// Build a variable type; the type of the base allocated in a constraint
/// system
fn build_var_type(base_type: &ItemStruct) -> TokenStream2 {
    let base_name = base_type.ident.clone();
    let var_name = ident_with_suffix(&base_name.to_string(), VAR_TYPE_SUFFIX);

    let doc_string = format!(" The constraint system representation of [`{base_name}`]");
    let doc: Attribute = parse_quote!(#[doc = #doc_string]);
    let derive: Attribute = parse_quote!(#[derive(Clone, Debug)]);

    let var_struct = build_modified_struct_from_associated_types(
        base_type,
        var_name,
        vec![doc, derive],
        &path_from_ident(&new_ident(BASE_TYPE_TRAIT_NAME)),
        &new_ident(VAR_TYPE_ASSOCIATED_NAME),
    );

    let mut res = var_struct.to_token_stream();
    res.extend(build_var_type_impl(&var_struct, base_type));
    res
}

/// Build an implementation of the `CircuitVarType` trait for the new var type
fn build_var_type_impl(var_struct: &ItemStruct, base_type: &ItemStruct) -> TokenStream2 {
    let trait_ident = new_ident(VAR_TYPE_TRAIT_NAME);
    let var_struct_ident = var_struct.ident.clone();
    let base_type_ident = base_type.ident.clone();
    let base_type_associated = new_ident(BASE_TYPE_ASSOCIATED_NAME);
    let var_iter_type = path_from_ident(&new_ident(FROM_VARS_ITER_TYPE));

    let deserialize_method = build_deserialize_method(
        &new_ident(FROM_VARS_METHOD_NAME),
        &var_iter_type,
        &path_from_ident(&trait_ident),
        var_struct,
    );
    let serialize_method =
        build_serialize_method(&new_ident(TO_VARS_METHOD_NAME), &var_iter_type, var_struct);

    let impl_block: ItemImpl = parse_quote! {
        impl #trait_ident for #var_struct_ident {
            type #base_type_associated = #base_type_ident;

            #serialize_method
            #deserialize_method
        }
    };
    impl_block.to_token_stream()
}
