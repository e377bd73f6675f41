//! Macro implementation of the `circuit_type` macro that defines associated
//! types and conversions between them for an application level base type

mod singleprover_circuit_types;

use itertools::Itertools;
use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use quote::ToTokens;
use syn::{
    Error, Expr, Field, FieldValue, Fields, FieldsNamed, ItemFn, ItemImpl, ItemStruct, Member,
    Path, Result, Stmt, Token, Type, TypePath,
    parse::Parser,
    parse_quote,
    punctuated::Punctuated,
    spanned::Spanned,
    token::{Brace, Colon, Comma},
};

use self::singleprover_circuit_types::build_circuit_types;

/// The trait name for the base type that all other types are derived from
const BASE_TYPE_TRAIT_NAME: &str = "BaseType";

/// The name of the associated constant representing the number of scalars
/// needed to serialize a type
const NUM_SCALARS_ASSOC_CONST: &str = "NUM_SCALARS";
/// The name of the method that converts a serialized scalar iterator to a base
/// type
const FROM_SCALARS_METHOD_NAME: &str = "from_scalars";
/// The name of the method that converts a base type to a serialized vector of
/// scalars
const TO_SCALARS_METHOD_NAME: &str = "to_scalars";
/// The identifier of the `Scalar` type
const SCALAR_TYPE_IDENT: &str = "Scalar";

/// The flag indicating the expansion should include a single prover circuit
/// type definition for the base type
const ARG_SINGLEPROVER_TYPE: &str = "singleprover_circuit";

/// The arguments to the `circuit_type` macro
#[derive(Default)]
pub(crate) struct MacroArgs {
    /// Whether or not to allocate a circuit type for the struct
    pub build_singleprover_types: bool,
}

/// Parse macro args from the invocation details
pub(crate) fn parse_macro_args(args: TokenStream) -> Result<MacroArgs> {
    let mut macro_args = MacroArgs::default();
    let parsed_args =
        Punctuated::<Ident, Comma>::parse_terminated.parse2(TokenStream2::from(args))?;

    for arg in parsed_args.iter() {
        match arg.to_string().as_str() {
            ARG_SINGLEPROVER_TYPE => macro_args.build_singleprover_types = true,
            unknown => {
                return Err(Error::new(arg.span(), format!("unexpected argument {unknown}")));
            },
        }
    }

    Ok(macro_args)
}

// -------------------
// | Core Macro Impl |
// -------------------

/// Implementation of the type derivation macro
pub(crate) fn circuit_type_impl(target_struct: &ItemStruct, macro_args: &MacroArgs) -> TokenStream {
    if let Err(e) = validate_target(target_struct) {
        return e.to_compile_error().into();
    }

    let mut out_tokens = target_struct.to_token_stream();
    out_tokens.extend(build_base_type_impl(target_struct));

    if macro_args.build_singleprover_types {
        out_tokens.extend(build_circuit_types(target_struct));
    }

    out_tokens.into()
}

/// Only non-generic structs with named fields are supported
fn validate_target(target_struct: &ItemStruct) -> Result<()> {
    if !target_struct.generics.params.is_empty() {
        return Err(Error::new(
            target_struct.generics.span(),
            "circuit types may not be generic",
        ));
    }

    if !matches!(target_struct.fields, Fields::Named(_)) {
        return Err(Error::new(target_struct.span(), "circuit types require named fields"));
    }

    Ok(())
}

// ---------------------------
// | BaseType Implementation |
// ---------------------------

/// Build the `impl BaseType` block
fn build_base_type_impl(base_type: &ItemStruct) -> TokenStream2 {
    let trait_ident = new_ident(BASE_TYPE_TRAIT_NAME);
    let base_type_ident = base_type.ident.clone();
    let scalar_type_path = path_from_ident(&new_ident(SCALAR_TYPE_IDENT));

    let num_scalars_ident = new_ident(NUM_SCALARS_ASSOC_CONST);
    let num_scalars_expr = build_num_scalars_expr(base_type);

    let from_scalars_impl = build_deserialize_method(
        &new_ident(FROM_SCALARS_METHOD_NAME),
        &scalar_type_path,
        &path_from_ident(&trait_ident),
        base_type,
    );
    let to_scalars_impl =
        build_serialize_method(&new_ident(TO_SCALARS_METHOD_NAME), &scalar_type_path, base_type);

    let impl_block: ItemImpl = parse_quote! {
        impl #trait_ident for #base_type_ident {
            const #num_scalars_ident: usize = #num_scalars_expr;

            #from_scalars_impl
            #to_scalars_impl
        }
    };
    impl_block.to_token_stream()
}

/// Builds a const expression for the `NUM_SCALARS` const on the base type
///
/// This expression is the sum of the number of scalars in each field of the
/// base type
fn build_num_scalars_expr(base_type: &ItemStruct) -> Expr {
    let base_type_trait = new_ident(BASE_TYPE_TRAIT_NAME);
    let num_scalars_ident = new_ident(NUM_SCALARS_ASSOC_CONST);

    base_type
        .fields
        .iter()
        .map(|field| {
            let ty = &field.ty;
            let expr: Expr = parse_quote!(<#ty as #base_type_trait>::#num_scalars_ident);
            expr
        })
        .reduce(|acc, expr| parse_quote!(#acc + #expr))
        .unwrap_or_else(|| parse_quote!(0))
}

// -----------
// | Helpers |
// -----------

/// A helper that specifies the default call site span for an Identifier
fn new_ident(name: &str) -> Ident {
    Ident::new(name, Span::call_site())
}

/// A helper that creates an identifier with the given suffix
fn ident_with_suffix(original: &str, suffix: &str) -> Ident {
    new_ident(&format!("{original}{suffix}"))
}

/// Convert an `Ident` directly into a `Path`
fn path_from_ident(identifier: &Ident) -> Path {
    parse_quote!(#identifier)
}

/// Implements a serialization function that looks like
///     fn #method_name(&self) -> Vec<#target_type> {
///         let mut res = Vec::new();
///         res.extend(self.field1.#method_name());
///         ...
///         res
///     }
fn build_serialize_method(
    method_name: &Ident,
    target_type: &Path,
    self_struct: &ItemStruct,
) -> TokenStream2 {
    let field_exprs: Vec<Stmt> = self_struct
        .fields
        .iter()
        .map(|field| {
            let field_ident = &field.ident;
            parse_quote! {
                res.extend(self.#field_ident.#method_name());
            }
        })
        .collect_vec();

    let fn_impl: ItemFn = parse_quote! {
        fn #method_name(&self) -> Vec<#target_type> {
            let mut res = Vec::new();
            #(#field_exprs)*

            res
        }
    };
    fn_impl.to_token_stream()
}

/// Implements a deserialization function for a trait that looks like
///     fn #method_name<I: Iterator<Item = #from_type>>(i: &mut I) -> Self {
///         Self { field1: <T1 as Trait>::#method_name(i), ... }
///     }
fn build_deserialize_method(
    method_name: &Ident,
    from_type: &Path,
    trait_ident: &Path,
    self_struct: &ItemStruct,
) -> TokenStream2 {
    let mut fields_expr: Punctuated<FieldValue, Comma> = Punctuated::new();
    for field in self_struct.fields.iter() {
        let Some(ident) = field.ident.clone() else { continue };
        let field_type = &field.ty;

        // Recursively call `#method_name` on the field type
        let parse_field_expr: Expr = parse_quote! {
            <#field_type as #trait_ident>::#method_name(i)
        };

        fields_expr.push(FieldValue {
            attrs: Vec::new(),
            member: Member::Named(ident),
            colon_token: Some(Colon::default()),
            expr: parse_field_expr,
        });
    }

    let fn_impl: ItemFn = parse_quote! {
        fn #method_name<I: Iterator<Item = #from_type>>(i: &mut I) -> Self {
            Self {
                #fields_expr
            }
        }
    };
    fn_impl.to_token_stream()
}

/// Build a replica of the given struct under a new name, using an
/// implemented trait's associated type as the new type for each field
fn build_modified_struct_from_associated_types(
    base_type: &ItemStruct,
    new_name: Ident,
    attributes: Vec<syn::Attribute>,
    type_derivation_trait_ident: &Path,
    associated_type_ident: &Ident,
) -> ItemStruct {
    let mut named = Punctuated::<Field, Comma>::new();
    for f in base_type.fields.iter() {
        let curr_type = &f.ty;
        let type_path: TypePath = parse_quote!(
            <#curr_type as #type_derivation_trait_ident>::#associated_type_ident
        );

        // Carry doc comments onto the derived field
        let docs = f.attrs.iter().filter(|attr| attr.path.is_ident("doc")).cloned().collect_vec();
        named.push(Field {
            vis: f.vis.clone(),
            attrs: docs,
            ident: f.ident.clone(),
            colon_token: f.colon_token,
            ty: Type::Path(type_path),
        });
    }

    ItemStruct {
        attrs: attributes,
        vis: base_type.vis.clone(),
        struct_token: Token![struct](Span::call_site()),
        ident: new_name,
        generics: Default::default(),
        fields: Fields::Named(FieldsNamed { brace_token: Brace::default(), named }),
        semi_token: None,
    }
}
