//! `OpenRecord` derive macro implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Fields, LitStr, parse2};

/// Expand the `#[derive(OpenRecord)]` macro.
///
/// Exactly one field must be marked `#[open(properties)]`; every other field
/// contributes its wire name, taken from `#[serde(rename = "...")]` or the
/// field identifier, to the declared field list.
pub fn expand_open_record_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let syn::Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            &input,
            "OpenRecord derive only supports structs",
        ));
    };
    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &input,
            "OpenRecord derive only supports structs with named fields",
        ));
    };

    let mut bag = None;
    let mut declared = Vec::new();

    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        if is_properties_field(&field.attrs)? {
            if bag.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "only one field may be marked #[open(properties)]",
                ));
            }
            bag = Some(ident);
            continue;
        }
        let wire = serde_rename(&field.attrs)?.unwrap_or_else(|| ident.to_string());
        declared.push(wire);
    }

    let Some(bag) = bag else {
        return Err(syn::Error::new_spanned(
            &input,
            "OpenRecord derive requires a field marked #[open(properties)]",
        ));
    };

    Ok(quote! {
        impl #impl_generics ::cloudant::OpenRecord for #name #ty_generics #where_clause {
            const DECLARED_FIELDS: &'static [&'static str] = &[#(#declared),*];

            fn properties(
                &self,
            ) -> &::cloudant::__private::serde_json::Map<::std::string::String, ::cloudant::__private::serde_json::Value> {
                &self.#bag
            }

            fn properties_mut_unchecked(
                &mut self,
            ) -> &mut ::cloudant::__private::serde_json::Map<::std::string::String, ::cloudant::__private::serde_json::Value> {
                &mut self.#bag
            }
        }
    })
}

/// Returns `true` for a field carrying `#[open(properties)]`.
fn is_properties_field(attrs: &[syn::Attribute]) -> syn::Result<bool> {
    let mut found = false;
    for attr in attrs {
        if !attr.path().is_ident("open") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("properties") {
                found = true;
                Ok(())
            } else {
                Err(meta.error("unsupported open attribute"))
            }
        })?;
    }
    Ok(found)
}

/// Read `rename = "..."` from the field's `#[serde(...)]` attributes.
fn serde_rename(attrs: &[syn::Attribute]) -> syn::Result<Option<String>> {
    let mut rename = None;
    for attr in attrs {
        if !attr.path().is_ident("serde") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") && meta.input.peek(syn::Token![=]) {
                let value: LitStr = meta.value()?.parse()?;
                rename = Some(value.value());
            } else if meta.input.peek(syn::Token![=]) {
                let _: syn::Expr = meta.value()?.parse()?;
            } else if meta.input.peek(syn::token::Paren) {
                meta.parse_nested_meta(|inner| {
                    if inner.input.peek(syn::Token![=]) {
                        let _: syn::Expr = inner.value()?.parse()?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })?;
    }
    Ok(rename)
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use quote::quote;

    use super::*;

    #[test]
    fn collects_declared_wire_names() {
        let input = quote! {
            struct Document {
                #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
                id: Option<String>,
                #[serde(default)]
                deleted: bool,
                #[serde(flatten)]
                #[open(properties)]
                properties: Map<String, Value>,
            }
        };
        let output = expand_open_record_derive(input).expect("expand").to_string();

        check!(output.contains("\"_id\" , \"deleted\""));
        check!(output.contains("& self . properties"));
    }

    #[test]
    fn reads_rename_past_nested_serde_attrs() {
        let attrs: Vec<syn::Attribute> = vec![
            syn::parse_quote!(#[serde(default, with = "crate::b64")]),
            syn::parse_quote!(#[serde(alias(x = "y"), rename = "_rev")]),
        ];
        check!(serde_rename(&attrs).expect("parse") == Some("_rev".to_string()));
    }

    #[test]
    fn requires_a_properties_field() {
        let input = quote! {
            struct Closed {
                id: String,
            }
        };
        check!(expand_open_record_derive(input).is_err());
    }

    #[test]
    fn rejects_two_properties_fields() {
        let input = quote! {
            struct Twice {
                #[open(properties)]
                a: Map<String, Value>,
                #[open(properties)]
                b: Map<String, Value>,
            }
        };
        check!(expand_open_record_derive(input).is_err());
    }
}
