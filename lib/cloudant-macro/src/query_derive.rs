//! Query derive macro implementation.

use proc_macro2::TokenStream;
use quote::quote;
use syn::{DeriveInput, Fields, Type, parse2};

/// How a field is written to the query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Format {
    /// `Display` of the value; one pair per element for `Vec<T>`.
    #[default]
    Plain,
    /// `Vec<T>` (or `Option<Vec<T>>`) joined with commas into a single pair.
    Csv,
    /// The value encoded as a JSON document.
    Json,
}

impl Format {
    fn parse(lit: &syn::LitStr) -> syn::Result<Self> {
        match lit.value().as_str() {
            "multi" | "plain" => Ok(Self::Plain),
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            other => Err(syn::Error::new_spanned(
                lit,
                format!("unknown query format \"{other}\". Expected one of: multi, csv, json"),
            )),
        }
    }
}

/// Field options parsed from `#[query(...)]` attributes.
#[derive(Debug, Clone, Default)]
struct QueryFieldOptions {
    /// Leave the field out of the query string.
    skip: bool,
    /// Rename the field in query string
    rename: Option<String>,
    /// Value format
    format: Format,
}

/// Expand the `#[derive(Query)]` macro.
pub fn expand_query_derive(input: TokenStream) -> syn::Result<TokenStream> {
    let input: DeriveInput = parse2(input)?;
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        syn::Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Query derive only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Query derive only supports structs",
            ));
        }
    };

    let mut field_handlers = Vec::new();

    for field in fields {
        let Some(field_name) = field.ident.as_ref() else {
            continue;
        };
        let options = parse_query_field_options(&field.attrs)?;
        if options.skip {
            continue;
        }

        let key = options
            .rename
            .clone()
            .unwrap_or_else(|| field_name.to_string());

        field_handlers.push(generate_field_handler(field_name, &field.ty, &key, options.format)?);
    }

    Ok(quote! {
        impl #impl_generics ::cloudant::ToQueryPairs for #name #ty_generics #where_clause {
            fn to_query_pairs(
                &self,
            ) -> ::cloudant::Result<::std::vec::Vec<(::std::string::String, ::std::string::String)>> {
                #[allow(unused_mut)]
                let mut pairs = ::std::vec::Vec::new();
                #(#field_handlers)*
                ::std::result::Result::Ok(pairs)
            }
        }
    })
}

/// Parse field options from `#[query(...)]` attributes.
fn parse_query_field_options(attrs: &[syn::Attribute]) -> syn::Result<QueryFieldOptions> {
    let mut options = QueryFieldOptions::default();

    for attr in attrs {
        if !attr.path().is_ident("query") {
            continue;
        }

        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("skip") {
                options.skip = true;
            } else if meta.path.is_ident("rename") {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.rename = Some(value.value());
            } else if meta.path.is_ident("format") {
                let value: syn::LitStr = meta.value()?.parse()?;
                options.format = Format::parse(&value)?;
            } else {
                return Err(meta.error("unsupported query attribute"));
            }
            Ok(())
        })?;
    }

    Ok(options)
}

/// Tokens turning `value` (a reference) into the query string value.
fn render(format: Format) -> TokenStream {
    match format {
        Format::Json => quote! { ::cloudant::__private::serde_json::to_string(value)? },
        Format::Plain | Format::Csv => quote! { value.to_string() },
    }
}

/// Generate code for handling a single field.
fn generate_field_handler(
    field_name: &syn::Ident,
    field_ty: &Type,
    key: &str,
    format: Format,
) -> syn::Result<TokenStream> {
    if is_wrapper(field_ty, "Option") {
        let value = match format {
            Format::Csv => quote! {
                value.iter()
                    .map(::std::string::ToString::to_string)
                    .collect::<::std::vec::Vec<_>>()
                    .join(",")
            },
            other => render(other),
        };
        return Ok(quote! {
            if let ::std::option::Option::Some(value) = &self.#field_name {
                pairs.push((#key.to_string(), #value));
            }
        });
    }

    if is_wrapper(field_ty, "Vec") {
        return Ok(match format {
            Format::Csv => quote! {
                if !self.#field_name.is_empty() {
                    let value = self.#field_name.iter()
                        .map(::std::string::ToString::to_string)
                        .collect::<::std::vec::Vec<_>>()
                        .join(",");
                    pairs.push((#key.to_string(), value));
                }
            },
            Format::Json => quote! {
                if !self.#field_name.is_empty() {
                    let value = &self.#field_name;
                    pairs.push((#key.to_string(), ::cloudant::__private::serde_json::to_string(value)?));
                }
            },
            Format::Plain => quote! {
                for value in &self.#field_name {
                    pairs.push((#key.to_string(), value.to_string()));
                }
            },
        });
    }

    if format == Format::Csv {
        return Err(syn::Error::new_spanned(
            field_ty,
            "format = \"csv\" requires a Vec<T> field",
        ));
    }
    let value = render(format);
    Ok(quote! {
        {
            let value = &self.#field_name;
            pairs.push((#key.to_string(), #value));
        }
    })
}

/// Check if a type is `Wrapper<T>` by its last path segment.
fn is_wrapper(ty: &Type, wrapper: &str) -> bool {
    matches!(ty, Type::Path(type_path)
        if type_path.path.segments.last()
            .is_some_and(|seg| seg.ident == wrapper))
}

#[cfg(test)]
mod tests {
    use assert2::check;
    use quote::quote;

    use super::*;

    #[test]
    fn wrapper_detection() {
        let ty: Type = syn::parse_quote!(Option<String>);
        check!(is_wrapper(&ty, "Option"));

        let ty: Type = syn::parse_quote!(Vec<u32>);
        check!(is_wrapper(&ty, "Vec"));

        let ty: Type = syn::parse_quote!(Option<Vec<String>>);
        check!(!is_wrapper(&ty, "Vec"));
    }

    #[test]
    fn skips_marked_fields() {
        let input = quote! {
            struct Params {
                #[query(skip)]
                db: String,
                limit: Option<u32>,
            }
        };
        let output = expand_query_derive(input).expect("expand").to_string();

        check!(!output.contains("\"db\""));
        check!(output.contains("\"limit\""));
    }

    #[test]
    fn json_format_uses_serde_json() {
        let input = quote! {
            struct Params {
                #[query(format = "json", rename = "startkey")]
                start_key: Option<String>,
            }
        };
        let output = expand_query_derive(input).expect("expand").to_string();

        check!(output.contains("\"startkey\""));
        check!(output.contains("serde_json :: to_string"));
    }

    #[test]
    fn rejects_unknown_format() {
        let input = quote! {
            struct Params {
                #[query(format = "pipes")]
                tags: Vec<String>,
            }
        };
        check!(expand_query_derive(input).is_err());
    }

    #[test]
    fn csv_accepts_optional_lists() {
        let input = quote! {
            struct Params {
                #[query(format = "csv")]
                states: Option<Vec<String>>,
            }
        };
        let output = expand_query_derive(input).expect("expand").to_string();

        check!(output.contains("join"));
    }

    #[test]
    fn rejects_csv_on_scalar() {
        let input = quote! {
            struct Params {
                #[query(format = "csv")]
                tag: String,
            }
        };
        check!(expand_query_derive(input).is_err());
    }

    #[test]
    fn rejects_enums() {
        let input = quote! {
            enum Params { A, B }
        };
        check!(expand_query_derive(input).is_err());
    }
}
