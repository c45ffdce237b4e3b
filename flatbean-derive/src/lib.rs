// SPDX-License-Identifier: Apache-2.0
// Copyright 2026 Joe Pearson
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Derive macro for `flatbean::Bean`.
//!
//! # Example
//!
//! ```ignore
//! #[derive(Bean, Default)]
//! pub struct Passenger {
//!     #[flatbean(rename = "fullName")]
//!     pub name: String,
//!     pub age: Option<i64>,
//!     #[flatbean(skip)]
//!     pub scratch: String,
//! }
//! ```
//!
//! Each named field becomes a property read and written by
//! `get_property`/`set_property`; the property name defaults to the
//! field's own name. A field's type must implement
//! `flatbean::value::IntoValue`/`FromValue` — implemented already for
//! `String`, `i64`, `f64`, `bool`, `chrono::NaiveDate`, `flatbean::Value`,
//! and `Option<T>` of any of those. Field types must also implement
//! `Clone`, since `get_property` reads a field's value without taking
//! ownership of the bean.

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Lit, Meta};

enum FieldAttribute {
    Rename(String),
    Skip,
}

fn parse_field_attribute(field: &syn::Field) -> Option<FieldAttribute> {
    for attr in &field.attrs {
        if !attr.path().is_ident("flatbean") {
            continue;
        }
        if let Ok(meta) = attr.parse_args::<Meta>() {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("rename") => {
                    if let syn::Expr::Lit(syn::ExprLit {
                        lit: Lit::Str(s), ..
                    }) = nv.value
                    {
                        return Some(FieldAttribute::Rename(s.value()));
                    }
                }
                Meta::Path(path) if path.is_ident("skip") => {
                    return Some(FieldAttribute::Skip);
                }
                _ => {}
            }
        }
    }
    None
}

/// Derive macro for implementing the `flatbean::Bean` trait.
#[proc_macro_derive(Bean, attributes(flatbean))]
pub fn derive_bean(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => panic!("Bean derive only supports structs with named fields"),
        },
        _ => panic!("Bean derive only supports structs"),
    };

    let mut getters = Vec::new();
    let mut setters = Vec::new();

    for field in fields {
        let field_ident = field.ident.as_ref().unwrap();
        match parse_field_attribute(field) {
            Some(FieldAttribute::Skip) => continue,
            attr => {
                let property_name = match attr {
                    Some(FieldAttribute::Rename(name)) => name,
                    _ => field_ident.to_string(),
                };

                getters.push(quote! {
                    #property_name => ::core::option::Option::Some(
                        ::flatbean::value::IntoValue::into_value(self.#field_ident.clone())
                    )
                });

                setters.push(quote! {
                    #property_name => {
                        self.#field_ident = ::flatbean::value::FromValue::from_value(value)
                            .map_err(|reason| ::flatbean::bean::PropertyError::TypeMismatch {
                                property: name.to_owned(),
                                expected: reason,
                            })?;
                        ::core::result::Result::Ok(())
                    }
                });
            }
        }
    }

    let expanded = quote! {
        impl #impl_generics ::flatbean::bean::Bean for #name #ty_generics #where_clause {
            fn get_property(&self, name: &str) -> ::core::option::Option<::flatbean::value::Value> {
                match name {
                    #(#getters,)*
                    _ => ::core::option::Option::None,
                }
            }

            fn set_property(
                &mut self,
                name: &str,
                value: ::flatbean::value::Value,
            ) -> ::core::result::Result<(), ::flatbean::bean::PropertyError> {
                match name {
                    #(#setters,)*
                    other => ::core::result::Result::Err(::flatbean::bean::PropertyError::Unknown {
                        property: other.to_owned(),
                    }),
                }
            }

            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }
        }
    };

    TokenStream::from(expanded)
}
