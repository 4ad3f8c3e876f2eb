/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */
#![forbid(unsafe_code)]

//! Courier Macro Library
//!
//! Procedural macros for the Courier messaging extension.
//!
//! # Payload Macro
//!
//! The [`courier_payload`] macro turns a plain struct or enum into a type the
//! default JSON codec can carry inside an event envelope:
//!
//! ```ignore
//! #[courier_payload]
//! pub struct OrderData {
//!     pub order_id: String,
//!     pub quantity: u32,
//! }
//!
//! // Field names travel as camelCase on the wire
//! #[courier_payload(camel_case)]
//! pub struct ShipmentData {
//!     pub tracking_number: String,
//! }
//! ```

use proc_macro::TokenStream;

use quote::quote;
use syn::{parse_macro_input, DeriveInput};

fn has_derive(input: &DeriveInput, trait_name: &str) -> bool {
    input.attrs.iter().any(|attr| {
        if attr.path().is_ident("derive") {
            let mut found = false;
            let _ = attr.parse_nested_meta(|meta| {
                if meta.path.is_ident(trait_name) {
                    found = true;
                }
                Ok(())
            });
            found
        } else {
            false
        }
    })
}

/// Options parsed from `#[courier_payload(...)]`.
#[derive(Default)]
struct PayloadOptions {
    /// Rename every field to camelCase on the wire.
    camel_case: bool,
    /// Fill fields missing from the payload with `Default::default()`.
    lenient: bool,
}

impl PayloadOptions {
    fn parse(attr: &TokenStream) -> Self {
        let mut options = Self::default();
        let attr_string = attr.to_string();
        for part in attr_string.split(',') {
            match part.trim() {
                "camel_case" => options.camel_case = true,
                "lenient" => options.lenient = true,
                _ => {}
            }
        }
        options
    }
}

/// Derives everything a type needs to travel as a Courier payload.
///
/// The macro adds (only where not already present):
/// - `#[derive(Clone, Debug)]`
/// - `#[derive(Serialize, Deserialize)]` through the `serde` re-exported by
///   `courier`, so the caller does not need `serde` as a direct dependency
/// - a compile-time assertion that the type is `Send + Sync + 'static`, which
///   every payload must be because decoded values cross worker threads
///
/// # Options
///
/// * `camel_case` - adds `#[serde(rename_all = "camelCase")]`.
/// * `lenient` - adds `#[serde(default)]`; the type must then implement
///   `Default`, and fields absent from the payload are filled from it.
///
/// ```ignore
/// use courier::prelude::*;
///
/// #[courier_payload(camel_case, lenient)]
/// #[derive(Default)]
/// pub struct InventoryLevel {
///     pub sku: String,
///     pub on_hand: i64,
/// }
/// ```
#[proc_macro_attribute]
pub fn courier_payload(attr: TokenStream, item: TokenStream) -> TokenStream {
    let options = PayloadOptions::parse(&attr);
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let generics = &input.generics;
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let derives = {
        let mut traits = Vec::new();
        if !has_derive(&input, "Clone") {
            traits.push(quote!(Clone));
        }
        if !has_derive(&input, "Debug") {
            traits.push(quote!(Debug));
        }
        if !has_derive(&input, "Serialize") {
            traits.push(quote!(::courier::__private::serde::Serialize));
        }
        if !has_derive(&input, "Deserialize") {
            traits.push(quote!(::courier::__private::serde::Deserialize));
        }
        if traits.is_empty() {
            quote!()
        } else {
            quote!(#[derive(#(#traits),*)])
        }
    };

    let serde_attrs = {
        let mut attrs = vec![quote!(#[serde(crate = "::courier::__private::serde")])];
        if options.camel_case {
            attrs.push(quote!(#[serde(rename_all = "camelCase")]));
        }
        if options.lenient {
            attrs.push(quote!(#[serde(default)]));
        }
        quote!(#(#attrs)*)
    };

    let assert_ident = quote::format_ident!("_AssertCourierPayload_{}", name);

    let expanded = quote! {
        #derives
        #serde_attrs
        #input

        #[doc(hidden)]
        #[allow(dead_code, non_camel_case_types, non_snake_case, clippy::needless_lifetimes)]
        const _: () = {
            fn #assert_ident #impl_generics () #where_clause {
                fn assert_bounds<T: Send + Sync + 'static>() {}
                assert_bounds::<#name #ty_generics>();
            }
        };
    };

    TokenStream::from(expanded)
}
