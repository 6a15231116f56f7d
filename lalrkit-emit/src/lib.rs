//! Rust source for a prebuilt [`LalrTable`].
//!
//! A build script computes the table once and writes it out; the crate then
//! `include!`s the file and gets the table back without running the
//! generator:
//!
//! ```no_run
//! # fn grammar() -> lalrkit::GrammarBuilder { unimplemented!() }
//! // build.rs
//! let table = lalrkit::TableGenerator::new(&grammar()).unwrap().compute_table();
//! let src = lalrkit_emit::emit_to_string(&table, &Default::default());
//! let out = std::path::Path::new(&std::env::var("OUT_DIR").unwrap()).join("table.rs");
//! std::fs::write(out, src).unwrap();
//! ```
//!
//! The generated module holds the table as `static` arrays in the layout of
//! [`lalrkit::FlatTable`], plus `flat()` and `table()` functions.

use lalrkit::{FlatTableBuf, LalrTable};
use proc_macro2::{Ident, Literal, Span, TokenStream};
use quote::quote;
use syn::{parse_quote, Path, Visibility};

#[derive(Debug, Clone)]
pub struct EmitOptions {
    /// Name of the generated module.
    pub module: Ident,
    /// Path of the `lalrkit` crate as seen from the generated code.
    pub crate_path: Path,
    pub visibility: Visibility,
}

impl Default for EmitOptions {
    fn default() -> EmitOptions {
        EmitOptions {
            module: Ident::new("table", Span::call_site()),
            crate_path: parse_quote!(::lalrkit),
            visibility: parse_quote!(pub),
        }
    }
}

fn unsigned(values: &[u32]) -> impl Iterator<Item = TokenStream> + '_ {
    values.iter().map(|&v| {
        let v = Literal::u32_unsuffixed(v);
        quote!(#v)
    })
}

fn signed(values: &[i32]) -> impl Iterator<Item = TokenStream> + '_ {
    values.iter().map(|&v| {
        let abs = Literal::u32_unsuffixed(v.unsigned_abs());
        if v < 0 {
            quote!(-#abs)
        } else {
            quote!(#abs)
        }
    })
}

fn static_array(
    name: &str,
    ty: TokenStream,
    items: impl Iterator<Item = TokenStream>,
) -> TokenStream {
    let name = Ident::new(name, Span::call_site());
    let items: Vec<_> = items.collect();
    let len = items.len();
    quote!(static #name: [#ty; #len] = [ #(#items),* ];)
}

/// The module holding `table`.
pub fn emit_table(table: &LalrTable, options: &EmitOptions) -> TokenStream {
    let FlatTableBuf {
        start_state,
        action_states,
        action_symbols,
        action_kinds,
        action_values,
        reduce_multi,
        rule_lhs,
        rule_rhs_offsets,
        rule_rhs,
    } = table.to_flat();
    log::debug!(
        "emitting {} actions and {} rules as module {}",
        action_states.len(),
        rule_lhs.len(),
        options.module
    );

    let mut src = TokenStream::new();
    src.extend(static_array("ACTION_STATES", quote!(u32), unsigned(&action_states)));
    src.extend(static_array("ACTION_SYMBOLS", quote!(i32), signed(&action_symbols)));
    src.extend(static_array(
        "ACTION_KINDS",
        quote!(u8),
        action_kinds.iter().map(|&k| {
            let k = Literal::u8_unsuffixed(k);
            quote!(#k)
        }),
    ));
    src.extend(static_array("ACTION_VALUES", quote!(u32), unsigned(&action_values)));
    src.extend(static_array("REDUCE_MULTI", quote!(u32), unsigned(&reduce_multi)));
    src.extend(static_array("RULE_LHS", quote!(i32), signed(&rule_lhs)));
    src.extend(static_array("RULE_RHS_OFFSETS", quote!(u32), unsigned(&rule_rhs_offsets)));
    src.extend(static_array("RULE_RHS", quote!(i32), signed(&rule_rhs)));

    let EmitOptions {
        module,
        crate_path,
        visibility,
    } = options;
    let start_state = Literal::u32_unsuffixed(start_state);
    quote! {
        #visibility mod #module {
            #![allow(dead_code)]

            pub const START_STATE: u32 = #start_state;

            #src

            pub fn flat() -> #crate_path::FlatTable<'static> {
                #crate_path::FlatTable {
                    start_state: START_STATE,
                    action_states: &ACTION_STATES,
                    action_symbols: &ACTION_SYMBOLS,
                    action_kinds: &ACTION_KINDS,
                    action_values: &ACTION_VALUES,
                    reduce_multi: &REDUCE_MULTI,
                    rule_lhs: &RULE_LHS,
                    rule_rhs_offsets: &RULE_RHS_OFFSETS,
                    rule_rhs: &RULE_RHS,
                }
            }

            pub fn table() -> #crate_path::LalrTable {
                match #crate_path::LalrTable::from_flat(flat()) {
                    ::core::result::Result::Ok(table) => table,
                    ::core::result::Result::Err(e) => panic!("corrupt generated table: {}", e),
                }
            }
        }
    }
}

/// [`emit_table`] rendered as source text, ready to be written to a file.
pub fn emit_to_string(table: &LalrTable, options: &EmitOptions) -> String {
    emit_table(table, options).to_string()
}
