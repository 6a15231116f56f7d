//! A table laid out as plain integer arrays, so it can be stored in `static`
//! items of generated code and rebuilt without running the generator.
//!
//! Actions are stored as four parallel arrays, one entry per table cell.
//! The value of a `ReduceMulti` entry is an offset into `reduce_multi`, where
//! the number of rules is followed by the rules themselves. The right-hand
//! sides of the rules are concatenated in `rule_rhs`, rule `i` spanning
//! `rule_rhs_offsets[i]..rule_rhs_offsets[i + 1]`.

use std::collections::BTreeMap;

use crate::error::FlatTableError;
use crate::lalr::item::ProductionRule;
use crate::lalr::table::{LalrAction, LalrTable, StateKey};
use crate::symbol::SymbolId;

pub const KIND_ACCEPT: u8 = 0;
pub const KIND_SHIFT: u8 = 1;
pub const KIND_REDUCE: u8 = 2;
pub const KIND_REDUCE_MULTI: u8 = 3;
pub const KIND_GOTO: u8 = 4;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FlatTable<'a> {
    pub start_state: u32,
    pub action_states: &'a [u32],
    pub action_symbols: &'a [i32],
    pub action_kinds: &'a [u8],
    pub action_values: &'a [u32],
    pub reduce_multi: &'a [u32],
    pub rule_lhs: &'a [i32],
    pub rule_rhs_offsets: &'a [u32],
    pub rule_rhs: &'a [i32],
}

/// Owned version of [`FlatTable`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlatTableBuf {
    pub start_state: u32,
    pub action_states: Vec<u32>,
    pub action_symbols: Vec<i32>,
    pub action_kinds: Vec<u8>,
    pub action_values: Vec<u32>,
    pub reduce_multi: Vec<u32>,
    pub rule_lhs: Vec<i32>,
    pub rule_rhs_offsets: Vec<u32>,
    pub rule_rhs: Vec<i32>,
}

impl FlatTableBuf {
    pub fn as_flat(&self) -> FlatTable<'_> {
        FlatTable {
            start_state: self.start_state,
            action_states: &self.action_states,
            action_symbols: &self.action_symbols,
            action_kinds: &self.action_kinds,
            action_values: &self.action_values,
            reduce_multi: &self.reduce_multi,
            rule_lhs: &self.rule_lhs,
            rule_rhs_offsets: &self.rule_rhs_offsets,
            rule_rhs: &self.rule_rhs,
        }
    }
}

fn to_u32(value: usize) -> u32 {
    match u32::try_from(value) {
        Ok(v) => v,
        Err(_) => panic!("table index {} does not fit in 32 bits", value),
    }
}

fn to_index(what: &'static str, value: u32, limit: usize) -> Result<usize, FlatTableError> {
    let index = value as usize;
    if index < limit {
        Ok(index)
    } else {
        Err(FlatTableError::OutOfRange {
            what,
            value: u64::from(value),
        })
    }
}

impl LalrTable {
    pub fn to_flat(&self) -> FlatTableBuf {
        let mut flat = FlatTableBuf {
            start_state: to_u32(self.start_state()),
            ..FlatTableBuf::default()
        };
        for (key, action) in self.actions() {
            let (kind, value) = match action {
                LalrAction::Accept => (KIND_ACCEPT, 0),
                LalrAction::Shift(s) => (KIND_SHIFT, to_u32(*s)),
                LalrAction::Reduce(r) => (KIND_REDUCE, to_u32(*r)),
                LalrAction::ReduceMulti(rules) => {
                    let offset = to_u32(flat.reduce_multi.len());
                    flat.reduce_multi.push(to_u32(rules.len()));
                    flat.reduce_multi.extend(rules.iter().map(|&r| to_u32(r)));
                    (KIND_REDUCE_MULTI, offset)
                }
                LalrAction::Goto(s) => (KIND_GOTO, to_u32(*s)),
            };
            flat.action_states.push(to_u32(key.state));
            flat.action_symbols.push(key.symbol.value());
            flat.action_kinds.push(kind);
            flat.action_values.push(value);
        }
        flat.rule_rhs_offsets.push(0);
        for rule in self.productions() {
            flat.rule_lhs.push(rule.lhs().value());
            flat.rule_rhs.extend(rule.rhs().iter().map(|s| s.value()));
            flat.rule_rhs_offsets.push(to_u32(flat.rule_rhs.len()));
        }
        flat
    }

    /// Rebuilds a table from its flat form. Inconsistent data is reported as
    /// an error.
    pub fn from_flat(flat: FlatTable<'_>) -> Result<LalrTable, FlatTableError> {
        let n_rules = flat.rule_lhs.len();
        if flat.rule_rhs_offsets.len() != n_rules + 1 {
            return Err(FlatTableError::LengthMismatch("rule_rhs_offsets"));
        }
        let mut productions = Vec::with_capacity(n_rules);
        let mut prev = 0;
        for (index, &lhs) in flat.rule_lhs.iter().enumerate() {
            let lo = flat.rule_rhs_offsets[index] as usize;
            let hi = flat.rule_rhs_offsets[index + 1] as usize;
            if lo != prev || hi < lo || hi > flat.rule_rhs.len() {
                return Err(FlatTableError::OutOfRange {
                    what: "rule_rhs_offsets",
                    value: hi as u64,
                });
            }
            prev = hi;
            let rhs = flat.rule_rhs[lo..hi].iter().map(|&s| SymbolId::new(s)).collect();
            productions.push(ProductionRule::new(index, SymbolId::new(lhs), rhs));
        }
        if prev != flat.rule_rhs.len() {
            return Err(FlatTableError::LengthMismatch("rule_rhs"));
        }

        let n_actions = flat.action_states.len();
        if flat.action_symbols.len() != n_actions {
            return Err(FlatTableError::LengthMismatch("action_symbols"));
        }
        if flat.action_kinds.len() != n_actions {
            return Err(FlatTableError::LengthMismatch("action_kinds"));
        }
        if flat.action_values.len() != n_actions {
            return Err(FlatTableError::LengthMismatch("action_values"));
        }
        let n_states = flat
            .action_states
            .iter()
            .map(|&s| s as usize + 1)
            .max()
            .unwrap_or(0)
            .max(flat.start_state as usize + 1);

        let mut actions = BTreeMap::new();
        for entry in 0..n_actions {
            let state = flat.action_states[entry] as usize;
            let symbol = SymbolId::new(flat.action_symbols[entry]);
            let value = flat.action_values[entry];
            let action = match flat.action_kinds[entry] {
                KIND_ACCEPT => LalrAction::Accept,
                KIND_SHIFT => LalrAction::Shift(to_index("shift state", value, n_states)?),
                KIND_REDUCE => LalrAction::Reduce(to_index("reduce rule", value, n_rules)?),
                KIND_REDUCE_MULTI => {
                    let offset = to_index("reduce_multi offset", value, flat.reduce_multi.len())?;
                    let count = flat.reduce_multi[offset] as usize;
                    let rules = flat
                        .reduce_multi
                        .get(offset + 1..offset + 1 + count)
                        .ok_or(FlatTableError::LengthMismatch("reduce_multi"))?;
                    let rules = rules
                        .iter()
                        .map(|&r| to_index("reduce rule", r, n_rules))
                        .collect::<Result<_, _>>()?;
                    LalrAction::ReduceMulti(rules)
                }
                KIND_GOTO => LalrAction::Goto(to_index("goto state", value, n_states)?),
                kind => return Err(FlatTableError::BadKind { entry, kind }),
            };
            if actions.insert(StateKey::new(state, symbol), action).is_some() {
                return Err(FlatTableError::DuplicateAction { state, symbol });
            }
        }
        Ok(LalrTable::new(flat.start_state as usize, actions, productions))
    }
}
