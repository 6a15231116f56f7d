use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::Bound;

use crate::error::{GrammarDefect, GrammarError};
use crate::lalr::item::ProductionRule;
use crate::symbol::SymbolId;

/// The content of one cell of the table. A missing cell is an error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LalrAction {
    Accept,
    /// Consume the terminal and go to the given state.
    Shift(usize),
    /// Reduce by the given rule.
    Reduce(usize),
    /// Reduce/reduce conflict: all the rules that could be reduced.
    ReduceMulti(BTreeSet<usize>),
    /// Transition on a non-terminal after a reduction.
    Goto(usize),
}

impl LalrAction {
    /// Adds one more reduction to this cell, turning it into a
    /// [`LalrAction::ReduceMulti`] if it reduces a different rule.
    ///
    /// Only reduce actions can be merged.
    pub fn add_reduction(self, rule: usize) -> LalrAction {
        match self {
            LalrAction::Reduce(r) if r == rule => self,
            LalrAction::Reduce(r) => LalrAction::ReduceMulti([r, rule].into_iter().collect()),
            LalrAction::ReduceMulti(mut rules) => {
                rules.insert(rule);
                LalrAction::ReduceMulti(rules)
            }
            other => unreachable!("cannot merge a reduction into {}", other),
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, LalrAction::ReduceMulti(_))
    }
}

impl fmt::Display for LalrAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LalrAction::Accept => f.write_str("(accept)"),
            LalrAction::Shift(s) => write!(f, "s{}", s),
            LalrAction::Reduce(r) => write!(f, "r{}", r),
            LalrAction::ReduceMulti(rules) => {
                let rules: Vec<_> = rules.iter().map(|r| r.to_string()).collect();
                write!(f, "r({})", rules.join(","))
            }
            LalrAction::Goto(s) => write!(f, "g{}", s),
        }
    }
}

/// Coordinates of a table cell.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey {
    pub state: usize,
    pub symbol: SymbolId,
}

impl StateKey {
    pub fn new(state: usize, symbol: SymbolId) -> StateKey {
        StateKey { state, symbol }
    }
}

/// The output of the generator: an immutable action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LalrTable {
    start_state: usize,
    actions: BTreeMap<StateKey, LalrAction>,
    productions: Vec<ProductionRule>,
}

impl LalrTable {
    pub fn new(
        start_state: usize,
        actions: BTreeMap<StateKey, LalrAction>,
        productions: Vec<ProductionRule>,
    ) -> LalrTable {
        LalrTable {
            start_state,
            actions,
            productions,
        }
    }

    pub fn start_state(&self) -> usize {
        self.start_state
    }

    pub fn action(&self, state: usize, symbol: SymbolId) -> Option<&LalrAction> {
        self.actions.get(&StateKey::new(state, symbol))
    }

    pub fn actions(&self) -> &BTreeMap<StateKey, LalrAction> {
        &self.actions
    }

    /// All the cells of one state, ordered by symbol.
    pub fn actions_for(&self, state: usize) -> impl Iterator<Item = (SymbolId, &LalrAction)> {
        let lo = StateKey::new(state, SymbolId::new(i32::MIN));
        self.actions
            .range((Bound::Included(lo), Bound::Unbounded))
            .take_while(move |(k, _)| k.state == state)
            .map(|(k, a)| (k.symbol, a))
    }

    pub fn productions(&self) -> &[ProductionRule] {
        &self.productions
    }

    pub fn production(&self, index: usize) -> Option<&ProductionRule> {
        self.productions.get(index)
    }

    pub fn state_count(&self) -> usize {
        self.actions.keys().map(|k| k.state + 1).max().unwrap_or(0).max(self.start_state + 1)
    }

    /// Cells holding a reduce/reduce conflict.
    pub fn conflicts(&self) -> impl Iterator<Item = (&StateKey, &BTreeSet<usize>)> {
        self.actions.iter().filter_map(|(k, a)| match a {
            LalrAction::ReduceMulti(rules) => Some((k, rules)),
            _ => None,
        })
    }

    /// Fails with every conflict found if this table cannot be run by a
    /// deterministic parser.
    pub fn check_deterministic(&self) -> Result<(), GrammarError> {
        let defects = self
            .conflicts()
            .map(|(k, rules)| GrammarDefect::ReduceConflict {
                state: k.state,
                symbol: k.symbol,
                rules: rules.iter().copied().collect(),
            })
            .collect();
        GrammarError::check(defects)
    }

    /// A listing of every state and its actions, naming symbols with
    /// `resolver`.
    pub fn display_with<'a>(
        &'a self,
        resolver: &'a dyn Fn(SymbolId) -> String,
    ) -> impl fmt::Display + 'a {
        TableDisplay { table: self, resolver }
    }
}

struct TableDisplay<'a> {
    table: &'a LalrTable,
    resolver: &'a dyn Fn(SymbolId) -> String,
}

impl fmt::Display for TableDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut last = None;
        for (k, a) in &self.table.actions {
            if last != Some(k.state) {
                if last.is_some() {
                    writeln!(f)?;
                }
                writeln!(f, "State {}:", k.state)?;
                last = Some(k.state);
            }
            writeln!(f, "{:>30} {}", (self.resolver)(k.symbol), a)?;
        }
        Ok(())
    }
}

impl fmt::Display for LalrTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_with(&|s| s.to_string()).fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::SymbolIdSequence;

    #[test]
    fn shareable() {
        fn check<T: Send + Sync>() {}
        check::<LalrTable>();
    }

    #[test]
    fn reductions_accumulate() {
        let a = LalrAction::Reduce(2).add_reduction(2);
        assert_eq!(a, LalrAction::Reduce(2));
        let a = a.add_reduction(5);
        assert_eq!(a.to_string(), "r(2,5)");
        let a = a.add_reduction(3);
        assert_eq!(a.to_string(), "r(2,3,5)");
        assert!(a.is_ambiguous());
    }

    #[test]
    fn state_actions_and_conflicts() {
        let t1 = SymbolId::new(4);
        let mut actions = BTreeMap::new();
        actions.insert(StateKey::new(0, t1), LalrAction::Shift(1));
        actions.insert(StateKey::new(1, SymbolId::EOF), LalrAction::Accept);
        actions.insert(StateKey::new(1, t1), LalrAction::ReduceMulti([1, 2].into_iter().collect()));
        actions.insert(StateKey::new(2, t1), LalrAction::Reduce(1));
        let rhs = SymbolIdSequence::new([SymbolId::new(1)]);
        let rules = vec![ProductionRule::new(0, SymbolId::new(0), rhs)];
        let table = LalrTable::new(0, actions, rules);

        let s1: Vec<_> = table.actions_for(1).map(|(s, a)| (s, a.to_string())).collect();
        assert_eq!(s1, vec![(SymbolId::EOF, "(accept)".to_string()), (t1, "r(1,2)".to_string())]);
        assert_eq!(table.state_count(), 3);

        let err = table.check_deterministic().unwrap_err();
        assert_eq!(
            err.defects,
            vec![GrammarDefect::ReduceConflict { state: 1, symbol: t1, rules: vec![1, 2] }]
        );
    }
}
