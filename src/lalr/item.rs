use std::cell::{Ref, RefCell};
use std::collections::HashMap;
use std::fmt::{self, Write};

use indexmap::IndexSet;

use crate::lalr::meta::SymbolSet;
use crate::symbol::{SymbolId, SymbolIdSequence};

/// A grammar rule with its index in the table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProductionRule {
    index: usize,
    lhs: SymbolId,
    rhs: SymbolIdSequence,
}

impl ProductionRule {
    pub fn new(index: usize, lhs: SymbolId, rhs: SymbolIdSequence) -> ProductionRule {
        ProductionRule { index, lhs, rhs }
    }
    pub fn index(&self) -> usize {
        self.index
    }
    pub fn lhs(&self) -> SymbolId {
        self.lhs
    }
    pub fn rhs(&self) -> &SymbolIdSequence {
        &self.rhs
    }
    pub fn len(&self) -> usize {
        self.rhs.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rhs.is_empty()
    }

    pub fn display_with<'a>(
        &'a self,
        resolver: &'a dyn Fn(SymbolId) -> String,
    ) -> impl fmt::Display + 'a {
        RuleDisplay { rule: self, resolver }
    }
}

struct RuleDisplay<'a> {
    rule: &'a ProductionRule,
    resolver: &'a dyn Fn(SymbolId) -> String,
}

impl fmt::Display for RuleDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ::=", self.rule.index, (self.resolver)(self.rule.lhs))?;
        for s in self.rule.rhs.iter() {
            write!(f, " {}", (self.resolver)(*s))?;
        }
        Ok(())
    }
}

impl fmt::Display for ProductionRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.display_with(&|s| s.to_string()).fmt(f)
    }
}

/// Identity of an item: rule index and marker position.
pub type ItemKey = (usize, usize);

/// A rule with a marker and a set of lookaheads.
///
/// Two items are the same item if they share rule and marker; the lookaheads
/// live in a cell so they can grow while the item sits in a set.
#[derive(Debug, Clone)]
pub struct LrItem {
    rule: usize,
    marker: usize,
    is_kernel: bool,
    lookaheads: RefCell<SymbolSet>,
}

impl LrItem {
    pub fn new(rule: usize, marker: usize, is_kernel: bool) -> LrItem {
        LrItem::with_lookaheads(rule, marker, is_kernel, SymbolSet::new())
    }
    pub fn with_lookaheads(
        rule: usize,
        marker: usize,
        is_kernel: bool,
        lookaheads: SymbolSet,
    ) -> LrItem {
        LrItem {
            rule,
            marker,
            is_kernel,
            lookaheads: RefCell::new(lookaheads),
        }
    }
    pub fn key(&self) -> ItemKey {
        (self.rule, self.marker)
    }
    pub fn rule(&self) -> usize {
        self.rule
    }
    pub fn marker(&self) -> usize {
        self.marker
    }
    pub fn is_kernel(&self) -> bool {
        self.is_kernel
    }
    pub fn lookaheads(&self) -> Ref<'_, SymbolSet> {
        self.lookaheads.borrow()
    }
    /// Adds lookaheads, returns whether the set grew.
    pub fn add_lookaheads<'s>(&self, symbols: impl IntoIterator<Item = &'s SymbolId>) -> bool {
        let mut la = self.lookaheads.borrow_mut();
        let n = la.len();
        la.extend(symbols.into_iter().copied());
        la.len() > n
    }
    /// The symbol right after the marker, if any.
    pub fn marked_symbol(&self, rules: &[ProductionRule]) -> Option<SymbolId> {
        rules[self.rule].rhs().get(self.marker).copied()
    }
    pub fn is_complete(&self, rules: &[ProductionRule]) -> bool {
        self.marker >= rules[self.rule].len()
    }

    pub fn write_to(
        &self,
        out: &mut String,
        rules: &[ProductionRule],
        resolver: &dyn Fn(SymbolId) -> String,
    ) {
        let rule = &rules[self.rule];
        write!(out, "{} ::=", resolver(rule.lhs())).unwrap();
        for (i, s) in rule.rhs().iter().enumerate() {
            if i == self.marker {
                out.push_str(" *");
            }
            write!(out, " {}", resolver(*s)).unwrap();
        }
        if self.marker >= rule.len() {
            out.push_str(" *");
        }
        let la = self.lookaheads();
        if !la.is_empty() {
            let names: Vec<_> = la.iter().map(|s| resolver(*s)).collect();
            write!(out, " ({})", names.join(", ")).unwrap();
        }
    }
}

/// One state of the automaton.
#[derive(Debug, Clone, Default)]
pub struct LrItemSet {
    items: Vec<LrItem>,
    lookup: HashMap<ItemKey, usize>,
    index: Option<usize>,
    is_closed: bool,
    closure_nonterminals: Option<IndexSet<SymbolId>>,
}

impl LrItemSet {
    pub fn new(items: impl IntoIterator<Item = LrItem>) -> LrItemSet {
        let mut set = LrItemSet::default();
        for item in items {
            set.insert(item);
        }
        set
    }

    /// Adds a new item or merges the lookaheads of an existing one.
    /// Returns whether anything changed.
    pub fn insert(&mut self, item: LrItem) -> bool {
        match self.lookup.get(&item.key()) {
            Some(&i) => {
                let la = item.lookaheads.into_inner();
                self.items[i].add_lookaheads(&la)
            }
            None => {
                self.lookup.insert(item.key(), self.items.len());
                self.items.push(item);
                true
            }
        }
    }

    pub fn merge_with(&mut self, items: impl IntoIterator<Item = LrItem>) -> bool {
        let mut changed = false;
        for item in items {
            changed |= self.insert(item);
        }
        changed
    }

    pub fn get(&self, key: ItemKey) -> Option<&LrItem> {
        self.lookup.get(&key).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LrItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn kernels(&self) -> impl Iterator<Item = &LrItem> {
        self.items.iter().filter(|i| i.is_kernel)
    }

    /// Sorted identity of the kernel items. Two states are the same state if
    /// their kernel keys are equal.
    pub fn kernel_key(&self) -> Vec<ItemKey> {
        let mut key: Vec<_> = self.kernels().map(LrItem::key).collect();
        key.sort_unstable();
        key
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn set_index(&mut self, index: usize) {
        assert!(self.index.is_none() || self.index == Some(index), "state index assigned twice");
        self.index = Some(index);
    }

    pub fn is_closed(&self) -> bool {
        self.is_closed
    }

    pub(crate) fn set_closed(&mut self) {
        self.is_closed = true;
    }

    pub fn closure_nonterminals(&self) -> Option<&IndexSet<SymbolId>> {
        self.closure_nonterminals.as_ref()
    }

    pub(crate) fn set_closure_nonterminals(&mut self, nts: IndexSet<SymbolId>) {
        self.closure_nonterminals = Some(nts);
    }
}

impl<'a> IntoIterator for &'a LrItemSet {
    type Item = &'a LrItem;
    type IntoIter = std::slice::Iter<'a, LrItem>;
    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn la(s: &[i32]) -> SymbolSet {
        s.iter().map(|&i| SymbolId::new(i)).collect()
    }

    #[test]
    fn merge_unions_lookaheads_in_place() {
        let mut set = LrItemSet::new([LrItem::with_lookaheads(1, 0, false, la(&[5]))]);
        assert!(set.insert(LrItem::with_lookaheads(1, 0, false, la(&[6]))));
        assert!(!set.insert(LrItem::with_lookaheads(1, 0, false, la(&[5, 6]))));
        assert_eq!(set.len(), 1);
        assert_eq!(*set.get((1, 0)).unwrap().lookaheads(), la(&[5, 6]));
        assert!(set.insert(LrItem::new(1, 1, true)));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn kernel_key_ignores_order_and_nonkernels() {
        let a = LrItemSet::new([
            LrItem::new(3, 1, true),
            LrItem::new(2, 2, true),
            LrItem::new(4, 0, false),
        ]);
        let b = LrItemSet::new([LrItem::new(2, 2, true), LrItem::new(3, 1, true)]);
        assert_eq!(a.kernel_key(), b.kernel_key());
        assert_eq!(a.kernel_key(), vec![(2, 2), (3, 1)]);
    }
}
