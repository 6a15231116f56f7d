//! Grammar description consumed by the table generator.
//!
//! A grammar is a list of `(lhs, rhs)` productions plus four reserved symbols:
//! the "unknown" terminal, the end-of-input terminal ([`SymbolId::EOF`]), the
//! synthetic initial non-terminal `Init` and the user start symbol `Start`.
//! The generator adds the augmenting rule `Init ::= Start` itself.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use indexmap::IndexMap;

use crate::symbol::{SymbolId, SymbolIdSequence, SymbolKind};

/// Normalized view of a grammar.
pub trait GrammarData {
    fn unknown(&self) -> SymbolId;
    fn init(&self) -> SymbolId;
    fn start(&self) -> SymbolId;
    /// All productions, in definition order. Empty RHS is an epsilon rule.
    fn productions(&self) -> Vec<(SymbolId, SymbolIdSequence)>;
    /// Classification of every symbol the grammar uses.
    fn symbols(&self) -> BTreeMap<SymbolId, SymbolKind>;
}

/// All the rules of one left-hand side symbol.
#[derive(Debug, Clone)]
pub struct Production {
    lhs: SymbolId,
    rules: Vec<SymbolIdSequence>,
}

impl Production {
    fn new(lhs: SymbolId) -> Production {
        Production { lhs, rules: Vec::new() }
    }
    pub fn lhs(&self) -> SymbolId {
        self.lhs
    }
    pub fn rules(&self) -> &[SymbolIdSequence] {
        &self.rules
    }
    /// Adds a rule body. Adding the same body twice is a no-op, returns
    /// whether the rule is new.
    pub fn add(&mut self, rhs: impl Into<SymbolIdSequence>) -> bool {
        let rhs = rhs.into();
        if self.rules.contains(&rhs) {
            return false;
        }
        self.rules.push(rhs);
        true
    }
}

impl fmt::Display for Production {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rules.is_empty() {
            return write!(f, "{} (no rules)", self.lhs);
        }
        write!(f, "{} ::=", self.lhs)?;
        for (i, r) in self.rules.iter().enumerate() {
            if i > 0 {
                f.write_str(" |")?;
            }
            if !r.is_empty() {
                write!(f, " {}", r)?;
            }
        }
        Ok(())
    }
}

/// Builds a grammar from data, one rule at a time.
///
/// ```
/// use lalrkit::{GrammarBuilder, SymbolId};
///
/// let (init, start) = (SymbolId::new(0), SymbolId::new(1));
/// let (item, word) = (SymbolId::new(2), SymbolId::new(3));
/// let mut g = GrammarBuilder::new(SymbolId::UNKNOWN, init, start);
/// g.add(start, [item]);
/// g.add(start, [start, item]);
/// g.add(item, [word]);
/// ```
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    unknown: SymbolId,
    init: SymbolId,
    start: SymbolId,
    productions: IndexMap<SymbolId, Production>,
    symbols: Option<BTreeMap<SymbolId, SymbolKind>>,
}

impl GrammarBuilder {
    pub fn new(unknown: SymbolId, init: SymbolId, start: SymbolId) -> GrammarBuilder {
        GrammarBuilder {
            unknown,
            init,
            start,
            productions: IndexMap::new(),
            symbols: None,
        }
    }

    /// Uses an explicit symbol classifier instead of inferring one from the
    /// rules.
    pub fn with_symbols(
        mut self,
        symbols: impl IntoIterator<Item = (SymbolId, SymbolKind)>,
    ) -> GrammarBuilder {
        self.symbols = Some(symbols.into_iter().collect());
        self
    }

    /// Gets the production of `lhs`, creating an empty one if needed.
    pub fn define(&mut self, lhs: SymbolId) -> &mut Production {
        self.productions.entry(lhs).or_insert_with(|| Production::new(lhs))
    }

    /// Adds `lhs ::= rhs`. Duplicated rules are ignored.
    pub fn add(
        &mut self,
        lhs: SymbolId,
        rhs: impl IntoIterator<Item = SymbolId>,
    ) -> &mut GrammarBuilder {
        self.define(lhs).add(SymbolIdSequence::new(rhs));
        self
    }

    pub fn production(&self, lhs: SymbolId) -> Option<&Production> {
        self.productions.get(&lhs)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Production> {
        self.productions.values()
    }

    fn infer_symbols(&self) -> BTreeMap<SymbolId, SymbolKind> {
        let nonterminals: HashSet<SymbolId> = self
            .productions
            .keys()
            .copied()
            .chain([self.init, self.start])
            .collect();
        let mut symbols = BTreeMap::new();
        let referenced = [SymbolId::EOF, self.unknown, self.init, self.start]
            .into_iter()
            .chain(self.productions.values().flat_map(|p| {
                std::iter::once(p.lhs).chain(p.rules.iter().flat_map(|r| r.iter().copied()))
            }));
        for s in referenced {
            let kind = if nonterminals.contains(&s) {
                SymbolKind::Nonterminal
            } else {
                SymbolKind::Terminal
            };
            symbols.insert(s, kind);
        }
        symbols
    }
}

impl GrammarData for GrammarBuilder {
    fn unknown(&self) -> SymbolId {
        self.unknown
    }
    fn init(&self) -> SymbolId {
        self.init
    }
    fn start(&self) -> SymbolId {
        self.start
    }
    fn productions(&self) -> Vec<(SymbolId, SymbolIdSequence)> {
        self.productions
            .values()
            .flat_map(|p| p.rules.iter().map(move |r| (p.lhs, r.clone())))
            .collect()
    }
    fn symbols(&self) -> BTreeMap<SymbolId, SymbolKind> {
        match &self.symbols {
            Some(s) => s.clone(),
            None => self.infer_symbols(),
        }
    }
}
