use std::fmt;
use std::ops::Deref;

/// Identity of a terminal or nonterminal symbol.
///
/// Negative values are reserved for sentinels, see [`SymbolId::EOF`] and
/// [`SymbolId::UNKNOWN`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolId(i32);

impl SymbolId {
    /// End of input. Fixed for every grammar.
    pub const EOF: SymbolId = SymbolId(-1);
    /// Default "unknown" terminal, also used as a placeholder lookahead while
    /// building the tables.
    pub const UNKNOWN: SymbolId = SymbolId(-2);

    pub const fn new(id: i32) -> SymbolId {
        SymbolId(id)
    }
    pub const fn value(self) -> i32 {
        self.0
    }
}

impl From<i32> for SymbolId {
    fn from(id: i32) -> SymbolId {
        SymbolId(id)
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == SymbolId::EOF {
            f.write_str("(EOF)")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Terminal,
    Nonterminal,
}

/// The right-hand side of a rule. Two sequences with the same symbols are the
/// same rule body.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SymbolIdSequence(Vec<SymbolId>);

impl SymbolIdSequence {
    pub fn new(ids: impl IntoIterator<Item = SymbolId>) -> SymbolIdSequence {
        SymbolIdSequence(ids.into_iter().collect())
    }
    pub fn empty() -> SymbolIdSequence {
        SymbolIdSequence(Vec::new())
    }
    pub fn as_slice(&self) -> &[SymbolId] {
        &self.0
    }
}

impl Deref for SymbolIdSequence {
    type Target = [SymbolId];
    fn deref(&self) -> &[SymbolId] {
        &self.0
    }
}

impl From<Vec<SymbolId>> for SymbolIdSequence {
    fn from(ids: Vec<SymbolId>) -> SymbolIdSequence {
        SymbolIdSequence(ids)
    }
}

impl<'a> From<&'a [SymbolId]> for SymbolIdSequence {
    fn from(ids: &'a [SymbolId]) -> SymbolIdSequence {
        SymbolIdSequence(ids.to_vec())
    }
}

impl FromIterator<SymbolId> for SymbolIdSequence {
    fn from_iter<I: IntoIterator<Item = SymbolId>>(iter: I) -> SymbolIdSequence {
        SymbolIdSequence::new(iter)
    }
}

impl fmt::Display for SymbolIdSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, s) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", s)?;
        }
        Ok(())
    }
}
