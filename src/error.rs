use std::fmt;

use thiserror::Error;

use crate::symbol::{SymbolId, SymbolKind};

/// The four symbols every grammar reserves.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReservedSymbol {
    Unknown,
    Eof,
    Init,
    Start,
}

impl fmt::Display for ReservedSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReservedSymbol::Unknown => "Unknown",
            ReservedSymbol::Eof => "Eof",
            ReservedSymbol::Init => "Init",
            ReservedSymbol::Start => "Start",
        };
        f.write_str(name)
    }
}

fn kind_name(kind: &SymbolKind) -> &'static str {
    match kind {
        SymbolKind::Terminal => "terminal",
        SymbolKind::Nonterminal => "non-terminal",
    }
}

fn rule_list(rules: &[usize]) -> String {
    rules.iter().map(|r| r.to_string()).collect::<Vec<_>>().join(", ")
}

/// One problem found in a grammar or in the table built from it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarDefect {
    #[error("the '{role}' symbol {symbol} must be a {}", kind_name(.expected))]
    WrongKind {
        role: ReservedSymbol,
        symbol: SymbolId,
        expected: SymbolKind,
    },
    #[error("symbol {symbol} used in a rule of {lhs} is not declared")]
    UndefinedSymbol { symbol: SymbolId, lhs: SymbolId },
    #[error("non-terminal {symbol} has no rules")]
    NoRules { symbol: SymbolId },
    #[error("the 'Init' symbol {symbol} cannot be the left-hand side of a grammar rule")]
    InitHasRules { symbol: SymbolId },
    #[error("terminal {symbol} cannot be the left-hand side of a grammar rule")]
    TerminalHasRules { symbol: SymbolId },
    #[error("symbol id {symbol} is reserved for table construction")]
    ReservedId { symbol: SymbolId },
    #[error(
        "reduce/reduce conflict in state {state} on symbol {symbol} between rules {}",
        rule_list(.rules)
    )]
    ReduceConflict {
        state: usize,
        symbol: SymbolId,
        rules: Vec<usize>,
    },
}

/// Every defect found while validating a grammar, reported together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct GrammarError {
    pub defects: Vec<GrammarDefect>,
}

impl GrammarError {
    pub(crate) fn check(defects: Vec<GrammarDefect>) -> Result<(), GrammarError> {
        if defects.is_empty() {
            Ok(())
        } else {
            Err(GrammarError { defects })
        }
    }
}

impl fmt::Display for GrammarError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid grammar ({} problem", self.defects.len())?;
        if self.defects.len() != 1 {
            f.write_str("s")?;
        }
        f.write_str(")")?;
        for d in &self.defects {
            write!(f, "\n  - {}", d)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("syntax error: found {found}, expected one of [{}]", symbol_list(.expected))]
    Syntax {
        expected: Vec<SymbolId>,
        found: SymbolId,
    },
    #[error("parser stack overflow (limit {limit})")]
    StackOverflow { limit: usize },
    #[error("the parser has already finished")]
    Finished,
}

fn symbol_list(symbols: &[SymbolId]) -> String {
    symbols.iter().map(|s| s.to_string()).collect::<Vec<_>>().join(", ")
}

/// Corrupt or inconsistent flat table data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlatTableError {
    #[error("flat table array '{0}' has the wrong length")]
    LengthMismatch(&'static str),
    #[error("unknown action kind {kind} at entry {entry}")]
    BadKind { entry: usize, kind: u8 },
    #[error("'{what}' value {value} is out of range")]
    OutOfRange { what: &'static str, value: u64 },
    #[error("duplicate action for state {state} and symbol {symbol}")]
    DuplicateAction { state: usize, symbol: SymbolId },
}
