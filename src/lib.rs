//! LALR(1) parsing tables and a shift-reduce parser to run them.
//!
//! A grammar is described with a [`GrammarBuilder`] (or anything implementing
//! [`GrammarData`]) using plain integer [`SymbolId`]s. The
//! [`TableGenerator`] turns it into an immutable [`LalrTable`], which a
//! [`Parser`] then walks one token at a time, calling back into a
//! [`ParserContext`] to build the syntax tree.
//!
//! ```
//! use lalrkit::*;
//!
//! const INIT: SymbolId = SymbolId::new(0);
//! const LIST: SymbolId = SymbolId::new(1);
//! const WORD: SymbolId = SymbolId::new(2);
//!
//! let mut g = GrammarBuilder::new(SymbolId::UNKNOWN, INIT, LIST);
//! g.add(LIST, [WORD]).add(LIST, [LIST, WORD]);
//! let table = TableGenerator::new(&g).unwrap().compute_table();
//!
//! struct Count(usize);
//! impl ParserContext for Count {
//!     type Node = usize;
//!     fn create_terminal(&mut self, _: SymbolId, _: &str, _: usize) -> usize {
//!         1
//!     }
//!     fn create_nonterminal(&mut self, _: &ProductionRule, children: Vec<usize>) -> usize {
//!         children.iter().sum()
//!     }
//!     fn accept(&mut self, root: usize) {
//!         self.0 = root;
//!     }
//! }
//!
//! let mut p = Parser::new(&table, Count(0)).unwrap();
//! for (i, w) in "a b c".split(' ').enumerate() {
//!     p.process_token(WORD, w, i).unwrap();
//! }
//! assert_eq!(p.end_of_input(3), Ok(Progress::Accepted));
//! assert_eq!(p.into_context().0, 3);
//! ```

mod cache;
mod error;
mod grammar;
pub mod lalr;
pub mod parser;
mod symbol;

pub use cache::LazyTable;
pub use error::{FlatTableError, GrammarDefect, GrammarError, ParseError, ReservedSymbol};
pub use grammar::{GrammarBuilder, GrammarData, Production};
pub use lalr::flat::{FlatTable, FlatTableBuf};
pub use lalr::item::ProductionRule;
pub use lalr::table::{LalrAction, LalrTable, StateKey};
pub use lalr::{GeneratorConfig, TableGenerator};
pub use parser::{
    Parser, ParserConfig, ParserContext, ParserState, ParserStats, Progress, SyntaxErrorInfo,
};
pub use symbol::{SymbolId, SymbolIdSequence, SymbolKind};

#[cfg(test)]
mod tests;
