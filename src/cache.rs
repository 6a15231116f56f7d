use once_cell::sync::OnceCell;

use crate::error::GrammarError;
use crate::lalr::table::LalrTable;

/// A table built on first use and shared by every thread afterwards.
///
/// ```
/// use lalrkit::{GrammarBuilder, LalrTable, LazyTable, SymbolId, TableGenerator};
///
/// fn build() -> Result<LalrTable, lalrkit::GrammarError> {
///     let (init, start, word) = (SymbolId::new(0), SymbolId::new(1), SymbolId::new(2));
///     let mut g = GrammarBuilder::new(SymbolId::UNKNOWN, init, start);
///     g.add(start, [word]);
///     Ok(TableGenerator::new(&g)?.compute_table())
/// }
///
/// static TABLE: LazyTable = LazyTable::new(build);
///
/// let table = TABLE.get().unwrap();
/// assert!(std::ptr::eq(table, TABLE.get().unwrap()));
/// ```
pub struct LazyTable {
    cell: OnceCell<LalrTable>,
    build: fn() -> Result<LalrTable, GrammarError>,
}

impl LazyTable {
    pub const fn new(build: fn() -> Result<LalrTable, GrammarError>) -> LazyTable {
        LazyTable {
            cell: OnceCell::new(),
            build,
        }
    }

    /// Builds the table if this is the first call. A failed build is not
    /// cached: the next call tries again.
    pub fn get(&self) -> Result<&LalrTable, GrammarError> {
        self.cell.get_or_try_init(|| {
            log::debug!("building shared table");
            (self.build)()
        })
    }

    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }
}
