use std::collections::{BTreeMap, BTreeSet};

use crate::lalr::item::ProductionRule;
use crate::symbol::{SymbolId, SymbolKind};

pub type SymbolSet = BTreeSet<SymbolId>;

/// FIRST, FOLLOW and nullable information of one symbol.
#[derive(Debug, Clone)]
pub struct SymbolMeta {
    pub kind: SymbolKind,
    pub first: SymbolSet,
    pub follow: SymbolSet,
    pub nullable: bool,
}

impl SymbolMeta {
    fn new(kind: SymbolKind) -> SymbolMeta {
        SymbolMeta {
            kind,
            first: SymbolSet::new(),
            follow: SymbolSet::new(),
            nullable: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SymbolMetaTable {
    metas: BTreeMap<SymbolId, SymbolMeta>,
}

fn union_into(dst: &mut SymbolSet, src: &SymbolSet) -> bool {
    let n = dst.len();
    dst.extend(src.iter().copied());
    dst.len() > n
}

impl SymbolMetaTable {
    pub fn new(symbols: &BTreeMap<SymbolId, SymbolKind>) -> SymbolMetaTable {
        let mut metas: BTreeMap<_, _> =
            symbols.iter().map(|(&s, &k)| (s, SymbolMeta::new(k))).collect();
        for (&s, meta) in metas.iter_mut() {
            if meta.kind == SymbolKind::Terminal {
                meta.first.insert(s);
            }
        }
        SymbolMetaTable { metas }
    }

    pub fn get(&self, symbol: SymbolId) -> Option<&SymbolMeta> {
        self.metas.get(&symbol)
    }

    fn meta(&self, symbol: SymbolId) -> &SymbolMeta {
        match self.metas.get(&symbol) {
            Some(m) => m,
            None => panic!("symbol {} is not part of the grammar", symbol),
        }
    }

    fn meta_mut(&mut self, symbol: SymbolId) -> &mut SymbolMeta {
        match self.metas.get_mut(&symbol) {
            Some(m) => m,
            None => panic!("symbol {} is not part of the grammar", symbol),
        }
    }

    pub fn is_nullable(&self, symbol: SymbolId) -> bool {
        self.meta(symbol).nullable
    }

    pub fn first(&self, symbol: SymbolId) -> &SymbolSet {
        &self.meta(symbol).first
    }

    pub fn follow(&self, symbol: SymbolId) -> &SymbolSet {
        &self.meta(symbol).follow
    }

    /// All the terminals that can begin a string derived from `symbols`.
    pub fn first_of_all(&self, symbols: impl IntoIterator<Item = SymbolId>) -> SymbolSet {
        let mut res = SymbolSet::new();
        for s in symbols {
            let meta = self.meta(s);
            res.extend(meta.first.iter().copied());
            if !meta.nullable {
                break;
            }
        }
        res
    }

    /// Computes the FIRST, FOLLOW and nullable sets, iterating over all the
    /// rules until nothing changes. Returns whether any set grew.
    pub fn compute_first_follows_and_nullable(
        &mut self,
        start: SymbolId,
        eof: SymbolId,
        rules: &[ProductionRule],
    ) -> bool {
        let mut grew = self.meta_mut(start).follow.insert(eof);
        loop {
            let mut progress = false;
            for rule in rules {
                let lhs = rule.lhs();
                let rhs = rule.rhs();
                if !self.is_nullable(lhs) && rhs.iter().all(|&s| self.is_nullable(s)) {
                    self.meta_mut(lhs).nullable = true;
                    progress = true;
                }
                for (cur, &sym) in rhs.iter().enumerate() {
                    let next = cur + 1;
                    if rhs[..cur].iter().all(|&s| self.is_nullable(s)) {
                        let first = self.first(sym).clone();
                        progress |= union_into(&mut self.meta_mut(lhs).first, &first);
                    }
                    if rhs[next..].iter().all(|&s| self.is_nullable(s)) {
                        let follow = self.follow(lhs).clone();
                        progress |= union_into(&mut self.meta_mut(sym).follow, &follow);
                    }
                    for i in next..rhs.len() {
                        if !rhs[next..i].iter().all(|&s| self.is_nullable(s)) {
                            break;
                        }
                        let first = self.first(rhs[i]).clone();
                        progress |= union_into(&mut self.meta_mut(sym).follow, &first);
                    }
                }
            }
            if !progress {
                break;
            }
            grew = true;
        }
        grew
    }
}
