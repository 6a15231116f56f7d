//! LALR(1) table construction.
//!
//! The pipeline runs in three steps. First the LR(0) automaton is discovered
//! breadth-first from `[Init ::= * Start]`, one state per distinct set of
//! kernel items. Then lookaheads are spread over the kernel items: a
//! throwaway closure of every kernel item, seeded with a placeholder
//! lookahead, tells which lookaheads are generated spontaneously and which
//! ones are just propagated from the kernel item, and the propagation edges
//! are followed until nothing grows. Last, every state is closed with its
//! final lookaheads and the action table is read from the items.

pub mod flat;
pub mod item;
pub mod meta;
pub mod table;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

use indexmap::{IndexMap, IndexSet};

use crate::error::{GrammarDefect, GrammarError, ReservedSymbol};
use crate::grammar::GrammarData;
use crate::symbol::{SymbolId, SymbolIdSequence, SymbolKind};

use self::item::{ItemKey, LrItem, LrItemSet, ProductionRule};
use self::meta::{SymbolMetaTable, SymbolSet};
use self::table::{LalrAction, LalrTable, StateKey};

/// Placeholder lookahead used while discovering propagation edges. Grammars
/// using this id are rejected.
pub(crate) const PROPAGATED: SymbolId = SymbolId::new(i32::MIN);

/// Index of the augmenting rule `Init ::= Start`.
const AUGMENTING_RULE: usize = 0;

#[derive(Debug, Clone, Default)]
pub struct GeneratorConfig {
    /// Log the full automaton at `info` level instead of `trace`.
    pub verbose: bool,
}

/// Builds the [`LalrTable`] of a validated grammar.
#[derive(Debug)]
pub struct TableGenerator {
    config: GeneratorConfig,
    init: SymbolId,
    start: SymbolId,
    symbols: BTreeMap<SymbolId, SymbolKind>,
    rules: Vec<ProductionRule>,
    rules_by_lhs: HashMap<SymbolId, Vec<usize>>,
    meta: SymbolMetaTable,
}

/// The LR(0) automaton: kernel item sets and their transitions.
struct Automaton {
    states: Vec<LrItemSet>,
    gotos: Vec<IndexMap<SymbolId, usize>>,
}

impl Automaton {
    fn goto(&self, state: usize, symbol: SymbolId) -> usize {
        match self.gotos[state].get(&symbol) {
            Some(&g) => g,
            None => panic!("state {} has no transition on {}", state, symbol),
        }
    }

    fn item(&self, state: usize, key: ItemKey) -> &LrItem {
        match self.states[state].get(key) {
            Some(item) => item,
            None => panic!("state {} has no item {:?}", state, key),
        }
    }
}

fn check_kind(
    defects: &mut Vec<GrammarDefect>,
    symbols: &BTreeMap<SymbolId, SymbolKind>,
    role: ReservedSymbol,
    symbol: SymbolId,
    expected: SymbolKind,
) {
    if symbols.get(&symbol) != Some(&expected) {
        defects.push(GrammarDefect::WrongKind { role, symbol, expected });
    }
}

impl TableGenerator {
    /// Validates the grammar and numbers its rules. Every problem found is
    /// reported in the returned error, not just the first one.
    pub fn new(grammar: &impl GrammarData) -> Result<TableGenerator, GrammarError> {
        let unknown = grammar.unknown();
        let init = grammar.init();
        let start = grammar.start();
        let mut symbols = grammar.symbols();
        symbols.entry(SymbolId::EOF).or_insert(SymbolKind::Terminal);

        let mut defects = Vec::new();
        let reserved = [
            (ReservedSymbol::Unknown, unknown, SymbolKind::Terminal),
            (ReservedSymbol::Eof, SymbolId::EOF, SymbolKind::Terminal),
            (ReservedSymbol::Init, init, SymbolKind::Nonterminal),
            (ReservedSymbol::Start, start, SymbolKind::Nonterminal),
        ];
        for (role, symbol, expected) in reserved {
            check_kind(&mut defects, &symbols, role, symbol, expected);
        }
        if symbols.contains_key(&PROPAGATED) {
            defects.push(GrammarDefect::ReservedId { symbol: PROPAGATED });
        }

        let mut unique = IndexSet::new();
        unique.insert((init, SymbolIdSequence::new([start])));
        let mut undefined = BTreeSet::new();
        let mut bad_lhs = Vec::new();
        for (lhs, rhs) in grammar.productions() {
            let defect = if lhs == init {
                Some(GrammarDefect::InitHasRules { symbol: lhs })
            } else {
                match symbols.get(&lhs) {
                    None => {
                        undefined.insert((lhs, lhs));
                        None
                    }
                    Some(SymbolKind::Terminal) => {
                        Some(GrammarDefect::TerminalHasRules { symbol: lhs })
                    }
                    Some(SymbolKind::Nonterminal) => None,
                }
            };
            if let Some(defect) = defect {
                if !bad_lhs.contains(&defect) {
                    bad_lhs.push(defect);
                }
                if lhs == init {
                    continue;
                }
            }
            for &s in rhs.iter() {
                if !symbols.contains_key(&s) {
                    undefined.insert((s, lhs));
                }
            }
            unique.insert((lhs, rhs));
        }
        defects.extend(bad_lhs);
        defects.extend(
            undefined
                .into_iter()
                .map(|(symbol, lhs)| GrammarDefect::UndefinedSymbol { symbol, lhs }),
        );

        let rules: Vec<ProductionRule> = unique
            .into_iter()
            .enumerate()
            .map(|(index, (lhs, rhs))| ProductionRule::new(index, lhs, rhs))
            .collect();
        let mut rules_by_lhs: HashMap<SymbolId, Vec<usize>> = HashMap::new();
        for rule in &rules {
            rules_by_lhs.entry(rule.lhs()).or_default().push(rule.index());
        }
        for (&s, &kind) in &symbols {
            if kind == SymbolKind::Nonterminal && s != init && !rules_by_lhs.contains_key(&s) {
                defects.push(GrammarDefect::NoRules { symbol: s });
            }
        }
        GrammarError::check(defects)?;

        let mut meta = SymbolMetaTable::new(&symbols);
        meta.compute_first_follows_and_nullable(init, SymbolId::EOF, &rules);
        log::debug!("grammar has {} symbols and {} rules", symbols.len(), rules.len());

        Ok(TableGenerator {
            config: GeneratorConfig::default(),
            init,
            start,
            symbols,
            rules,
            rules_by_lhs,
            meta,
        })
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> TableGenerator {
        self.config = config;
        self
    }

    /// The numbered rules, the augmenting rule first.
    pub fn rules(&self) -> &[ProductionRule] {
        &self.rules
    }

    pub fn meta(&self) -> &SymbolMetaTable {
        &self.meta
    }

    fn is_nonterminal(&self, symbol: SymbolId) -> bool {
        self.symbols.get(&symbol) == Some(&SymbolKind::Nonterminal)
    }

    fn rules_of(&self, lhs: SymbolId) -> &[usize] {
        self.rules_by_lhs.get(&lhs).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn compute_table(&self) -> LalrTable {
        let automaton = self.find_states();
        log::debug!("LR(0) automaton has {} states", automaton.states.len());
        self.find_lookaheads(&automaton);
        let mut states = automaton.states;
        for set in &mut states {
            self.closure(set);
        }
        let automaton = Automaton {
            states,
            gotos: automaton.gotos,
        };
        let actions = self.find_actions(&automaton);

        let level = if self.config.verbose { log::Level::Info } else { log::Level::Trace };
        if log::log_enabled!(level) {
            let report = self.report_output(&automaton, &actions);
            log::log!(level, "LALR(1) automaton for start symbol {}:\n{}", self.start, report);
        }
        LalrTable::new(0, actions, self.rules.clone())
    }

    /// Non-terminals whose rules are part of the LR(0) closure of `set`, in
    /// discovery order.
    fn closure_nonterminals(&self, set: &LrItemSet) -> IndexSet<SymbolId> {
        let mut nts: IndexSet<SymbolId> = set
            .kernels()
            .filter_map(|item| item.marked_symbol(&self.rules))
            .filter(|&s| self.is_nonterminal(s))
            .collect();
        let mut i = 0;
        while let Some(&nt) = nts.get_index(i) {
            for &r in self.rules_of(nt) {
                if let Some(&first) = self.rules[r].rhs().first() {
                    if self.is_nonterminal(first) {
                        nts.insert(first);
                    }
                }
            }
            i += 1;
        }
        nts
    }

    /// Kernel items of every transition out of `set`, grouped by symbol.
    fn goto_kernels(&self, set: &LrItemSet) -> IndexMap<SymbolId, Vec<ItemKey>> {
        let mut groups: IndexMap<SymbolId, Vec<ItemKey>> = IndexMap::new();
        for item in set.kernels() {
            if let Some(x) = item.marked_symbol(&self.rules) {
                groups.entry(x).or_default().push((item.rule(), item.marker() + 1));
            }
        }
        for &nt in set.closure_nonterminals().into_iter().flatten() {
            for &r in self.rules_of(nt) {
                if let Some(&x) = self.rules[r].rhs().first() {
                    groups.entry(x).or_default().push((r, 1));
                }
            }
        }
        groups
    }

    fn find_states(&self) -> Automaton {
        let mut states = vec![LrItemSet::new([LrItem::new(AUGMENTING_RULE, 0, true)])];
        let mut known: HashMap<Vec<ItemKey>, usize> = HashMap::new();
        known.insert(states[0].kernel_key(), 0);
        let mut gotos = Vec::new();

        let mut i = 0;
        while i < states.len() {
            let nts = self.closure_nonterminals(&states[i]);
            states[i].set_closure_nonterminals(nts);
            states[i].set_index(i);
            let groups = self.goto_kernels(&states[i]);

            let mut transitions = IndexMap::new();
            for (x, keys) in groups {
                let set = LrItemSet::new(keys.into_iter().map(|(r, m)| LrItem::new(r, m, true)));
                let key = set.kernel_key();
                let target = match known.get(&key) {
                    Some(&t) => t,
                    None => {
                        let t = states.len();
                        known.insert(key, t);
                        states.push(set);
                        t
                    }
                };
                transitions.insert(x, target);
            }
            gotos.push(transitions);
            i += 1;
        }
        Automaton { states, gotos }
    }

    /// Fills the lookaheads of every kernel item of the automaton.
    fn find_lookaheads(&self, automaton: &Automaton) {
        automaton.item(0, (AUGMENTING_RULE, 0)).add_lookaheads(&[SymbolId::EOF]);

        let mut links = Vec::new();
        for (s, state) in automaton.states.iter().enumerate() {
            for kernel in state.kernels() {
                let mut probe = LrItemSet::new([LrItem::with_lookaheads(
                    kernel.rule(),
                    kernel.marker(),
                    true,
                    [PROPAGATED].into_iter().collect(),
                )]);
                self.closure(&mut probe);
                for item in &probe {
                    let x = match item.marked_symbol(&self.rules) {
                        Some(x) => x,
                        None => continue,
                    };
                    let g = automaton.goto(s, x);
                    let target = (item.rule(), item.marker() + 1);
                    let la = item.lookaheads();
                    if la.contains(&PROPAGATED) {
                        links.push(((s, kernel.key()), (g, target)));
                    }
                    automaton
                        .item(g, target)
                        .add_lookaheads(la.iter().filter(|&&l| l != PROPAGATED));
                }
            }
        }
        log::debug!("{} lookahead propagation links", links.len());

        let mut passes = 0;
        loop {
            passes += 1;
            let mut progress = false;
            for &((from, from_key), (to, to_key)) in &links {
                let la: SymbolSet = automaton.item(from, from_key).lookaheads().clone();
                progress |= automaton.item(to, to_key).add_lookaheads(&la);
            }
            if !progress {
                break;
            }
        }
        log::debug!("lookaheads stable after {} passes", passes);
    }

    /// Expands `set` with every item reachable through the non-terminal after
    /// a marker, merging the lookaheads of repeated items.
    fn closure(&self, set: &mut LrItemSet) {
        loop {
            let mut added = Vec::new();
            for item in set.iter() {
                let b = match item.marked_symbol(&self.rules) {
                    Some(b) if self.is_nonterminal(b) => b,
                    _ => continue,
                };
                let beta = &self.rules[item.rule()].rhs()[item.marker() + 1..];
                let mut la = self.meta.first_of_all(beta.iter().copied());
                if beta.iter().all(|&s| self.meta.is_nullable(s)) {
                    la.extend(item.lookaheads().iter().copied());
                }
                if la.is_empty() {
                    continue;
                }
                for &r in self.rules_of(b) {
                    added.push(LrItem::with_lookaheads(r, 0, false, la.clone()));
                }
            }
            if !set.merge_with(added) {
                break;
            }
        }
        set.set_closed();
    }

    fn find_actions(&self, automaton: &Automaton) -> BTreeMap<StateKey, LalrAction> {
        let mut actions = BTreeMap::new();
        let mut conflicts = 0;
        for (s, set) in automaton.states.iter().enumerate() {
            debug_assert!(set.is_closed(), "state {} was never closed", s);
            for (&x, &kind) in &self.symbols {
                let key = StateKey::new(s, x);
                let goto = automaton.gotos[s].get(&x).copied();
                if kind == SymbolKind::Nonterminal {
                    if let Some(g) = goto {
                        actions.insert(key, LalrAction::Goto(g));
                    }
                    continue;
                }
                let mut action = goto.map(LalrAction::Shift);
                for item in set.iter() {
                    if !item.is_complete(&self.rules) || !item.lookaheads().contains(&x) {
                        continue;
                    }
                    let rule = item.rule();
                    if rule == AUGMENTING_RULE {
                        if x == SymbolId::EOF {
                            action = Some(LalrAction::Accept);
                        }
                        continue;
                    }
                    action = match action {
                        None => Some(LalrAction::Reduce(rule)),
                        Some(LalrAction::Shift(g)) => {
                            log::warn!(
                                "shift/reduce conflict in state {} on {}: \
                                 shifting to state {} instead of reducing rule {}",
                                s,
                                x,
                                g,
                                self.rules[rule]
                            );
                            Some(LalrAction::Shift(g))
                        }
                        Some(LalrAction::Accept) => {
                            log::warn!(
                                "accept/reduce conflict in state {}: rule {} is never reduced",
                                s,
                                self.rules[rule]
                            );
                            Some(LalrAction::Accept)
                        }
                        Some(prev) => {
                            let merged = prev.add_reduction(rule);
                            if merged.is_ambiguous() {
                                conflicts += 1;
                            }
                            Some(merged)
                        }
                    };
                }
                if let Some(action) = action {
                    actions.insert(key, action);
                }
            }
        }
        if conflicts > 0 {
            log::warn!("{} reduce/reduce conflicts", conflicts);
        }
        actions
    }

    fn report_output(
        &self,
        automaton: &Automaton,
        actions: &BTreeMap<StateKey, LalrAction>,
    ) -> String {
        let name = |s: SymbolId| {
            if s == self.init {
                String::from("(init)")
            } else {
                s.to_string()
            }
        };
        let mut report = String::new();
        for (s, set) in automaton.states.iter().enumerate() {
            writeln!(report, "State {}:", s).unwrap();
            for item in set {
                if item.is_complete(&self.rules) {
                    write!(report, "    {:>5} ", format!("({})", item.rule())).unwrap();
                } else {
                    report.push_str("          ");
                }
                item.write_to(&mut report, &self.rules, &name);
                writeln!(report).unwrap();
            }
            writeln!(report).unwrap();
            let lo = StateKey::new(s, SymbolId::new(i32::MIN));
            for (k, a) in actions.range(lo..).take_while(|(k, _)| k.state == s) {
                writeln!(report, "{:>30} {}", name(k.symbol), a).unwrap();
            }
            writeln!(report).unwrap();
        }
        report
    }
}
