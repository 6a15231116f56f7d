//! Shift-reduce driver over a [`LalrTable`].
//!
//! Tokens are pushed one at a time with [`Parser::process_token`]. Syntax
//! tree nodes are built by a user supplied [`ParserContext`], the parser only
//! keeps them on its stack until they are handed back in a reduction or, for
//! the root, to [`ParserContext::accept`].
//!
//! Every token is first run against a scratch branch of the stack that builds
//! no nodes. Only when that reaches a shift or an accept is the real stack
//! touched, so a token that fails leaves the stack as it was and the nodes
//! popped by a reduction can be moved, never copied, into their parent.

mod stack;

use std::mem;
use std::rc::Rc;

use crate::error::{GrammarError, ParseError};
use crate::lalr::item::ProductionRule;
use crate::lalr::table::{LalrAction, LalrTable};
use crate::symbol::SymbolId;

pub use self::stack::{Frames, ParserState};

/// Everything known about a token the table has no action for.
#[derive(Debug)]
pub struct SyntaxErrorInfo<'a, N> {
    /// Terminals that would have been accepted at this point.
    pub expected: &'a [SymbolId],
    pub found: SymbolId,
    pub text: &'a str,
    pub position: usize,
    /// The nodes on the stack, bottom first.
    pub stack: &'a [&'a N],
}

impl<N> Clone for SyntaxErrorInfo<'_, N> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<N> Copy for SyntaxErrorInfo<'_, N> {}

/// Callbacks used by the [`Parser`] to build the syntax tree.
pub trait ParserContext {
    type Node;

    fn create_terminal(&mut self, symbol: SymbolId, text: &str, position: usize) -> Self::Node;
    fn create_nonterminal(
        &mut self,
        rule: &ProductionRule,
        children: Vec<Self::Node>,
    ) -> Self::Node;
    fn accept(&mut self, root: Self::Node);

    /// Called when a token cannot be parsed. Returning another symbol retries
    /// the same token as that symbol, returning `None` fails the parse.
    fn syntax_error(&mut self, info: SyntaxErrorInfo<'_, Self::Node>) -> Option<SymbolId> {
        let _ = info;
        None
    }

    /// Sees every token before the table does. `None` drops the token, such
    /// as whitespace or comments; otherwise the token is parsed as the
    /// returned symbol, which may differ from the one the lexer gave.
    fn filter_token(&mut self, symbol: SymbolId, text: &str) -> Option<SymbolId> {
        let _ = text;
        Some(symbol)
    }

    /// Name of a symbol, for diagnostics.
    fn resolve_symbol(&self, symbol: SymbolId) -> String {
        symbol.to_string()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParserConfig {
    /// Maximum number of frames on the stack, 0 for no limit.
    pub stack_limit: usize,
}

/// What happened to a token.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Progress {
    /// Dropped by [`ParserContext::filter_token`].
    Skipped,
    Shifted,
    Accepted,
}

#[derive(Debug, Clone, Default)]
pub struct ParserStats {
    pub tokens: usize,
    pub shifts: usize,
    pub reductions: usize,
    pub recoveries: usize,
}

pub struct Parser<'t, C: ParserContext> {
    table: &'t LalrTable,
    context: C,
    config: ParserConfig,
    top: Rc<ParserState<C::Node>>,
    finished: bool,
    stats: ParserStats,
}

impl<'t, C: ParserContext> Parser<'t, C> {
    /// Creates a parser at the start state of `table`. Tables with
    /// reduce/reduce conflicts are rejected.
    pub fn new(table: &'t LalrTable, context: C) -> Result<Parser<'t, C>, GrammarError> {
        table.check_deterministic()?;
        Ok(Parser {
            table,
            context,
            config: ParserConfig::default(),
            top: ParserState::root(table.start_state()),
            finished: false,
            stats: ParserStats::default(),
        })
    }

    pub fn with_config(mut self, config: ParserConfig) -> Parser<'t, C> {
        self.config = config;
        self
    }

    pub fn context(&self) -> &C {
        &self.context
    }
    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }
    pub fn into_context(self) -> C {
        self.context
    }
    pub fn stats(&self) -> &ParserStats {
        &self.stats
    }
    pub fn is_finished(&self) -> bool {
        self.finished
    }
    /// The state at the top of the stack.
    pub fn state(&self) -> usize {
        self.top.state()
    }
    pub fn top(&self) -> &ParserState<C::Node> {
        &self.top
    }

    /// The nodes on the stack, bottom first.
    pub fn stack_nodes(&self) -> Vec<&C::Node> {
        self.top.nodes()
    }

    /// Feeds the end of input marker.
    pub fn end_of_input(&mut self, position: usize) -> Result<Progress, ParseError> {
        self.process_token(SymbolId::EOF, "", position)
    }

    /// Runs every reduction `symbol` triggers, then shifts or accepts it.
    ///
    /// On an error the stack is left as it was before this token.
    pub fn process_token(
        &mut self,
        symbol: SymbolId,
        text: &str,
        position: usize,
    ) -> Result<Progress, ParseError> {
        if self.finished {
            return Err(ParseError::Finished);
        }
        let symbol = match self.context.filter_token(symbol, text) {
            Some(symbol) => symbol,
            None => {
                log::trace!("skip {}", self.context.resolve_symbol(symbol));
                return Ok(Progress::Skipped);
            }
        };
        self.stats.tokens += 1;

        let mut tried = vec![symbol];
        let mut current = symbol;
        loop {
            if let Some(peak) = self.simulate(current) {
                let limit = self.config.stack_limit;
                if limit > 0 && peak > limit {
                    self.finished = true;
                    return Err(ParseError::StackOverflow { limit });
                }
                return Ok(self.advance(current, text, position));
            }
            let expected = self.expected_symbols();
            log::debug!(
                "syntax error at {}: found {} in state {}",
                position,
                self.context.resolve_symbol(current),
                self.top.state()
            );
            let nodes = self.top.nodes();
            let info = SyntaxErrorInfo {
                expected: &expected,
                found: current,
                text,
                position,
                stack: &nodes,
            };
            match self.context.syntax_error(info) {
                Some(retry) if !tried.contains(&retry) => {
                    log::debug!("retrying as {}", self.context.resolve_symbol(retry));
                    self.stats.recoveries += 1;
                    tried.push(retry);
                    current = retry;
                }
                _ => {
                    self.finished = true;
                    return Err(ParseError::Syntax { expected, found: current });
                }
            }
        }
    }

    /// Drives the table for one symbol that [`Parser::simulate`] accepted.
    fn advance(&mut self, symbol: SymbolId, text: &str, position: usize) -> Progress {
        let table = self.table;
        let mut top = mem::replace(&mut self.top, ParserState::root(table.start_state()));
        let progress = loop {
            let state = top.state();
            match table.action(state, symbol) {
                Some(LalrAction::Shift(next)) => {
                    log::trace!(
                        "state {}: shift {} to {}",
                        state,
                        self.context.resolve_symbol(symbol),
                        next
                    );
                    let node = self.context.create_terminal(symbol, text, position);
                    top = ParserState::push(top, Some(node), *next);
                    self.stats.shifts += 1;
                    break Progress::Shifted;
                }
                Some(LalrAction::Reduce(rule)) => {
                    top = self.reduce(top, *rule);
                }
                Some(LalrAction::Accept) => {
                    log::trace!("state {}: accept", state);
                    let (root, bottom) = ParserState::pop(top);
                    let root = match root {
                        Some(root) => root,
                        None => panic!("accept in state {} with an empty stack", state),
                    };
                    assert!(
                        bottom.is_root(),
                        "accept in state {} leaves {} frames on the stack",
                        state,
                        bottom.depth()
                    );
                    top = bottom;
                    self.finished = true;
                    self.context.accept(root);
                    break Progress::Accepted;
                }
                other => unreachable!("no move on {} in state {}: {:?}", symbol, state, other),
            }
        };
        self.top = top;
        progress
    }

    fn reduce(
        &mut self,
        mut top: Rc<ParserState<C::Node>>,
        index: usize,
    ) -> Rc<ParserState<C::Node>> {
        let table = self.table;
        let rule = match table.production(index) {
            Some(rule) => rule,
            None => panic!("reduction by unknown rule {}", index),
        };
        let from = top.state();
        let mut children = Vec::with_capacity(rule.len());
        for _ in 0..rule.len() {
            let (node, below) = ParserState::pop(top);
            match node {
                Some(node) => children.push(node),
                None => panic!("stack underflow reducing rule {}", rule),
            }
            top = below;
        }
        children.reverse();
        let next = self.goto(top.state(), rule);
        log::trace!("state {}: reduce rule {}, goto {}", from, rule.index(), next);
        let node = self.context.create_nonterminal(rule, children);
        self.stats.reductions += 1;
        ParserState::push(top, Some(node), next)
    }

    fn goto(&self, state: usize, rule: &ProductionRule) -> usize {
        match self.table.action(state, rule.lhs()) {
            Some(LalrAction::Goto(next)) => *next,
            _ => panic!(
                "no goto from state {} on {} after reducing rule {}",
                state,
                rule.lhs(),
                rule
            ),
        }
    }

    /// Terminals that can be shifted, or accepted, from the current stack.
    pub fn expected_symbols(&self) -> Vec<SymbolId> {
        let state = self.top.state();
        self.table
            .actions_for(state)
            .filter(|(_, a)| !matches!(a, LalrAction::Goto(_)))
            .map(|(s, _)| s)
            .filter(|&s| self.simulate(s).is_some())
            .collect()
    }

    /// Follows the reductions `symbol` triggers on a scratch branch of the
    /// stack, without building nodes. Returns the deepest the stack gets
    /// before `symbol` is shifted or accepted, `None` if it never is.
    fn simulate(&self, symbol: SymbolId) -> Option<usize> {
        let mut top = Rc::clone(&self.top);
        let mut peak = top.depth();
        loop {
            let rule = match self.table.action(top.state(), symbol) {
                Some(LalrAction::Shift(_)) => return Some(peak.max(top.depth() + 1)),
                Some(LalrAction::Accept) => return Some(peak),
                Some(LalrAction::Reduce(r)) => match self.table.production(*r) {
                    Some(rule) => rule,
                    None => panic!("reduction by unknown rule {}", r),
                },
                _ => return None,
            };
            for _ in 0..rule.len() {
                top = match top.parent_link() {
                    Some(below) => Rc::clone(below),
                    None => panic!("stack underflow reducing rule {}", rule),
                };
            }
            let next = self.goto(top.state(), rule);
            top = ParserState::push(top, None, next);
            peak = peak.max(top.depth());
        }
    }
}
