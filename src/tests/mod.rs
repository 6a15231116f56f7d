use super::*;


use logos::Logos;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const INIT: SymbolId = SymbolId::new(10);
pub const EXPR: SymbolId = SymbolId::new(11);
pub const TERM: SymbolId = SymbolId::new(12);
pub const FACTOR: SymbolId = SymbolId::new(13);
pub const PLUS: SymbolId = SymbolId::new(14);
pub const MINUS: SymbolId = SymbolId::new(15);
pub const STAR: SymbolId = SymbolId::new(16);
pub const SLASH: SymbolId = SymbolId::new(17);
pub const LPAREN: SymbolId = SymbolId::new(18);
pub const RPAREN: SymbolId = SymbolId::new(19);
pub const NUMBER: SymbolId = SymbolId::new(20);
pub const WHITESPACE: SymbolId = SymbolId::new(21);

pub fn expr_grammar() -> GrammarBuilder {
    let mut g = GrammarBuilder::new(SymbolId::UNKNOWN, INIT, EXPR);
    g.add(EXPR, [EXPR, PLUS, TERM])
        .add(EXPR, [EXPR, MINUS, TERM])
        .add(EXPR, [TERM])
        .add(TERM, [TERM, STAR, FACTOR])
        .add(TERM, [TERM, SLASH, FACTOR])
        .add(TERM, [FACTOR])
        .add(FACTOR, [NUMBER])
        .add(FACTOR, [LPAREN, EXPR, RPAREN]);
    g
}

pub fn expr_table() -> LalrTable {
    init_logger();
    let generator = TableGenerator::new(&expr_grammar()).unwrap();
    generator.compute_table()
}

#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum ExprToken {
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[regex("[0-9]+")]
    Number,
    #[regex(r"[ \t\r\n]+")]
    Whitespace,
}

impl ExprToken {
    fn symbol(self) -> SymbolId {
        match self {
            ExprToken::Plus => PLUS,
            ExprToken::Minus => MINUS,
            ExprToken::Star => STAR,
            ExprToken::Slash => SLASH,
            ExprToken::LParen => LPAREN,
            ExprToken::RParen => RPAREN,
            ExprToken::Number => NUMBER,
            ExprToken::Whitespace => WHITESPACE,
        }
    }
}

/// Splits `input` into `(symbol, text, position)` tuples. Characters the
/// lexer does not know become the unknown symbol.
pub fn tokenize(input: &str) -> Vec<(SymbolId, &str, usize)> {
    let mut lex = ExprToken::lexer(input);
    let mut tokens = Vec::new();
    while let Some(tok) = lex.next() {
        let symbol = match tok {
            Ok(tok) => tok.symbol(),
            Err(()) => SymbolId::UNKNOWN,
        };
        tokens.push((symbol, lex.slice(), lex.span().start));
    }
    tokens
}

/// A syntax tree node: its value and its prefix notation.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub value: i64,
    pub prefix: String,
}

/// Evaluates while building, keeps the root and every syntax error seen.
#[derive(Default)]
pub struct Calc {
    pub root: Option<Expr>,
    pub errors: Vec<(Vec<SymbolId>, SymbolId, usize)>,
    /// Token texts parsed as another symbol than the lexer's.
    pub aliases: Vec<(&'static str, SymbolId)>,
}

impl ParserContext for Calc {
    type Node = Expr;

    fn create_terminal(&mut self, _symbol: SymbolId, text: &str, _position: usize) -> Expr {
        Expr {
            value: text.parse().unwrap_or(0),
            prefix: text.to_string(),
        }
    }

    fn create_nonterminal(&mut self, rule: &ProductionRule, mut children: Vec<Expr>) -> Expr {
        match rule.rhs().as_slice() {
            [_] => children.remove(0),
            [l, _, _] if *l == LPAREN => children.remove(1),
            [_, op, _] => {
                let (a, b) = (&children[0], &children[2]);
                let value = match *op {
                    PLUS => a.value + b.value,
                    MINUS => a.value - b.value,
                    STAR => a.value * b.value,
                    SLASH => a.value / b.value,
                    _ => unreachable!(),
                };
                Expr {
                    value,
                    prefix: format!("{} {} {}", children[1].prefix, a.prefix, b.prefix),
                }
            }
            _ => unreachable!("unexpected rule {}", rule),
        }
    }

    fn accept(&mut self, root: Expr) {
        self.root = Some(root);
    }

    fn syntax_error(&mut self, info: SyntaxErrorInfo<'_, Expr>) -> Option<SymbolId> {
        self.errors.push((info.expected.to_vec(), info.found, info.position));
        None
    }

    fn filter_token(&mut self, symbol: SymbolId, text: &str) -> Option<SymbolId> {
        if symbol == WHITESPACE {
            return None;
        }
        match self.aliases.iter().find(|(alias, _)| *alias == text) {
            Some(&(_, aliased)) => Some(aliased),
            None => Some(symbol),
        }
    }

    fn resolve_symbol(&self, symbol: SymbolId) -> String {
        let name = match symbol {
            PLUS => "'+'",
            MINUS => "'-'",
            STAR => "'*'",
            SLASH => "'/'",
            LPAREN => "'('",
            RPAREN => "')'",
            NUMBER => "number",
            _ => return symbol.to_string(),
        };
        name.to_string()
    }
}

/// Parses `input` with `table`, returning the parser after the last token
/// that was processed and the result of that token.
pub fn run<'t>(
    table: &'t LalrTable,
    input: &str,
) -> (Parser<'t, Calc>, Result<Progress, ParseError>) {
    run_with(table, Calc::default(), input)
}

pub fn run_with<'t>(
    table: &'t LalrTable,
    calc: Calc,
    input: &str,
) -> (Parser<'t, Calc>, Result<Progress, ParseError>) {
    let mut p = Parser::new(table, calc).unwrap();
    for (symbol, text, position) in tokenize(input) {
        if let Err(e) = p.process_token(symbol, text, position) {
            return (p, Err(e));
        }
    }
    let res = p.end_of_input(input.len());
    (p, res)
}
