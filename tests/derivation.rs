//! Every sentence derived from a grammar must be accepted, and the terminals
//! of the resulting tree must be the input, in order.

use lalrkit::*;
use proptest::prelude::*;

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
enum Tree {
    Leaf(SymbolId, String),
    Node(usize, Vec<Tree>),
}

impl Tree {
    fn collect_yield(&self, out: &mut Vec<String>) {
        match self {
            Tree::Leaf(_, text) => out.push(text.clone()),
            Tree::Node(_, children) => children.iter().for_each(|c| c.collect_yield(out)),
        }
    }
}

#[derive(Default)]
struct TreeBuilder {
    root: Option<Tree>,
}

impl ParserContext for TreeBuilder {
    type Node = Tree;
    fn create_terminal(&mut self, symbol: SymbolId, text: &str, _position: usize) -> Tree {
        Tree::Leaf(symbol, text.to_string())
    }
    fn create_nonterminal(&mut self, rule: &ProductionRule, children: Vec<Tree>) -> Tree {
        assert_eq!(rule.len(), children.len());
        Tree::Node(rule.index(), children)
    }
    fn accept(&mut self, root: Tree) {
        self.root = Some(root);
    }
}

fn parse(table: &LalrTable, tokens: &[(SymbolId, String)]) -> Result<Tree, ParseError> {
    let mut p = Parser::new(table, TreeBuilder::default()).expect("deterministic table");
    for (i, (symbol, text)) in tokens.iter().enumerate() {
        p.process_token(*symbol, text, i)?;
    }
    assert_eq!(p.end_of_input(tokens.len())?, Progress::Accepted);
    Ok(p.into_context().root.expect("accepted without a root"))
}

mod arith {
    use super::*;

    pub const INIT: SymbolId = SymbolId::new(10);
    pub const EXPR: SymbolId = SymbolId::new(11);
    pub const TERM: SymbolId = SymbolId::new(12);
    pub const FACTOR: SymbolId = SymbolId::new(13);
    pub const PLUS: SymbolId = SymbolId::new(14);
    pub const MINUS: SymbolId = SymbolId::new(15);
    pub const STAR: SymbolId = SymbolId::new(16);
    pub const LPAREN: SymbolId = SymbolId::new(18);
    pub const RPAREN: SymbolId = SymbolId::new(19);
    pub const NUMBER: SymbolId = SymbolId::new(20);

    pub fn table() -> LalrTable {
        let mut g = GrammarBuilder::new(SymbolId::UNKNOWN, INIT, EXPR);
        g.add(EXPR, [EXPR, PLUS, TERM])
            .add(EXPR, [EXPR, MINUS, TERM])
            .add(EXPR, [TERM])
            .add(TERM, [TERM, STAR, FACTOR])
            .add(TERM, [FACTOR])
            .add(FACTOR, [NUMBER])
            .add(FACTOR, [LPAREN, EXPR, RPAREN]);
        TableGenerator::new(&g).unwrap().compute_table()
    }

    #[derive(Debug, Clone)]
    pub enum Ast {
        Num(i64),
        Bin(char, Box<Ast>, Box<Ast>),
        Paren(Box<Ast>),
    }

    fn prec(ast: &Ast) -> u8 {
        match ast {
            Ast::Bin('*', ..) => 2,
            Ast::Bin(..) => 1,
            _ => 3,
        }
    }

    impl Ast {
        pub fn eval(&self) -> i64 {
            match self {
                Ast::Num(n) => *n,
                Ast::Paren(a) => a.eval(),
                Ast::Bin(op, a, b) => {
                    let (a, b) = (a.eval(), b.eval());
                    match op {
                        '+' => a.wrapping_add(b),
                        '-' => a.wrapping_sub(b),
                        _ => a.wrapping_mul(b),
                    }
                }
            }
        }

        /// Tokens of this tree, with the parentheses the grammar needs to
        /// keep its shape.
        pub fn render(&self, min_prec: u8, out: &mut Vec<(SymbolId, String)>) {
            let p = prec(self);
            if p < min_prec {
                out.push((LPAREN, "(".to_string()));
                self.render(0, out);
                out.push((RPAREN, ")".to_string()));
                return;
            }
            match self {
                Ast::Num(n) => out.push((NUMBER, n.to_string())),
                Ast::Paren(a) => {
                    out.push((LPAREN, "(".to_string()));
                    a.render(0, out);
                    out.push((RPAREN, ")".to_string()));
                }
                Ast::Bin(op, a, b) => {
                    a.render(p, out);
                    let symbol = match op {
                        '+' => PLUS,
                        '-' => MINUS,
                        _ => STAR,
                    };
                    out.push((symbol, op.to_string()));
                    b.render(p + 1, out);
                }
            }
        }
    }

    pub fn eval(tree: &Tree) -> i64 {
        match tree {
            Tree::Leaf(_, text) => text.parse().unwrap(),
            Tree::Node(_, children) => match children.as_slice() {
                [a] => eval(a),
                [Tree::Leaf(LPAREN, _), a, _] => eval(a),
                [a, Tree::Leaf(op, _), b] => {
                    let (a, b) = (eval(a), eval(b));
                    match *op {
                        PLUS => a.wrapping_add(b),
                        MINUS => a.wrapping_sub(b),
                        _ => a.wrapping_mul(b),
                    }
                }
                other => panic!("unexpected node {:?}", other),
            },
        }
    }

    pub fn ast() -> impl Strategy<Value = Ast> {
        let leaf = (0i64..100).prop_map(Ast::Num);
        leaf.prop_recursive(6, 48, 2, |inner| {
            prop_oneof![
                (prop_oneof![Just('+'), Just('-'), Just('*')], inner.clone(), inner.clone())
                    .prop_map(|(op, a, b)| Ast::Bin(op, Box::new(a), Box::new(b))),
                inner.prop_map(|a| Ast::Paren(Box::new(a))),
            ]
        })
    }
}

proptest! {
    #[test]
    fn arithmetic_round_trip(ast in arith::ast()) {
        let table = arith::table();
        let mut tokens = Vec::new();
        ast.render(0, &mut tokens);
        let tree = parse(&table, &tokens).unwrap();

        let mut leaves = Vec::new();
        tree.collect_yield(&mut leaves);
        let texts: Vec<_> = tokens.iter().map(|(_, t)| t.clone()).collect();
        prop_assert_eq!(leaves, texts);
        prop_assert_eq!(arith::eval(&tree), ast.eval());
    }
}

mod lists {
    use super::*;

    pub const INIT: SymbolId = SymbolId::new(0);
    pub const VALUE: SymbolId = SymbolId::new(1);
    pub const ITEMS: SymbolId = SymbolId::new(2);
    pub const LIST: SymbolId = SymbolId::new(3);
    pub const NUM: SymbolId = SymbolId::new(4);
    pub const OPEN: SymbolId = SymbolId::new(5);
    pub const CLOSE: SymbolId = SymbolId::new(6);
    pub const COMMA: SymbolId = SymbolId::new(7);

    // value ::= NUM | '[' items ']' ; items ::= | list ; list ::= value | list ',' value
    pub fn grammar() -> GrammarBuilder {
        let mut g = GrammarBuilder::new(SymbolId::UNKNOWN, INIT, VALUE);
        g.add(VALUE, [NUM])
            .add(VALUE, [OPEN, ITEMS, CLOSE])
            .add(ITEMS, [])
            .add(ITEMS, [LIST])
            .add(LIST, [VALUE])
            .add(LIST, [LIST, COMMA, VALUE]);
        g
    }
}

/// Derives a sentence from `lhs`, picking rules with `choices`. Past
/// `depth` the rule closest to a terminal string is used.
struct Deriver {
    rules: HashMap<SymbolId, Vec<Vec<SymbolId>>>,
    shortest: HashMap<SymbolId, usize>,
}

impl Deriver {
    fn new(grammar: &GrammarBuilder) -> Deriver {
        let mut rules: HashMap<SymbolId, Vec<Vec<SymbolId>>> = HashMap::new();
        for (lhs, rhs) in grammar.productions() {
            rules.entry(lhs).or_default().push(rhs.to_vec());
        }
        // Height of the smallest derivation tree of each non-terminal.
        let mut height: HashMap<SymbolId, usize> = HashMap::new();
        let mut shortest = HashMap::new();
        loop {
            let mut progress = false;
            for (lhs, alts) in &rules {
                for (i, rhs) in alts.iter().enumerate() {
                    let h = rhs.iter().try_fold(0, |acc, s| {
                        if rules.contains_key(s) {
                            height.get(s).map(|h| acc.max(h + 1))
                        } else {
                            Some(acc)
                        }
                    });
                    if let Some(h) = h {
                        if height.get(lhs).map_or(true, |&old| h < old) {
                            height.insert(*lhs, h);
                            shortest.insert(*lhs, i);
                            progress = true;
                        }
                    }
                }
            }
            if !progress {
                break;
            }
        }
        Deriver { rules, shortest }
    }

    fn derive(
        &self,
        symbol: SymbolId,
        depth: usize,
        choices: &mut impl Iterator<Item = usize>,
        out: &mut Vec<SymbolId>,
    ) {
        let alts = match self.rules.get(&symbol) {
            Some(alts) => alts,
            None => {
                out.push(symbol);
                return;
            }
        };
        let pick = if depth == 0 {
            self.shortest[&symbol]
        } else {
            choices.next().unwrap_or(0) % alts.len()
        };
        for &s in &alts[pick] {
            self.derive(s, depth.saturating_sub(1), choices, out);
        }
    }
}

proptest! {
    #[test]
    fn nested_lists_round_trip(
        choices in prop::collection::vec(0usize..8, 0..64),
        depth in 0usize..8,
    ) {
        let grammar = lists::grammar();
        let table = TableGenerator::new(&grammar).unwrap().compute_table();
        let deriver = Deriver::new(&grammar);

        let mut sentence = Vec::new();
        deriver.derive(lists::VALUE, depth, &mut choices.into_iter(), &mut sentence);
        let tokens: Vec<_> = sentence
            .iter()
            .enumerate()
            .map(|(i, s)| (*s, format!("{}#{}", s, i)))
            .collect();

        let tree = parse(&table, &tokens).unwrap();
        let mut leaves = Vec::new();
        tree.collect_yield(&mut leaves);
        let texts: Vec<_> = tokens.iter().map(|(_, t)| t.clone()).collect();
        prop_assert_eq!(leaves, texts);
    }
}

#[test]
fn shortest_derivations() {
    let deriver = Deriver::new(&lists::grammar());
    let mut sentence = Vec::new();
    deriver.derive(lists::VALUE, 0, &mut std::iter::empty(), &mut sentence);
    assert_eq!(sentence, vec![lists::NUM]);
}
