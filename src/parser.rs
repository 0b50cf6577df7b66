// ABOUTME: Backtracking parser combinators, the Scheme grammar, and tree-to-value lowering

use crate::buffer::MarkedBuffer;
use crate::error::EvalError;
use crate::tokenizer::{Token, TokenType, Tokenizer};
use crate::value::Value;
use std::collections::HashMap;
use std::vec::IntoIter;

pub const PROGRAM: &str = "PROGRAM";
pub const EXPRESSION: &str = "EXPRESSION";
pub const QUOTED: &str = "QUOTED";
pub const LIST: &str = "LIST";
pub const DOTTED: &str = "DOTTED";
pub const ATOM: &str = "ATOM";

/// A node in the parse tree: either a terminal token, or a named subtree
/// produced by a nonterminal's production.
#[derive(Clone, Debug)]
pub enum Tree {
    Terminal(Token),
    Node(&'static str, Vec<Tree>),
}

/// Grammar combinator primitives, matching a token buffer.
pub enum Expr {
    Token(TokenType, bool),
    Nonterminal(&'static str),
    And(Vec<Expr>),
    Or(Vec<Expr>),
    Optional(Box<Expr>),
    ZeroOrMore(Box<Expr>),
    OneOrMore(Box<Expr>),
    End,
}

type TokenBuffer = MarkedBuffer<IntoIter<Token>>;

/// `Ok(None)` is a soft, backtrackable non-match; `Ok(Some(trees))` is a
/// match; `Err` is a hard syntax error raised in mandatory mode.
type MatchResult = Result<Option<Vec<Tree>>, EvalError>;

pub struct Parser {
    grammar: HashMap<&'static str, Expr>,
    start: &'static str,
}

impl Parser {
    pub fn new(grammar: HashMap<&'static str, Expr>, start: &'static str) -> Self {
        Parser { grammar, start }
    }

    /// The fixed Scheme surface grammar: `PROGRAM = EXPRESSION+ & End`.
    pub fn scheme() -> Self {
        let mut grammar = HashMap::new();
        grammar.insert(
            PROGRAM,
            Expr::And(vec![Expr::OneOrMore(Box::new(Expr::Nonterminal(EXPRESSION))), Expr::End]),
        );
        grammar.insert(
            EXPRESSION,
            Expr::Or(vec![
                Expr::Nonterminal(QUOTED),
                Expr::Nonterminal(ATOM),
                Expr::Nonterminal(LIST),
            ]),
        );
        grammar.insert(
            QUOTED,
            Expr::And(vec![
                Expr::Token(TokenType::Quote, true),
                Expr::Or(vec![Expr::Nonterminal(ATOM), Expr::Nonterminal(LIST)]),
            ]),
        );
        grammar.insert(
            LIST,
            Expr::And(vec![
                Expr::Token(TokenType::LParen, true),
                Expr::ZeroOrMore(Box::new(Expr::Nonterminal(EXPRESSION))),
                Expr::Optional(Box::new(Expr::Nonterminal(DOTTED))),
                Expr::Token(TokenType::RParen, true),
            ]),
        );
        grammar.insert(
            DOTTED,
            Expr::And(vec![Expr::Token(TokenType::Dot, true), Expr::Nonterminal(EXPRESSION)]),
        );
        grammar.insert(
            ATOM,
            Expr::Or(vec![
                Expr::Token(TokenType::Symbol, false),
                Expr::Token(TokenType::Integer, false),
                Expr::Token(TokenType::Float, false),
                Expr::Token(TokenType::Str, false),
            ]),
        );

        Parser::new(grammar, PROGRAM)
    }

    /// Drives the grammar from the root in mandatory mode; leftover tokens
    /// are a syntax error. An empty token stream is a valid empty program.
    pub fn parse(&self, tokens: Vec<Token>) -> Result<Tree, EvalError> {
        if tokens.is_empty() {
            return Ok(Tree::Node(PROGRAM, vec![]));
        }

        let mut buffer = MarkedBuffer::new(tokens.into_iter());
        match self.match_nonterminal(self.start, &mut buffer, true)? {
            Some(trees) => Ok(Tree::Node(self.start, trees)),
            None => unreachable!("mandatory top-level match never returns a soft non-match"),
        }
    }

    fn match_expr(&self, expr: &Expr, buffer: &mut TokenBuffer, mandatory: bool) -> MatchResult {
        match expr {
            Expr::Token(token_type, discard) => match_token(*token_type, *discard, buffer, mandatory),
            Expr::Nonterminal(name) => match self.match_nonterminal(name, buffer, mandatory)? {
                Some(trees) => Ok(Some(vec![Tree::Node(name, trees)])),
                None => Ok(None),
            },
            Expr::And(parts) => self.match_and(parts, buffer, mandatory),
            Expr::Or(alts) => self.match_or(alts, buffer, mandatory),
            Expr::Optional(inner) => match self.match_expr(inner, buffer, false)? {
                Some(trees) => Ok(Some(trees)),
                None => Ok(Some(vec![])),
            },
            Expr::ZeroOrMore(inner) => {
                let mut out = Vec::new();
                while let Some(mut trees) = self.match_expr(inner, buffer, false)? {
                    out.append(&mut trees);
                }
                Ok(Some(out))
            }
            Expr::OneOrMore(inner) => {
                let mut out = match self.match_expr(inner, buffer, mandatory)? {
                    Some(trees) => trees,
                    None => return Ok(None),
                };
                while let Some(mut trees) = self.match_expr(inner, buffer, false)? {
                    out.append(&mut trees);
                }
                Ok(Some(out))
            }
            Expr::End => match_end(buffer, mandatory),
        }
    }

    fn match_nonterminal(&self, name: &'static str, buffer: &mut TokenBuffer, mandatory: bool) -> MatchResult {
        let production = self
            .grammar
            .get(name)
            .unwrap_or_else(|| panic!("grammar has no production for nonterminal {}", name));
        self.match_expr(production, buffer, mandatory)
    }

    fn match_and(&self, parts: &[Expr], buffer: &mut TokenBuffer, mandatory: bool) -> MatchResult {
        buffer.mark();
        let mut out = Vec::new();
        for part in parts {
            match self.match_expr(part, buffer, mandatory)? {
                Some(mut trees) => out.append(&mut trees),
                None => {
                    buffer.restore();
                    return Ok(None);
                }
            }
        }
        buffer.commit();
        Ok(Some(out))
    }

    fn match_or(&self, alts: &[Expr], buffer: &mut TokenBuffer, mandatory: bool) -> MatchResult {
        for (i, alt) in alts.iter().enumerate() {
            let is_last = i == alts.len() - 1;
            if let Some(trees) = self.match_expr(alt, buffer, is_last && mandatory)? {
                return Ok(Some(trees));
            }
        }
        Ok(None)
    }
}

fn match_token(token_type: TokenType, discard: bool, buffer: &mut TokenBuffer, mandatory: bool) -> MatchResult {
    match buffer.peek().cloned() {
        Some(token) if token.token_type == token_type => {
            buffer.next();
            Ok(Some(if discard { vec![] } else { vec![Tree::Terminal(token)] }))
        }
        Some(token) => {
            if mandatory {
                Err(EvalError::SyntaxError {
                    line: token.line,
                    column: token.column,
                    message: format!(
                        "expecting {:?}, found {:?} \"{}\"",
                        token_type, token.token_type, token.text
                    ),
                })
            } else {
                Ok(None)
            }
        }
        None => {
            if mandatory {
                Err(EvalError::SyntaxError {
                    line: 0,
                    column: 0,
                    message: format!("unexpected end of input, expecting {:?}", token_type),
                })
            } else {
                Ok(None)
            }
        }
    }
}

fn match_end(buffer: &mut TokenBuffer, mandatory: bool) -> MatchResult {
    match buffer.peek().cloned() {
        None => Ok(Some(vec![])),
        Some(token) => {
            if mandatory {
                Err(EvalError::SyntaxError {
                    line: token.line,
                    column: token.column,
                    message: format!("unexpected {:?} \"{}\", expected end of input", token.token_type, token.text),
                })
            } else {
                Ok(None)
            }
        }
    }
}

/// Parses a full program and lowers it into top-level Values.
pub fn parse_program(source: &str) -> Result<Vec<Value>, EvalError> {
    let tokens = Tokenizer::scheme().tokenize(source)?;
    let tree = Parser::scheme().parse(tokens)?;
    match tree {
        Tree::Node(PROGRAM, children) => children.iter().map(lower_expression).collect(),
        _ => unreachable!("parse() always returns a PROGRAM node"),
    }
}

fn lower_expression(tree: &Tree) -> Result<Value, EvalError> {
    match tree {
        Tree::Node(EXPRESSION, children) => lower_expression(&children[0]),
        Tree::Node(QUOTED, children) => {
            let inner = lower_expression(&children[0])?;
            Ok(Value::cons(
                Value::Symbol("quote".to_string()),
                Value::cons(inner, Value::Nil),
            ))
        }
        Tree::Node(ATOM, children) => lower_atom(&children[0]),
        Tree::Node(LIST, children) => lower_list(children),
        other => Err(EvalError::ValueError(format!("cannot lower parse tree node {:?}", other))),
    }
}

fn lower_atom(tree: &Tree) -> Result<Value, EvalError> {
    match tree {
        Tree::Terminal(token) => Ok(match token.token_type {
            TokenType::Symbol => Value::Symbol(token.text.clone()),
            TokenType::Integer => Value::Integer(token.integer_value()),
            TokenType::Float => Value::Float(token.float_value()),
            TokenType::Str => Value::Str(token.text.clone()),
            other => return Err(EvalError::ValueError(format!("{:?} is not an atom token", other))),
        }),
        other => Err(EvalError::ValueError(format!("expected an atom token, found {:?}", other))),
    }
}

fn lower_list(children: &[Tree]) -> Result<Value, EvalError> {
    let mut items = Vec::new();
    let mut terminator = Value::Nil;
    for child in children {
        match child {
            Tree::Node(EXPRESSION, _) => items.push(lower_expression(child)?),
            Tree::Node(DOTTED, dotted_children) => {
                terminator = lower_expression(&dotted_children[0])?;
            }
            other => return Err(EvalError::ValueError(format!("unexpected LIST child {:?}", other))),
        }
    }
    Ok(items
        .into_iter()
        .rev()
        .fold(terminator, |acc, item| Value::cons(item, acc)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_one(src: &str) -> Value {
        let mut forms = parse_program(src).unwrap();
        assert_eq!(forms.len(), 1);
        forms.pop().unwrap()
    }

    #[test]
    fn parses_empty_program() {
        assert_eq!(parse_program("").unwrap().len(), 0);
        assert_eq!(parse_program("   ; just a comment\n").unwrap().len(), 0);
    }

    #[test]
    fn parses_atom() {
        assert_eq!(parse_one("42").to_string(), "42");
        assert_eq!(parse_one("foo").to_string(), "foo");
        assert_eq!(parse_one("3.5").to_string(), "3.5");
        assert_eq!(parse_one("\"hi\"").to_string(), "\"hi\"");
    }

    #[test]
    fn parses_proper_list() {
        assert_eq!(parse_one("(+ 1 2)").to_string(), "(+ 1 2)");
    }

    #[test]
    fn parses_nested_list() {
        assert_eq!(parse_one("(a (b c) d)").to_string(), "(a (b c) d)");
    }

    #[test]
    fn parses_dotted_pair() {
        assert_eq!(parse_one("(1 . 2)").to_string(), "(1 . 2)");
    }

    #[test]
    fn parses_empty_list_as_nil() {
        assert_eq!(parse_one("()").to_string(), "nil");
    }

    #[test]
    fn parses_quote_sugar_as_quote_form() {
        assert_eq!(parse_one("'x").to_string(), "(quote x)");
        assert_eq!(parse_one("'(1 2)").to_string(), "(quote (1 2))");
    }

    #[test]
    fn parses_multiple_top_level_forms() {
        let forms = parse_program("(define x 1) (+ x 1)").unwrap();
        assert_eq!(forms.len(), 2);
    }

    #[test]
    fn unclosed_list_is_a_syntax_error() {
        assert!(matches!(parse_program("(+ 1 2"), Err(EvalError::SyntaxError { .. })));
    }

    #[test]
    fn unexpected_closing_paren_is_a_syntax_error() {
        assert!(matches!(parse_program(")"), Err(EvalError::SyntaxError { .. })));
    }

    #[test]
    fn consecutive_top_level_forms_both_parse() {
        assert!(parse_program("(a) (b)").is_ok());
    }
}
