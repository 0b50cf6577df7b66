// ABOUTME: A declarative finite-state tokenizer converting source text into typed tokens

use crate::error::EvalError;
use std::collections::HashMap;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenType {
    Quote,
    LParen,
    RParen,
    Dot,
    Symbol,
    Integer,
    Float,
    Str,
}

#[derive(Clone, Debug)]
pub struct Token {
    pub token_type: TokenType,
    pub text: String,
    pub line: usize,
    pub column: usize,
}

impl Token {
    pub fn integer_value(&self) -> i64 {
        self.text.parse().expect("INTEGER token held non-integer text")
    }

    pub fn float_value(&self) -> f64 {
        self.text.parse().expect("FLOAT token held non-float text")
    }
}

type Predicate = fn(char) -> bool;

/// One state in the tokenizer's transition table: an ordered list of
/// (predicate, next-state-name) pairs tried in order, an optional terminal
/// token type, and whether matched characters are appended to the lexeme
/// buffer or discarded (e.g. whitespace, quote delimiters).
struct State {
    transitions: Vec<(Predicate, &'static str)>,
    terminal: Option<TokenType>,
    discard: bool,
}

impl State {
    fn new(transitions: Vec<(Predicate, &'static str)>, terminal: Option<TokenType>, discard: bool) -> Self {
        State {
            transitions,
            terminal,
            discard,
        }
    }

    fn next_state(&self, ch: char) -> Option<&'static str> {
        self.transitions
            .iter()
            .find(|(predicate, _)| predicate(ch))
            .map(|(_, name)| *name)
    }
}

pub struct Tokenizer {
    states: HashMap<&'static str, State>,
    start: &'static str,
}

fn is_ws(c: char) -> bool {
    c.is_whitespace()
}
fn is_semicolon(c: char) -> bool {
    c == ';'
}
fn is_squote(c: char) -> bool {
    c == '\''
}
fn is_lparen(c: char) -> bool {
    c == '('
}
fn is_rparen(c: char) -> bool {
    c == ')'
}
fn is_dot(c: char) -> bool {
    c == '.'
}
fn is_minus(c: char) -> bool {
    c == '-'
}
fn is_digit(c: char) -> bool {
    c.is_ascii_digit()
}
fn is_dquote(c: char) -> bool {
    c == '"'
}
fn is_newline(c: char) -> bool {
    c == '\n'
}
fn is_backslash(c: char) -> bool {
    c == '\\'
}
fn any_char(_c: char) -> bool {
    true
}
fn is_string_body_char(c: char) -> bool {
    c != '"' && c != '\\'
}
fn is_symbol_char(c: char) -> bool {
    !is_lparen(c) && !is_rparen(c) && !c.is_whitespace() && !is_semicolon(c)
}

impl Tokenizer {
    /// The canonical Scheme lexical grammar: whitespace and `;` comments are
    /// discarded, `'` / `(` / `)` / `.` are single-character tokens, numbers
    /// extend into floats on a `.` followed by a digit, and strings use a
    /// `\`-escaping sub-machine that strips the surrounding quotes.
    pub fn scheme() -> Self {
        let mut states = HashMap::new();

        states.insert(
            "START",
            State::new(
                vec![
                    (is_ws, "START"),
                    (is_semicolon, "COMMENT"),
                    (is_squote, "QUOTE"),
                    (is_lparen, "LPAREN"),
                    (is_rparen, "RPAREN"),
                    (is_dot, "MAYBE_DOT"),
                    (is_minus, "INT_OR_SYM"),
                    (is_digit, "MAYBE_INT"),
                    (is_dquote, "STRING_OPEN"),
                    (any_char, "SYMBOL"),
                ],
                None,
                true,
            ),
        );
        states.insert(
            "COMMENT",
            State::new(vec![(is_newline, "START"), (any_char, "COMMENT")], None, true),
        );
        states.insert("QUOTE", State::new(vec![], Some(TokenType::Quote), false));
        states.insert("LPAREN", State::new(vec![], Some(TokenType::LParen), false));
        states.insert("RPAREN", State::new(vec![], Some(TokenType::RParen), false));
        states.insert(
            "MAYBE_DOT",
            State::new(
                vec![(is_digit, "MAYBE_FLOAT"), (is_symbol_char, "SYMBOL")],
                Some(TokenType::Dot),
                false,
            ),
        );
        states.insert(
            "INT_OR_SYM",
            State::new(
                vec![(is_digit, "MAYBE_INT"), (is_symbol_char, "SYMBOL")],
                Some(TokenType::Symbol),
                false,
            ),
        );
        states.insert(
            "MAYBE_INT",
            State::new(
                vec![
                    (is_digit, "MAYBE_INT"),
                    (is_dot, "MAYBE_FLOAT"),
                    (is_symbol_char, "SYMBOL"),
                ],
                Some(TokenType::Integer),
                false,
            ),
        );
        states.insert(
            "STRING_OPEN",
            State::new(
                vec![(is_string_body_char, "STRING_BODY"), (is_backslash, "SCAPE_CHAR")],
                None,
                true,
            ),
        );
        states.insert(
            "STRING_BODY",
            State::new(
                vec![
                    (is_string_body_char, "STRING_BODY"),
                    (is_backslash, "SCAPE_CHAR"),
                    (is_dquote, "STRING_CLOSE"),
                ],
                None,
                false,
            ),
        );
        states.insert("SCAPE_CHAR", State::new(vec![(any_char, "STRING_BODY")], None, false));
        states.insert("STRING_CLOSE", State::new(vec![], Some(TokenType::Str), true));
        states.insert(
            "MAYBE_FLOAT",
            State::new(
                vec![(is_digit, "MAYBE_FLOAT"), (is_symbol_char, "SYMBOL")],
                Some(TokenType::Float),
                false,
            ),
        );
        states.insert(
            "SYMBOL",
            State::new(vec![(is_symbol_char, "SYMBOL")], Some(TokenType::Symbol), false),
        );

        Tokenizer { states, start: "START" }
    }

    pub fn tokenize(&self, text: &str) -> Result<Vec<Token>, EvalError> {
        let mut tokens = Vec::new();
        let mut current = self.start;
        let mut lexeme = String::new();
        let mut line = 1usize;
        let mut column = 1usize;
        let mut token_start_line = 1usize;
        let mut token_start_column = 1usize;

        for ch in text.chars() {
            loop {
                let state = &self.states[current];
                match state.next_state(ch) {
                    Some(next) => {
                        let entering = &self.states[next];
                        if !entering.discard {
                            if lexeme.is_empty() {
                                token_start_line = line;
                                token_start_column = column;
                            }
                            lexeme.push(ch);
                        }
                        current = next;
                        break;
                    }
                    None => {
                        if let Some(token_type) = state.terminal {
                            tokens.push(build_token(token_type, &lexeme, token_start_line, token_start_column)?);
                            lexeme.clear();
                            current = self.start;
                            // reprocess the same character from the start state
                            continue;
                        } else {
                            return Err(EvalError::LexError { line, column, ch });
                        }
                    }
                }
            }

            if ch == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }

        if !lexeme.is_empty() {
            let state = &self.states[current];
            if let Some(token_type) = state.terminal {
                tokens.push(build_token(token_type, &lexeme, token_start_line, token_start_column)?);
            } else {
                return Err(EvalError::SyntaxError {
                    line,
                    column,
                    message: "unexpected end of input".to_string(),
                });
            }
        }

        Ok(tokens)
    }
}

fn build_token(token_type: TokenType, lexeme: &str, line: usize, column: usize) -> Result<Token, EvalError> {
    let text = match token_type {
        TokenType::Str => decode_escapes(lexeme),
        _ => lexeme.to_string(),
    };
    Ok(Token {
        token_type,
        text,
        line,
        column,
    })
}

fn decode_escapes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some('"') => out.push('"'),
                Some(other) => out.push(other),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types(tokens: &[Token]) -> Vec<TokenType> {
        tokens.iter().map(|t| t.token_type).collect()
    }

    #[test]
    fn tokenizes_parens_and_symbols() {
        let tokens = Tokenizer::scheme().tokenize("(foo bar)").unwrap();
        assert_eq!(
            types(&tokens),
            vec![TokenType::LParen, TokenType::Symbol, TokenType::Symbol, TokenType::RParen]
        );
        assert_eq!(tokens[1].text, "foo");
    }

    #[test]
    fn tokenizes_integer_and_float() {
        let tokens = Tokenizer::scheme().tokenize("42 .5 3.14 -7").unwrap();
        assert_eq!(tokens[0].integer_value(), 42);
        assert_eq!(tokens[1].float_value(), 0.5);
        assert_eq!(tokens[2].float_value(), 3.14);
        assert_eq!(tokens[3].integer_value(), -7);
    }

    #[test]
    fn tokenizes_quote_and_dot() {
        let tokens = Tokenizer::scheme().tokenize("'(a . b)").unwrap();
        assert_eq!(
            types(&tokens),
            vec![
                TokenType::Quote,
                TokenType::LParen,
                TokenType::Symbol,
                TokenType::Dot,
                TokenType::Symbol,
                TokenType::RParen
            ]
        );
    }

    #[test]
    fn tokenizes_string_with_escapes() {
        let tokens = Tokenizer::scheme().tokenize(r#""hello\nworld""#).unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].token_type, TokenType::Str);
        assert_eq!(tokens[0].text, "hello\nworld");
    }

    #[test]
    fn discards_comments_and_whitespace() {
        let tokens = Tokenizer::scheme().tokenize("; comment\n  foo  ").unwrap();
        assert_eq!(types(&tokens), vec![TokenType::Symbol]);
        assert_eq!(tokens[0].text, "foo");
    }

    #[test]
    fn minus_alone_is_a_symbol() {
        let tokens = Tokenizer::scheme().tokenize("(- 1 2)").unwrap();
        assert_eq!(tokens[1].token_type, TokenType::Symbol);
        assert_eq!(tokens[1].text, "-");
    }

    #[test]
    fn operator_symbols_are_recognized() {
        let tokens = Tokenizer::scheme().tokenize("(+ * / <= >=)").unwrap();
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["(", "+", "*", "/", "<=", ">=", ")"]);
    }
}
