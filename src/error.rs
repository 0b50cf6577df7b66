// ABOUTME: Error types shared by the tokenizer, parser, macro engine, and evaluator

use thiserror::Error;

/// The stable error taxonomy for every stage of the interpreter pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvalError {
    #[error("lexical error at line {line}, column {column}: unexpected character '{ch}'")]
    LexError { line: usize, column: usize, ch: char },

    #[error("syntax error at line {line}, column {column}: {message}")]
    SyntaxError {
        line: usize,
        column: usize,
        message: String,
    },

    #[error("unbound symbol: {0}")]
    UnboundSymbol(String),

    #[error("{function}: expected {expected}, got {actual}")]
    TypeError {
        function: String,
        expected: String,
        actual: String,
    },

    #[error("{function}: expected {expected} argument{}, got {actual}", if expected == "1" { "" } else { "s" })]
    ArityError {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("macro {name}: no rule matched expression {expression}")]
    MacroMatchFailure { name: String, expression: String },

    #[error("I/O error: {0}")]
    IOError(String),

    #[error("value error: {0}")]
    ValueError(String),
}

impl EvalError {
    pub fn type_error(function: &str, expected: &str, actual: &str) -> Self {
        EvalError::TypeError {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    pub fn arity_error(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        EvalError::ArityError {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }
}
