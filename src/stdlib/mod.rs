//! The derived-forms prelude: short-circuiting and binding syntax expressed
//! as Scheme-source macros rather than Rust special forms.
//!
//! `begin`/`and`/`or`/`let`/`cond` cannot be strict built-in procedures —
//! each needs to skip evaluating some of its operands — so instead of adding
//! more special-form cases to `eval.rs`, they're defined once, in the
//! surface language itself, using the `macro` special form, and loaded into
//! every fresh global environment at startup.

use crate::env::Environment;
use crate::error::EvalError;
use crate::eval;
use crate::parser::parse_program;
use std::rc::Rc;

const PRELUDE_SOURCE: &str = include_str!("prelude.scm");

/// Parses and evaluates the prelude's forms in `env`, defining its macros.
pub fn register_stdlib(env: &Rc<Environment>) -> Result<(), EvalError> {
    for form in parse_program(PRELUDE_SOURCE)? {
        eval::eval(form, env.clone())?;
    }
    Ok(())
}
