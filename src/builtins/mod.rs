//! Built-in procedures: the primitives that are cheapest expressed as Rust
//! functions rather than macros over `if`/`lambda` — arithmetic, comparison,
//! type predicates, pair operations, symbol operations, and file I/O.
//!
//! Short-circuiting forms (`and`, `or`), binding forms (`let`), and other
//! derived syntax live in the Scheme-source prelude (`crate::stdlib`)
//! instead, since a strict built-in procedure cannot skip evaluating an
//! argument the way those forms need to.

use crate::env::Environment;
use crate::value::{Macro, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

pub mod arithmetic;
pub mod comparison;
pub mod io;
pub mod lists;
pub mod logic;
pub mod symbols;
pub mod types;

pub use arithmetic::register as register_arithmetic;
pub use comparison::register as register_comparison;
pub use io::register as register_io;
pub use lists::register as register_lists;
pub use logic::register as register_logic;
pub use symbols::register as register_symbols;
pub use types::register as register_types;

/// Registers every built-in procedure in `env`, plus the constant bindings
/// (`nil`, `#t`, `#f`) and the `include` macro.
///
/// `#t`/`#f` are ordinary `Symbol` tokens at the tokenizer/parser level (see
/// `tokenizer.rs`/`parser.rs`) — there is no dedicated boolean-literal lexical
/// rule. They become `Value::Bool` only through this environment binding, so
/// a program that never loads these builtins would see them as plain symbols.
pub fn register_builtins(env: &Rc<Environment>) {
    register_arithmetic(env);
    register_comparison(env);
    register_logic(env);
    register_types(env);
    register_lists(env);
    register_io(env);
    register_symbols(env);

    env.define("nil".to_string(), Value::Nil);
    env.define("#t".to_string(), Value::Bool(true));
    env.define("#f".to_string(), Value::Bool(false));

    env.define(
        "include".to_string(),
        Value::Macro(Rc::new(Macro::Include {
            name: "include".to_string(),
            included: RefCell::new(HashSet::new()),
        })),
    );
}
