//! Type predicates: symbol?, pair?, nil?, procedure?, macro?, thunk?, atom?

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

macro_rules! predicate {
    ($fn_name:ident, $pattern:pat) => {
        pub fn $fn_name(args: &[Value]) -> Result<Value, EvalError> {
            match args {
                [v] => Ok(Value::Bool(matches!(v, $pattern))),
                _ => Err(EvalError::arity_error(stringify!($fn_name), "1", args.len())),
            }
        }
    };
}

predicate!(builtin_symbol_p, Value::Symbol(_));
predicate!(builtin_pair_p, Value::Pair(_));
predicate!(builtin_nil_p, Value::Nil);
predicate!(builtin_procedure_p, Value::Procedure(_) | Value::BuiltinProcedure(_));
predicate!(builtin_macro_p, Value::Macro(_));
predicate!(builtin_thunk_p, Value::Thunk(_));

/// `atom?` — anything other than a pair and Nil.
pub fn builtin_atom_p(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => Ok(Value::Bool(v.is_atom())),
        _ => Err(EvalError::arity_error("atom?", "1", args.len())),
    }
}

pub fn register(env: &Rc<Environment>) {
    use crate::value::BuiltinProcedure;
    macro_rules! builtin {
        ($name:expr, $f:expr) => {
            env.define(
                $name.to_string(),
                Value::BuiltinProcedure(Rc::new(BuiltinProcedure {
                    name: $name.to_string(),
                    min_args: 1,
                    max_args: Some(1),
                    callable: $f,
                })),
            );
        };
    }

    builtin!("symbol?", builtin_symbol_p);
    builtin!("pair?", builtin_pair_p);
    builtin!("nil?", builtin_nil_p);
    builtin!("procedure?", builtin_procedure_p);
    builtin!("macro?", builtin_macro_p);
    builtin!("thunk?", builtin_thunk_p);
    builtin!("atom?", builtin_atom_p);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_p_true_only_for_nil() {
        assert!(matches!(builtin_nil_p(&[Value::Nil]).unwrap(), Value::Bool(true)));
        assert!(matches!(builtin_nil_p(&[Value::Integer(0)]).unwrap(), Value::Bool(false)));
    }

    #[test]
    fn atom_p_is_false_only_for_pairs_and_nil() {
        assert!(matches!(builtin_atom_p(&[Value::Integer(1)]).unwrap(), Value::Bool(true)));
        assert!(matches!(builtin_atom_p(&[Value::Nil]).unwrap(), Value::Bool(false)));
        let pair = Value::cons(Value::Integer(1), Value::Nil);
        assert!(matches!(builtin_atom_p(&[pair]).unwrap(), Value::Bool(false)));
    }
}
