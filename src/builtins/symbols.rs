//! Symbol operations: explode, implode

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

/// `explode` — a symbol to a list of its single-character symbols.
pub fn builtin_explode(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [Value::Symbol(s)] => {
            let chars = s.chars().map(|c| Value::Symbol(c.to_string())).collect();
            Ok(Value::list(chars))
        }
        [other] => Err(EvalError::type_error("explode", "symbol", &other.type_name())),
        _ => Err(EvalError::arity_error("explode", "1", args.len())),
    }
}

/// `implode` — a list of symbols back into a single symbol.
pub fn builtin_implode(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => {
            let mut out = String::new();
            for item in v.to_vec()? {
                match item {
                    Value::Symbol(s) => out.push_str(&s),
                    other => return Err(EvalError::type_error("implode", "symbol", &other.type_name())),
                }
            }
            Ok(Value::Symbol(out))
        }
        _ => Err(EvalError::arity_error("implode", "1", args.len())),
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

    builtin!("explode", builtin_explode);
    builtin!("implode", builtin_implode);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explode_splits_a_symbol_into_single_character_symbols() {
        let result = builtin_explode(&[Value::Symbol("abc".to_string())]).unwrap();
        assert_eq!(result.to_string(), "(a b c)");
    }

    #[test]
    fn implode_is_the_inverse_of_explode() {
        let list = Value::list(vec![
            Value::Symbol("a".to_string()),
            Value::Symbol("b".to_string()),
            Value::Symbol("c".to_string()),
        ]);
        let result = builtin_implode(&[list]).unwrap();
        assert!(matches!(result, Value::Symbol(s) if s == "abc"));
    }
}
