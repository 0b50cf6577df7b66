//! Comparison operations: =, !=, eq?, <, >, <=, >=
//!
//! `=` is structural equality (delegates to `Value::structural_eq`, so it
//! also compares lists and mixed int/float pairs); `eq?` is identity
//! (delegates to `Value::eq` — two freshly-consed equal pairs are `=` but not
//! `eq?`); the ordering operators are numeric-only and chain across any
//! number of arguments, e.g. `(< 1 2 3)`.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

fn as_f64(function: &str, v: &Value) -> Result<f64, EvalError> {
    match v {
        Value::Integer(n) => Ok(*n as f64),
        Value::Float(n) => Ok(*n),
        other => Err(EvalError::type_error(function, "number", &other.type_name())),
    }
}

fn chain(function: &str, args: &[Value], op: impl Fn(f64, f64) -> bool) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity_error(function, "at least 2", args.len()));
    }
    for pair in args.windows(2) {
        let a = as_f64(function, &pair[0])?;
        let b = as_f64(function, &pair[1])?;
        if !op(a, b) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

/// Structural equality across every argument (`(= a b c)` means `a = b = c`).
pub fn builtin_eq(args: &[Value]) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::arity_error("=", "at least 2", args.len()));
    }
    let all_equal = args.windows(2).all(|pair| pair[0].structural_eq(&pair[1]));
    Ok(Value::Bool(all_equal))
}

/// `!=` — binary structural inequality.
pub fn builtin_ne(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [a, b] => Ok(Value::Bool(!a.structural_eq(b))),
        _ => Err(EvalError::arity_error("!=", "2", args.len())),
    }
}

/// `eq?` — binary identity comparison.
pub fn builtin_eq_p(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [a, b] => Ok(Value::Bool(a.eq(b))),
        _ => Err(EvalError::arity_error("eq?", "2", args.len())),
    }
}

pub fn builtin_lt(args: &[Value]) -> Result<Value, EvalError> {
    chain("<", args, |a, b| a < b)
}

pub fn builtin_gt(args: &[Value]) -> Result<Value, EvalError> {
    chain(">", args, |a, b| a > b)
}

pub fn builtin_le(args: &[Value]) -> Result<Value, EvalError> {
    chain("<=", args, |a, b| a <= b)
}

pub fn builtin_ge(args: &[Value]) -> Result<Value, EvalError> {
    chain(">=", args, |a, b| a >= b)
}

pub fn register(env: &Rc<Environment>) {
    use crate::value::BuiltinProcedure;
    macro_rules! builtin {
        ($name:expr, $f:expr) => {
            env.define(
                $name.to_string(),
                Value::BuiltinProcedure(Rc::new(BuiltinProcedure {
                    name: $name.to_string(),
                    min_args: 2,
                    max_args: None,
                    callable: $f,
                })),
            );
        };
    }

    builtin!("=", builtin_eq);
    builtin!("<", builtin_lt);
    builtin!(">", builtin_gt);
    builtin!("<=", builtin_le);
    builtin!(">=", builtin_ge);

    env.define(
        "!=".to_string(),
        Value::BuiltinProcedure(Rc::new(BuiltinProcedure {
            name: "!=".to_string(),
            min_args: 2,
            max_args: Some(2),
            callable: builtin_ne,
        })),
    );
    env.define(
        "eq?".to_string(),
        Value::BuiltinProcedure(Rc::new(BuiltinProcedure {
            name: "eq?".to_string(),
            min_args: 2,
            max_args: Some(2),
            callable: builtin_eq_p,
        })),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eq_is_structural_not_identity() {
        let a = Value::cons(Value::Integer(1), Value::Nil);
        let b = Value::cons(Value::Integer(1), Value::Nil);
        assert!(matches!(builtin_eq(&[a, b]).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn eq_p_is_identity_not_structural() {
        let a = Value::cons(Value::Integer(1), Value::Nil);
        let b = Value::cons(Value::Integer(1), Value::Nil);
        assert!(matches!(builtin_eq_p(&[a.clone(), b]).unwrap(), Value::Bool(false)));
        assert!(matches!(builtin_eq_p(&[a.clone(), a]).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn ne_is_the_negation_of_structural_equality() {
        assert!(matches!(
            builtin_ne(&[Value::Integer(1), Value::Integer(2)]).unwrap(),
            Value::Bool(true)
        ));
    }

    #[test]
    fn lt_chains_across_many_arguments() {
        assert!(matches!(
            builtin_lt(&[Value::Integer(1), Value::Integer(2), Value::Integer(3)]).unwrap(),
            Value::Bool(true)
        ));
        assert!(matches!(
            builtin_lt(&[Value::Integer(1), Value::Integer(3), Value::Integer(2)]).unwrap(),
            Value::Bool(false)
        ));
    }
}
