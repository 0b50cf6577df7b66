//! Pair operations: cons, car, cdr, set-car!, set-cdr!, list, length
//!
//! `car`/`cdr` delegate straight to `Value`'s own cons-cell accessors, so the
//! "car of an empty list" error is the same `TypeError` a direct `Value::car`
//! call on `Nil` already produces elsewhere in the interpreter.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

pub fn builtin_cons(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [a, b] => Ok(Value::cons(a.clone(), b.clone())),
        _ => Err(EvalError::arity_error("cons", "2", args.len())),
    }
}

pub fn builtin_car(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => v.car(),
        _ => Err(EvalError::arity_error("car", "1", args.len())),
    }
}

pub fn builtin_cdr(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => v.cdr(),
        _ => Err(EvalError::arity_error("cdr", "1", args.len())),
    }
}

pub fn builtin_set_car(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [pair, value] => {
            pair.set_car(value.clone())?;
            Ok(Value::Nil)
        }
        _ => Err(EvalError::arity_error("set-car!", "2", args.len())),
    }
}

pub fn builtin_set_cdr(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [pair, value] => {
            pair.set_cdr(value.clone())?;
            Ok(Value::Nil)
        }
        _ => Err(EvalError::arity_error("set-cdr!", "2", args.len())),
    }
}

pub fn builtin_list(args: &[Value]) -> Result<Value, EvalError> {
    Ok(Value::list(args.to_vec()))
}

pub fn builtin_length(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [v] => Ok(Value::Integer(v.to_vec()?.len() as i64)),
        _ => Err(EvalError::arity_error("length", "1", args.len())),
    }
}

pub fn register(env: &Rc<Environment>) {
    use crate::value::BuiltinProcedure;
    macro_rules! builtin {
        ($name:expr, $min:expr, $max:expr, $f:expr) => {
            env.define(
                $name.to_string(),
                Value::BuiltinProcedure(Rc::new(BuiltinProcedure {
                    name: $name.to_string(),
                    min_args: $min,
                    max_args: $max,
                    callable: $f,
                })),
            );
        };
    }

    builtin!("cons", 2, Some(2), builtin_cons);
    builtin!("car", 1, Some(1), builtin_car);
    builtin!("cdr", 1, Some(1), builtin_cdr);
    builtin!("set-car!", 2, Some(2), builtin_set_car);
    builtin!("set-cdr!", 2, Some(2), builtin_set_cdr);
    builtin!("list", 0, None, builtin_list);
    builtin!("length", 1, Some(1), builtin_length);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cons_builds_a_pair() {
        let result = builtin_cons(&[Value::Integer(1), Value::Nil]).unwrap();
        assert_eq!(result.to_string(), "(1)");
    }

    #[test]
    fn car_of_empty_list_is_a_type_error() {
        assert!(builtin_car(&[Value::Nil]).is_err());
    }

    #[test]
    fn set_car_mutates_in_place() {
        let pair = Value::cons(Value::Integer(1), Value::Nil);
        builtin_set_car(&[pair.clone(), Value::Integer(9)]).unwrap();
        assert_eq!(pair.to_string(), "(9)");
    }

    #[test]
    fn length_counts_proper_list_elements() {
        let list = Value::list(vec![Value::Integer(1), Value::Integer(2), Value::Integer(3)]);
        assert!(matches!(builtin_length(&[list]).unwrap(), Value::Integer(3)));
    }
}
