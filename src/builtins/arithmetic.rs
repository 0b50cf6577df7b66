//! Arithmetic operations: +, -, *, /, mod
//!
//! Variadic where Scheme allows it. Operands stay `Integer` as long as every
//! operand is an `Integer`; a single `Float` operand promotes the whole
//! operation to floating point, following the usual numeric tower rule.

use crate::env::Environment;
use crate::error::EvalError;
use crate::value::Value;
use std::rc::Rc;

#[derive(Clone, Copy)]
enum Num {
    Int(i64),
    Float(f64),
}

impl Num {
    fn from_value(function: &str, v: &Value) -> Result<Num, EvalError> {
        match v {
            Value::Integer(n) => Ok(Num::Int(*n)),
            Value::Float(n) => Ok(Num::Float(*n)),
            other => Err(EvalError::type_error(function, "number", &other.type_name())),
        }
    }

    fn as_float(self) -> f64 {
        match self {
            Num::Int(n) => n as f64,
            Num::Float(n) => n,
        }
    }

    fn to_value(self) -> Value {
        match self {
            Num::Int(n) => Value::Integer(n),
            Num::Float(n) => Value::Float(n),
        }
    }
}

fn add(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Num::Int(x + y),
        _ => Num::Float(a.as_float() + b.as_float()),
    }
}

fn sub(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Num::Int(x - y),
        _ => Num::Float(a.as_float() - b.as_float()),
    }
}

fn mul(a: Num, b: Num) -> Num {
    match (a, b) {
        (Num::Int(x), Num::Int(y)) => Num::Int(x * y),
        _ => Num::Float(a.as_float() * b.as_float()),
    }
}

/// `(+ ...)` — sum of all arguments, 0 for no arguments.
pub fn builtin_add(args: &[Value]) -> Result<Value, EvalError> {
    let mut total = Num::Int(0);
    for arg in args {
        total = add(total, Num::from_value("+", arg)?);
    }
    Ok(total.to_value())
}

/// `(- a b ...)` — subtracts the rest from the first; `(- a)` negates.
pub fn builtin_sub(args: &[Value]) -> Result<Value, EvalError> {
    let first = args.first().ok_or_else(|| EvalError::arity_error("-", "at least 1", 0))?;
    let mut result = Num::from_value("-", first)?;
    if args.len() == 1 {
        return Ok(sub(Num::Int(0), result).to_value());
    }
    for arg in &args[1..] {
        result = sub(result, Num::from_value("-", arg)?);
    }
    Ok(result.to_value())
}

/// `(* ...)` — product of all arguments, 1 for no arguments.
pub fn builtin_mul(args: &[Value]) -> Result<Value, EvalError> {
    let mut total = Num::Int(1);
    for arg in args {
        total = mul(total, Num::from_value("*", arg)?);
    }
    Ok(total.to_value())
}

/// `(/ a b ...)` — divides the first by the rest; `(/ a)` is the reciprocal.
/// Always yields a float, matching the tokenizer's own float literal syntax.
pub fn builtin_div(args: &[Value]) -> Result<Value, EvalError> {
    let first = args.first().ok_or_else(|| EvalError::arity_error("/", "at least 1", 0))?;
    let first = Num::from_value("/", first)?.as_float();

    if args.len() == 1 {
        if first == 0.0 {
            return Err(EvalError::ValueError("/: division by zero".to_string()));
        }
        return Ok(Value::Float(1.0 / first));
    }

    let mut result = first;
    for arg in &args[1..] {
        let divisor = Num::from_value("/", arg)?.as_float();
        if divisor == 0.0 {
            return Err(EvalError::ValueError("/: division by zero".to_string()));
        }
        result /= divisor;
    }
    Ok(Value::Float(result))
}

/// `(mod a b)` — remainder of integer division.
pub fn builtin_mod(args: &[Value]) -> Result<Value, EvalError> {
    match args {
        [Value::Integer(a), Value::Integer(b)] => {
            if *b == 0 {
                return Err(EvalError::ValueError("mod: division by zero".to_string()));
            }
            Ok(Value::Integer(a % b))
        }
        [a, b] => Err(EvalError::type_error("mod", "integer", &if matches!(a, Value::Integer(_)) { b } else { a }.type_name())),
        _ => Err(EvalError::arity_error("mod", "2", args.len())),
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

    builtin!("+", 0, None, builtin_add);
    builtin!("-", 1, None, builtin_sub);
    builtin!("*", 0, None, builtin_mul);
    builtin!("/", 1, None, builtin_div);
    builtin!("mod", 2, Some(2), builtin_mod);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_sums_integers() {
        let result = builtin_add(&[Value::Integer(1), Value::Integer(2), Value::Integer(3)]).unwrap();
        assert!(matches!(result, Value::Integer(6)));
    }

    #[test]
    fn add_promotes_to_float_when_any_operand_is_float() {
        let result = builtin_add(&[Value::Integer(1), Value::Float(2.5)]).unwrap();
        assert!(matches!(result, Value::Float(f) if f == 3.5));
    }

    #[test]
    fn sub_with_one_argument_negates() {
        assert!(matches!(builtin_sub(&[Value::Integer(5)]).unwrap(), Value::Integer(-5)));
    }

    #[test]
    fn div_by_zero_is_an_error() {
        assert!(builtin_div(&[Value::Integer(1), Value::Integer(0)]).is_err());
    }

    #[test]
    fn mod_computes_remainder() {
        assert!(matches!(builtin_mod(&[Value::Integer(17), Value::Integer(5)]).unwrap(), Value::Integer(2)));
    }
}
