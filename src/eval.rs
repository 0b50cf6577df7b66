// ABOUTME: The trampolined evaluator — special forms, application, and tail calls

use crate::env::Environment;
use crate::error::EvalError;
use crate::macros;
use crate::value::{Macro, Procedure, Value};
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

/// What a single step of a special form or application produces: either a
/// final value, or a new (expression, environment) pair to keep evaluating
/// in tail position — the `loop` in `eval` never grows the Rust call stack
/// for these.
enum TailCall {
    Done(Value),
    Continue(Value, Rc<Environment>),
}

pub fn eval(mut expr: Value, mut env: Rc<Environment>) -> Result<Value, EvalError> {
    loop {
        match expr {
            Value::Thunk(_) => return force(&expr),
            Value::Symbol(ref name) => {
                let value = env.get(name)?;
                return match value {
                    Value::Thunk(_) => force(&value),
                    other => Ok(other),
                };
            }
            Value::Pair(_) => match eval_pair_form(&expr, &env)? {
                TailCall::Done(value) => return Ok(value),
                TailCall::Continue(next_expr, next_env) => {
                    expr = next_expr;
                    env = next_env;
                }
            },
            // Nil, booleans, numbers, strings, and already-built procedures
            // and macros evaluate to themselves.
            other => return Ok(other),
        }
    }
}

/// Forces a thunk to its value, evaluating its expression in its captured
/// environment on first demand and caching the result for every later
/// force. Passing a non-thunk through is a convenience for callers that
/// don't know in advance whether a value is lazy.
pub fn force(value: &Value) -> Result<Value, EvalError> {
    let state = match value {
        Value::Thunk(state) => state,
        other => return Ok(other.clone()),
    };

    if let Some(cached) = &state.borrow().value {
        if state.borrow().evaluated {
            return Ok(cached.clone());
        }
    }

    let (expression, environment) = {
        let s = state.borrow();
        (s.expression.clone(), s.environment.clone())
    };
    let result = eval(expression, environment)?;

    let mut s = state.borrow_mut();
    s.evaluated = true;
    s.value = Some(result.clone());
    Ok(result)
}

fn eval_pair_form(expr: &Value, env: &Rc<Environment>) -> Result<TailCall, EvalError> {
    let head = expr.car()?;
    let rest = expr.cdr()?;

    if let Some(name) = head.as_symbol() {
        match name {
            "quote" => {
                let quoted = rest.car()?;
                if !rest.cdr()?.is_nil() {
                    return Err(EvalError::arity_error("quote", "1", rest.to_vec()?.len()));
                }
                return Ok(TailCall::Done(quoted));
            }
            "delay" => return Ok(TailCall::Done(Value::thunk(rest.car()?, env.clone()))),
            "defined?" => {
                let target = rest.car()?;
                let symbol = target
                    .as_symbol()
                    .ok_or_else(|| EvalError::type_error("defined?", "symbol", &target.type_name()))?;
                return Ok(TailCall::Done(Value::Bool(env.exists(symbol))));
            }
            "define" => return Ok(TailCall::Done(eval_define(&rest, env)?)),
            "eval" => {
                let code = eval(rest.car()?, env.clone())?;
                return Ok(TailCall::Continue(code, env.clone()));
            }
            "if" => return eval_if(&rest, env),
            "lambda" => return Ok(TailCall::Done(eval_lambda(&rest, env)?)),
            "macro" => return Ok(TailCall::Done(eval_macro_def(&rest, env)?)),
            _ => {}
        }
    }

    let func = eval(head, env.clone())?;
    let operand_exprs = rest.to_vec()?;

    match func {
        Value::Macro(ref m) => {
            let expanded = macros::expand(m, expr)?;
            Ok(TailCall::Continue(expanded, env.clone()))
        }
        Value::BuiltinProcedure(b) => {
            check_arity(&b.name, b.min_args, b.max_args, operand_exprs.len())?;
            let args = operand_exprs
                .into_iter()
                .map(|operand| eval(operand, env.clone()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(TailCall::Done((b.callable)(&args)?))
        }
        Value::Procedure(p) => {
            let call_env = bind_call_frame(&p, operand_exprs, env)?;
            let (last, init) = p
                .body
                .split_last()
                .expect("a procedure's body always has at least one expression");
            for form in init {
                eval(form.clone(), call_env.clone())?;
            }
            Ok(TailCall::Continue(last.clone(), call_env))
        }
        other => Err(EvalError::type_error("application", "procedure, builtin, or macro", &other.type_name())),
    }
}

fn eval_if(rest: &Value, env: &Rc<Environment>) -> Result<TailCall, EvalError> {
    let condition = eval(rest.car()?, env.clone())?;
    let after_condition = rest.cdr()?;
    let then_branch = after_condition.car()?;

    if condition.is_truthy() {
        return Ok(TailCall::Continue(then_branch, env.clone()));
    }

    match after_condition.cdr()? {
        Value::Pair(cell) => Ok(TailCall::Continue(cell.borrow().0.clone(), env.clone())),
        _ => Err(EvalError::SyntaxError {
            line: 0,
            column: 0,
            message: "if: missing alternative branch".to_string(),
        }),
    }
}

fn eval_define(rest: &Value, env: &Rc<Environment>) -> Result<Value, EvalError> {
    let target = rest.car()?;
    match target {
        Value::Symbol(name) => {
            let value_expr = rest.cdr()?.car()?;
            // A literal `lambda` is evaluated eagerly so the closure can be
            // named for error messages — constructing it is pure, so this is
            // observationally identical to thunking it and forcing on first
            // reference. Every other expression is bound as a fresh Thunk,
            // deferring any side effect (or failure) until `name` is used.
            let is_lambda_literal = value_expr
                .car()
                .ok()
                .and_then(|head| head.as_symbol().map(|s| s == "lambda"))
                .unwrap_or(false);

            let value = if is_lambda_literal {
                let value = eval(value_expr, env.clone())?;
                if let Value::Procedure(p) = &value {
                    if p.name.borrow().is_none() {
                        *p.name.borrow_mut() = Some(name.clone());
                    }
                }
                value
            } else {
                Value::thunk(value_expr, env.clone())
            };
            env.define(name.clone(), value);
            Ok(Value::Symbol(name))
        }
        Value::Pair(_) => {
            let name = target
                .car()?
                .as_symbol()
                .ok_or_else(|| EvalError::type_error("define", "symbol", "non-symbol"))?
                .to_string();
            let (parameters, rest_param) = parse_params(target.cdr()?)?;
            let body = rest.cdr()?.to_vec()?;
            if body.is_empty() {
                return Err(EvalError::ValueError("define: function body cannot be empty".to_string()));
            }
            let procedure = Value::Procedure(Rc::new(Procedure {
                parameters,
                rest: rest_param,
                body,
                environment: env.clone(),
                name: RefCell::new(Some(name.clone())),
            }));
            env.define(name.clone(), procedure);
            Ok(Value::Symbol(name))
        }
        other => Err(EvalError::type_error("define", "symbol or (name . params)", &other.type_name())),
    }
}

fn eval_lambda(rest: &Value, env: &Rc<Environment>) -> Result<Value, EvalError> {
    let (parameters, rest_param) = parse_params(rest.car()?)?;
    let body = rest.cdr()?.to_vec()?;
    if body.is_empty() {
        return Err(EvalError::ValueError("lambda: body cannot be empty".to_string()));
    }
    Ok(Value::Procedure(Rc::new(Procedure {
        parameters,
        rest: rest_param,
        body,
        environment: env.clone(),
        name: RefCell::new(None),
    })))
}

/// A parameter list is a (possibly improper) list of symbols: `(a b c)` is
/// fixed arity, `(a b . rest)` takes two required plus a rest parameter,
/// and a bare symbol `args` takes any number of arguments into one list.
fn parse_params(mut params: Value) -> Result<(Vec<String>, Option<String>), EvalError> {
    let mut names = Vec::new();
    loop {
        match params {
            Value::Nil => return Ok((names, None)),
            Value::Symbol(s) => return Ok((names, Some(s))),
            Value::Pair(cell) => {
                let (head, tail) = cell.borrow().clone();
                let name = head
                    .as_symbol()
                    .ok_or_else(|| EvalError::type_error("lambda", "symbol parameter", &head.type_name()))?
                    .to_string();
                names.push(name);
                params = tail;
            }
            other => return Err(EvalError::type_error("lambda", "parameter list", &other.type_name())),
        }
    }
}

/// `(macro name (reserved...) (pattern template) ...)` — an ordinary
/// pattern/template macro. `include` is registered directly by the builtin
/// environment instead, since its `transform` performs file I/O.
fn eval_macro_def(rest: &Value, env: &Rc<Environment>) -> Result<Value, EvalError> {
    let name = rest
        .car()?
        .as_symbol()
        .ok_or_else(|| EvalError::type_error("macro", "symbol name", "non-symbol"))?
        .to_string();

    let after_name = rest.cdr()?;
    let reserved_words: HashSet<String> = after_name
        .car()?
        .to_vec()?
        .into_iter()
        .map(|v| {
            v.as_symbol()
                .map(str::to_string)
                .ok_or_else(|| EvalError::type_error("macro", "symbol", &v.type_name()))
        })
        .collect::<Result<_, _>>()?;

    let mut rules = Vec::new();
    for rule in after_name.cdr()?.to_vec()? {
        let pattern = rule.car()?;
        let template = rule.cdr()?.car()?;
        rules.push((pattern, template));
    }

    let macro_value = Value::Macro(Rc::new(Macro::Rules {
        name: name.clone(),
        rules,
        reserved_words,
    }));
    env.define(name.clone(), macro_value);
    Ok(Value::Symbol(name))
}

fn bind_call_frame(p: &Rc<Procedure>, operand_exprs: Vec<Value>, caller_env: &Rc<Environment>) -> Result<Rc<Environment>, EvalError> {
    let min = p.parameters.len();
    if operand_exprs.len() < min || (p.rest.is_none() && operand_exprs.len() > min) {
        let expected = if p.rest.is_some() {
            format!("at least {}", min)
        } else {
            min.to_string()
        };
        let name = p.name.borrow().clone().unwrap_or_else(|| "#<lambda>".to_string());
        return Err(EvalError::arity_error(&name, expected, operand_exprs.len()));
    }

    let call_env = Environment::with_parent(p.environment.clone());
    let mut operands = operand_exprs.into_iter();
    for param in &p.parameters {
        let operand = operands.next().expect("arity already checked above");
        call_env.define(param.clone(), Value::thunk(operand, caller_env.clone()));
    }
    if let Some(rest_name) = &p.rest {
        let rest_thunks: Vec<Value> = operands.map(|operand| Value::thunk(operand, caller_env.clone())).collect();
        call_env.define(rest_name.clone(), Value::list(rest_thunks));
    }
    Ok(call_env)
}

fn check_arity(name: &str, min: usize, max: Option<usize>, actual: usize) -> Result<(), EvalError> {
    let ok = actual >= min && max.map(|m| actual <= m).unwrap_or(true);
    if ok {
        return Ok(());
    }
    let expected = match max {
        Some(m) if m == min => min.to_string(),
        Some(m) => format!("{}..{}", min, m),
        None => format!("at least {}", min),
    };
    Err(EvalError::arity_error(name, expected, actual))
}
