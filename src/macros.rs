// ABOUTME: Pattern/template macro matching, substitution, and the impure `include` form

use crate::error::EvalError;
use crate::parser::parse_program;
use crate::value::{Macro, Value};
use std::collections::{HashMap, HashSet};
use std::fs;

/// Matches `pattern` against `expression`, returning the bindings captured
/// by pattern variables, or `None` if the pattern does not apply.
///
/// An atom pattern is a reserved word (must match literally), the wildcard
/// `_` (matches anything, binds nothing), an ellipsis symbol prefixed with
/// `...` (binds the *entire* remaining expression at this position, not
/// just one element), or otherwise a variable bound to whatever expression
/// sits there. `Nil` only matches `Nil`; any other pair pattern matches
/// only against another pair, recursing into `car`/`cdr`.
pub fn match_pattern(
    pattern: &Value,
    expression: &Value,
    reserved_words: &HashSet<String>,
) -> Option<HashMap<String, Value>> {
    if pattern.is_atom() {
        if let Some(sym) = pattern.as_symbol() {
            if reserved_words.contains(sym) {
                return if expression.structural_eq(pattern) {
                    Some(HashMap::new())
                } else {
                    None
                };
            }
            if sym == "_" {
                return Some(HashMap::new());
            }
            return Some(HashMap::from([(sym.to_string(), expression.clone())]));
        }
        return Some(HashMap::from([(pattern.to_string(), expression.clone())]));
    }

    if pattern.is_nil() {
        return if expression.is_nil() { Some(HashMap::new()) } else { None };
    }

    let pattern_car = pattern.car().ok()?;
    if let Some(sym) = pattern_car.as_symbol() {
        if sym.starts_with("...") {
            return Some(HashMap::from([(sym.to_string(), expression.clone())]));
        }
    }

    if !expression.is_pair() {
        return None;
    }

    let matched_car = match_pattern(&pattern_car, &expression.car().ok()?, reserved_words)?;
    let matched_cdr = match_pattern(&pattern.cdr().ok()?, &expression.cdr().ok()?, reserved_words)?;

    let mut bindings = matched_cdr;
    bindings.extend(matched_car);
    Some(bindings)
}

/// Rewrites `template` by replacing symbols bound in `variables` with their
/// captured values; everything else in the template is copied as-is. An
/// ellipsis-headed pair collapses to the substitution of just its head
/// (the rest-capture variable stands for the whole remaining structure).
pub fn substitute(variables: &HashMap<String, Value>, template: &Value) -> Value {
    if template.is_atom() {
        let key = template
            .as_symbol()
            .map(str::to_string)
            .unwrap_or_else(|| template.to_string());
        return variables.get(&key).cloned().unwrap_or_else(|| template.clone());
    }

    if template.is_pair() {
        let car = template.car().expect("is_pair guarantees car");
        if let Some(sym) = car.as_symbol() {
            if sym.starts_with("...") {
                return substitute(variables, &car);
            }
        }
        let new_car = substitute(variables, &car);
        let new_cdr = substitute(variables, &template.cdr().expect("is_pair guarantees cdr"));
        return Value::cons(new_car, new_cdr);
    }

    template.clone()
}

/// Expands a macro invocation. Assumes `expression`'s head already matched
/// the macro's name at the call site.
pub fn expand(macro_value: &Macro, expression: &Value) -> Result<Value, EvalError> {
    match macro_value {
        Macro::Rules {
            name,
            rules,
            reserved_words,
        } => {
            for (pattern, template) in rules {
                if let Some(bindings) = match_pattern(pattern, expression, reserved_words) {
                    return Ok(substitute(&bindings, template));
                }
            }
            Err(EvalError::MacroMatchFailure {
                name: name.clone(),
                expression: expression.to_string(),
            })
        }
        Macro::Include { name, included } => expand_include(name, included, expression),
    }
}

fn expand_include(
    name: &str,
    included: &std::cell::RefCell<HashSet<String>>,
    expression: &Value,
) -> Result<Value, EvalError> {
    let pattern = Value::cons(
        Value::Symbol("include".to_string()),
        Value::cons(Value::Symbol("path".to_string()), Value::Nil),
    );
    let bindings = match_pattern(&pattern, expression, &HashSet::new()).ok_or_else(|| EvalError::MacroMatchFailure {
        name: name.to_string(),
        expression: expression.to_string(),
    })?;

    let raw_path = match bindings.get("path") {
        Some(Value::Str(s)) => s.clone(),
        Some(Value::Symbol(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => {
            return Err(EvalError::MacroMatchFailure {
                name: name.to_string(),
                expression: expression.to_string(),
            })
        }
    };

    let path = find_file_in_path(&raw_path);

    if included.borrow().contains(&path) {
        return Ok(Value::Nil);
    }

    let contents = fs::read_to_string(&path)
        .map_err(|e| EvalError::IOError(format!("could not open {} to include: {}", path, e)))?;
    let forms = parse_program(&contents)?;
    included.borrow_mut().insert(path);

    let mut items = vec![Value::Symbol("begin".to_string())];
    items.extend(forms);
    Ok(Value::list(items))
}

fn find_file_in_path(filename: &str) -> String {
    let search_path = std::env::var("SCHEME_PATH").unwrap_or_else(|_| ".".to_string());
    for dir in search_path.split(':') {
        let candidate = std::path::Path::new(dir).join(filename);
        if candidate.exists() {
            return candidate.to_string_lossy().into_owned();
        }
    }
    filename.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_program;

    fn parse_one(src: &str) -> Value {
        let mut forms = parse_program(src).unwrap();
        forms.pop().unwrap()
    }

    #[test]
    fn matches_symbol_variable_against_any_expression() {
        let pattern = parse_one("x");
        let expr = Value::Integer(5);
        let bindings = match_pattern(&pattern, &expr, &HashSet::new()).unwrap();
        assert!(matches!(bindings.get("x"), Some(Value::Integer(5))));
    }

    #[test]
    fn wildcard_matches_and_binds_nothing() {
        let pattern = parse_one("_");
        let bindings = match_pattern(&pattern, &Value::Integer(1), &HashSet::new()).unwrap();
        assert!(bindings.is_empty());
    }

    #[test]
    fn reserved_word_must_match_literally() {
        let reserved: HashSet<String> = ["else".to_string()].into_iter().collect();
        let pattern = parse_one("else");
        assert!(match_pattern(&pattern, &Value::Symbol("else".to_string()), &reserved).is_some());
        assert!(match_pattern(&pattern, &Value::Symbol("other".to_string()), &reserved).is_none());
    }

    #[test]
    fn matches_list_structure_and_captures_elements() {
        let pattern = parse_one("(my-if c t e)");
        let expr = parse_one("(my-if #t 1 2)");
        let reserved: HashSet<String> = ["my-if".to_string()].into_iter().collect();
        let bindings = match_pattern(&pattern, &expr, &reserved).unwrap();
        assert!(matches!(bindings.get("t"), Some(Value::Integer(1))));
        assert!(matches!(bindings.get("e"), Some(Value::Integer(2))));
    }

    #[test]
    fn ellipsis_captures_the_remaining_tail() {
        let pattern = parse_one("(my-list ...rest)");
        let expr = parse_one("(my-list 1 2 3)");
        let reserved: HashSet<String> = ["my-list".to_string()].into_iter().collect();
        let bindings = match_pattern(&pattern, &expr, &reserved).unwrap();
        let rest = bindings.get("...rest").unwrap();
        assert_eq!(rest.to_string(), "(1 2 3)");
    }

    #[test]
    fn substitute_replaces_bound_symbols_and_keeps_literals() {
        let mut bindings = HashMap::new();
        bindings.insert("t".to_string(), Value::Integer(1));
        bindings.insert("e".to_string(), Value::Integer(2));
        let template = parse_one("(if c t e)");
        let result = substitute(&bindings, &template);
        assert_eq!(result.to_string(), "(if c 1 2)");
    }

    #[test]
    fn rules_macro_expands_using_first_matching_rule() {
        let reserved: HashSet<String> = ["swap".to_string()].into_iter().collect();
        let rules = vec![(parse_one("(swap a b)"), parse_one("(cons b a)"))];
        let macro_value = Macro::Rules {
            name: "swap".to_string(),
            rules,
            reserved_words: reserved,
        };
        let expanded = expand(&macro_value, &parse_one("(swap 1 2)")).unwrap();
        assert_eq!(expanded.to_string(), "(cons 2 1)");
    }

    #[test]
    fn rules_macro_errors_when_no_rule_matches() {
        let empty = Macro::Rules {
            name: "nothing".to_string(),
            rules: vec![],
            reserved_words: HashSet::new(),
        };
        assert!(expand(&empty, &parse_one("(nothing 1)")).is_err());

        let weird = Macro::Rules {
            name: "weird".to_string(),
            rules: vec![(parse_one("(weird a a)"), parse_one("a"))],
            reserved_words: ["weird".to_string()].into_iter().collect(),
        };
        assert!(expand(&weird, &parse_one("(weird 1 2)")).is_ok());
    }
}
