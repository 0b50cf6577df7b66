// ABOUTME: Environment module for managing variable bindings and scopes

use crate::error::EvalError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a new global environment with no parent
    pub fn new() -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
        })
    }

    /// Creates a new child environment with a parent
    pub fn with_parent(parent: Rc<Environment>) -> Rc<Self> {
        Rc::new(Environment {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(parent),
        })
    }

    /// Binds `name` in THIS frame (doesn't walk the parent chain). `define`
    /// always targets the innermost frame, even when the name already
    /// exists further up the chain.
    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    /// Looks up a symbol in this scope and parent scopes recursively.
    pub fn get(&self, name: &str) -> Result<Value, EvalError> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Ok(value.clone());
        }

        match &self.parent {
            Some(parent) => parent.get(name),
            None => Err(EvalError::UnboundSymbol(name.to_string())),
        }
    }

    /// Updates the nearest existing binding for `name` (`set!`). Unlike
    /// `define`, this walks the parent chain and fails if no frame already
    /// binds the name.
    pub fn set(&self, name: &str, value: Value) -> Result<(), EvalError> {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return Ok(());
        }

        match &self.parent {
            Some(parent) => parent.set(name, value),
            None => Err(EvalError::UnboundSymbol(name.to_string())),
        }
    }

    /// True if `name` is bound in this scope or any ancestor, without
    /// forcing a clone of the bound value. Backs the `defined?` special
    /// form.
    pub fn exists(&self, name: &str) -> bool {
        if self.bindings.borrow().contains_key(name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.exists(name),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::Integer(42));
        assert!(matches!(env.get("x"), Ok(Value::Integer(42))));
    }

    #[test]
    fn unbound_symbol_is_an_error() {
        let env = Environment::new();
        assert!(matches!(env.get("undefined"), Err(EvalError::UnboundSymbol(_))));
        assert!(!env.exists("undefined"));
    }

    #[test]
    fn define_shadows_in_child_without_touching_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Integer(42));

        let child = Environment::with_parent(parent.clone());
        child.define("x".to_string(), Value::Integer(100));

        assert!(matches!(child.get("x"), Ok(Value::Integer(100))));
        assert!(matches!(parent.get("x"), Ok(Value::Integer(42))));
    }

    #[test]
    fn child_sees_parent_bindings() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Integer(42));
        let child = Environment::with_parent(parent);
        assert!(matches!(child.get("x"), Ok(Value::Integer(42))));
        assert!(child.exists("x"));
    }

    #[test]
    fn walks_multiple_levels() {
        let grandparent = Environment::new();
        grandparent.define("a".to_string(), Value::Integer(1));
        let parent = Environment::with_parent(grandparent);
        parent.define("b".to_string(), Value::Integer(2));
        let child = Environment::with_parent(parent);
        child.define("c".to_string(), Value::Integer(3));

        assert!(matches!(child.get("a"), Ok(Value::Integer(1))));
        assert!(matches!(child.get("b"), Ok(Value::Integer(2))));
        assert!(matches!(child.get("c"), Ok(Value::Integer(3))));
    }

    #[test]
    fn set_updates_nearest_existing_binding() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::Integer(1));
        let child = Environment::with_parent(parent.clone());

        child.set("x", Value::Integer(2)).unwrap();

        assert!(matches!(child.get("x"), Ok(Value::Integer(2))));
        assert!(matches!(parent.get("x"), Ok(Value::Integer(2))));
    }

    #[test]
    fn set_on_unbound_name_is_an_error() {
        let env = Environment::new();
        assert!(matches!(env.set("x", Value::Integer(1)), Err(EvalError::UnboundSymbol(_))));
    }
}
