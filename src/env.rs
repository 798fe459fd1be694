//! Name environments — the scope chain.
//!
//! An `Environment` is an ordered stack of name→value maps, outermost
//! (global) first. Resolution searches innermost to outermost; assignment
//! updates the nearest scope that already binds the name, or defines the
//! name in the innermost scope. The environment is constructed once at
//! startup and passed by reference through the evaluator.

use std::collections::HashMap;

use crate::builtins;
use crate::value::Value;

/// The scope chain.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Stack of scopes. Last is the current (innermost) scope.
    scopes: Vec<Scope>,
}

/// A single scope.
#[derive(Debug, Clone, Default)]
struct Scope {
    names: HashMap<String, Value>,
}

impl Environment {
    /// An environment with a single empty global scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    /// An environment whose global scope is pre-populated with the
    /// built-in bindings.
    pub fn with_builtins() -> Self {
        let mut env = Self::new();
        builtins::install(&mut env);
        env
    }

    /// Resolve a name, searching innermost to outermost.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.names.get(name))
    }

    /// Assign a name: update the nearest scope that already binds it, or
    /// define it in the innermost scope.
    pub fn assign(&mut self, name: &str, value: Value) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(slot) = scope.names.get_mut(name) {
                *slot = value;
                return;
            }
        }
        self.current_scope_mut()
            .names
            .insert(name.to_string(), value);
    }

    /// Define a name directly in the innermost scope, shadowing any outer
    /// binding.
    pub fn define(&mut self, name: &str, value: Value) {
        self.current_scope_mut()
            .names
            .insert(name.to_string(), value);
    }

    /// Push a new innermost scope for a nested evaluation context.
    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope. The global scope is never popped.
    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn current_scope_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("environment has no scopes")
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::{decode, Backend};

    fn num(raw: &str) -> Value {
        Value::number(decode(raw, Backend::Exact).unwrap())
    }

    #[test]
    fn unset_name_is_none() {
        let env = Environment::new();
        assert!(env.lookup("x").is_none());
    }

    #[test]
    fn assign_and_lookup() {
        let mut env = Environment::new();
        env.assign("x", num("42"));
        assert_eq!(env.lookup("x"), Some(&num("42")));
    }

    #[test]
    fn lookup_searches_outer_scopes() {
        let mut env = Environment::new();
        env.assign("x", num("1"));
        env.push_scope();
        assert_eq!(env.lookup("x"), Some(&num("1")));
        env.pop_scope();
    }

    #[test]
    fn inner_definition_shadows_outer() {
        let mut env = Environment::new();
        env.assign("x", num("1"));
        env.push_scope();
        env.define("x", num("2"));
        assert_eq!(env.lookup("x"), Some(&num("2")));
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(&num("1")));
    }

    #[test]
    fn assign_updates_nearest_existing_binding() {
        let mut env = Environment::new();
        env.assign("x", num("1"));
        env.push_scope();
        env.assign("x", num("2"));
        env.pop_scope();
        // The outer binding was updated in place, not shadowed.
        assert_eq!(env.lookup("x"), Some(&num("2")));
    }

    #[test]
    fn assign_without_binding_defines_innermost() {
        let mut env = Environment::new();
        env.push_scope();
        env.assign("y", num("5"));
        env.pop_scope();
        // The binding lived in the popped scope.
        assert!(env.lookup("y").is_none());
    }

    #[test]
    fn global_scope_never_popped() {
        let mut env = Environment::new();
        env.assign("x", num("1"));
        env.pop_scope();
        assert_eq!(env.lookup("x"), Some(&num("1")));
    }

    #[test]
    fn builtins_installed_in_global_scope() {
        let env = Environment::with_builtins();
        assert!(env.lookup("incr").is_some());
    }
}
