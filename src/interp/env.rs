use indexmap::IndexMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use super::value::Value;

/// A lexical scope in the parent-linked environment chain.
///
/// Environments are shared: closures capture them, call frames hold them, and
/// while the evaluator is paused the controller thread walks them read-only.
#[derive(Clone)]
pub struct Environment {
    scope: Arc<RwLock<Scope>>,
}

struct Scope {
    vars: IndexMap<String, Value>,
    parent: Option<Environment>,
}

impl Environment {
    pub fn global() -> Self {
        Self {
            scope: Arc::new(RwLock::new(Scope {
                vars: IndexMap::new(),
                parent: None,
            })),
        }
    }

    /// New innermost scope enclosed by `self`.
    pub fn child(&self) -> Self {
        Self {
            scope: Arc::new(RwLock::new(Scope {
                vars: IndexMap::new(),
                parent: Some(self.clone()),
            })),
        }
    }

    pub fn parent(&self) -> Option<Environment> {
        self.scope.read().expect("scope lock poisoned").parent.clone()
    }

    /// Declare (or redeclare) a variable in this scope.
    pub fn define(&self, name: &str, value: Value) {
        self.scope
            .write()
            .expect("scope lock poisoned")
            .vars
            .insert(name.to_string(), value);
    }

    /// Assign to an existing variable somewhere along the chain.
    /// Returns false when no scope declares `name`.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let parent = {
            let mut scope = self.scope.write().expect("scope lock poisoned");
            if let Some(slot) = scope.vars.get_mut(name) {
                *slot = value;
                return true;
            }
            scope.parent.clone()
        };
        match parent {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    /// Look `name` up along the chain, innermost scope first.
    pub fn get(&self, name: &str) -> Option<Value> {
        let parent = {
            let scope = self.scope.read().expect("scope lock poisoned");
            if let Some(value) = scope.vars.get(name) {
                return Some(value.clone());
            }
            scope.parent.clone()
        };
        parent.and_then(|parent| parent.get(name))
    }

    /// Snapshot of this scope's own bindings, in declaration order.
    pub fn own_bindings(&self) -> Vec<(String, Value)> {
        self.scope
            .read()
            .expect("scope lock poisoned")
            .vars
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Environment")
    }
}
