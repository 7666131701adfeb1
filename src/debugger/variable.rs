use indexmap::IndexMap;

use crate::interp::{Environment, Value};

/// Rendered view of one binding: display value plus type tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableSnapshot {
    pub name: String,
    pub value: String,
    pub type_tag: &'static str,
}

impl VariableSnapshot {
    fn new(name: String, value: &Value) -> Self {
        Self {
            name,
            value: value.to_string(),
            type_tag: value.type_tag(),
        }
    }
}

/// Walk `env` and all enclosing scopes, innermost first, deduplicating by
/// name so inner bindings shadow outer ones. Read-only: inspection never
/// mutates the chain.
pub fn collect(env: &Environment) -> Vec<VariableSnapshot> {
    let mut seen: IndexMap<String, VariableSnapshot> = IndexMap::new();
    let mut cursor = Some(env.clone());
    while let Some(env) = cursor {
        for (name, value) in env.own_bindings() {
            if !seen.contains_key(&name) {
                let snapshot = VariableSnapshot::new(name.clone(), &value);
                seen.insert(name, snapshot);
            }
        }
        cursor = env.parent();
    }
    seen.into_values().collect()
}

/// Look a single name up along the chain.
pub fn find(env: &Environment, name: &str) -> Option<VariableSnapshot> {
    env.get(name)
        .map(|value| VariableSnapshot::new(name.to_string(), &value))
}
