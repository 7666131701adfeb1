use std::fmt;
use std::sync::{Arc, RwLock};

use super::ast::{Location, Stmt};
use super::env::Environment;

/// Rendering of nested values stops at this depth; cycles through list
/// elements or captured environments must not hang the inspector.
const MAX_RENDER_DEPTH: usize = 8;

/// A user-defined EZ function together with its captured environment.
#[derive(Debug)]
pub struct EzFn {
    pub name: String,
    pub params: Vec<String>,
    pub body: Arc<Vec<Stmt>>,
    pub env: Environment,
    pub loc: Location,
}

/// A runtime EZ value. Shared containers are behind `Arc` so values can be
/// held by a paused frame and inspected from the controller thread.
#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Arc<RwLock<Vec<Value>>>),
    Fn(Arc<EzFn>),
}

impl Value {
    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Arc::new(RwLock::new(items)))
    }

    pub fn type_tag(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::List(_) => "list",
            Value::Fn(_) => "fn",
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Bool(b) => *b,
            _ => true,
        }
    }

    fn render(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        if depth > MAX_RENDER_DEPTH {
            return f.write_str("…");
        }
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => f.write_str(s),
            Value::List(items) => {
                // Clone the element handles so nested rendering never
                // re-enters the lock it is iterating under.
                let items = items.read().expect("list lock poisoned").clone();
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    item.render(f, depth + 1)?;
                }
                f.write_str("]")
            }
            Value::Fn(func) => write!(f, "<fn {}>", func.name),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.render(f, 0)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
                *a as f64 == *b
            }
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => {
                if Arc::ptr_eq(a, b) {
                    return true;
                }
                let a = a.read().expect("list lock poisoned");
                let b = b.read().expect("list lock poisoned");
                *a == *b
            }
            (Value::Fn(a), Value::Fn(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tags() {
        assert_eq!(Value::Int(1).type_tag(), "int");
        assert_eq!(Value::Str("a".into()).type_tag(), "string");
        assert_eq!(Value::list(vec![]).type_tag(), "list");
        assert_eq!(Value::Nil.type_tag(), "nil");
    }

    #[test]
    fn display_nested_list() {
        let inner = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let outer = Value::list(vec![inner, Value::Str("x".into())]);
        assert_eq!(outer.to_string(), "[[1, 2], x]");
    }

    #[test]
    fn display_bounds_recursive_list() {
        let list = Value::list(vec![Value::Int(0)]);
        if let Value::List(items) = &list {
            items.write().unwrap().push(list.clone());
        }
        // Must terminate; the cycle renders as an ellipsis at the depth cap.
        assert!(list.to_string().contains('…'));
    }

    #[test]
    fn numeric_equality_crosses_int_and_float() {
        assert_eq!(Value::Int(2), Value::Float(2.0));
        assert_ne!(Value::Int(2), Value::Float(2.5));
    }
}
