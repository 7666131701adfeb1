//! The EZ language front end and tree-walking evaluator.
//!
//! The evaluator's only contract with the debugger is the
//! [`EvalHook`](crate::debugger::hook::EvalHook) surface: one call before
//! every steppable statement and one call at each function entry and exit.

pub mod ast;
pub mod env;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::{Location, Program};
pub use env::Environment;
pub use eval::{Interpreter, OutputFn};
pub use parser::parse;
pub use value::Value;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected character `{ch}` at {line}:{column}")]
    UnexpectedChar { ch: char, line: u32, column: u32 },
    #[error("unterminated string literal at {line}:{column}")]
    UnterminatedString { line: u32, column: u32 },
    #[error("invalid number `{text}` at {line}:{column}")]
    BadNumber {
        text: String,
        line: u32,
        column: u32,
    },
    #[error("expected {expected}, found {found} at {line}:{column}")]
    Unexpected {
        expected: String,
        found: String,
        line: u32,
        column: u32,
    },
    #[error("invalid assignment target at {line}:{column}")]
    BadAssignTarget { line: u32, column: u32 },
}

#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("{loc}: undefined variable `{name}`")]
    Undefined { name: String, loc: Location },
    #[error("{loc}: type mismatch: {message}")]
    TypeMismatch { message: String, loc: Location },
    #[error("{loc}: value of type `{ty}` is not callable")]
    NotCallable { ty: &'static str, loc: Location },
    #[error("{loc}: `{name}` expects {expected} argument(s), got {got}")]
    Arity {
        name: String,
        expected: usize,
        got: usize,
        loc: Location,
    },
    #[error("{loc}: division by zero")]
    DivisionByZero { loc: Location },
    #[error("{loc}: index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        index: i64,
        len: usize,
        loc: Location,
    },
    #[error("{loc}: call depth limit exceeded")]
    CallDepth { loc: Location },
    #[error("{loc}: `{keyword}` outside of a loop")]
    StrayLoopControl {
        keyword: &'static str,
        loc: Location,
    },
    /// Distinguished cancellation raised by the debugger: the evaluator
    /// unwinds to the top without further side effects.
    #[error("execution interrupted")]
    Interrupted,
}

impl EvalError {
    pub fn is_interrupted(&self) -> bool {
        matches!(self, EvalError::Interrupted)
    }
}
