//! An interface to the debug engine.
//!
//! Contains commands and corresponding command handlers. A command is a
//! request to the debugger that defines an action and a list of input
//! arguments; transports parse their own syntax into [`Command`] values.

pub mod parser;

use crate::debugger::Error;

#[derive(thiserror::Error, Debug)]
pub enum CommandError {
    #[error("malformed command")]
    Parsing(String),
    #[error(transparent)]
    Handle(#[from] Error),
}

pub type CommandResult<T> = Result<T, CommandError>;

/// A breakpoint addressed the way users write it: `FILE:LINE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BreakpointTarget {
    pub file: String,
    pub line: u32,
}

/// External commands that can be processed by the debugger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    StepInto,
    StepOver,
    StepOut,
    Continue,
    Break(BreakpointTarget),
    Clear(BreakpointTarget),
    BreakpointList,
    Print(String),
    Vars,
    Stack,
    Help { command: Option<String> },
    Quit,
}
