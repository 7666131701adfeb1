//! Debugger-first interpreter for the EZ language.
//!
//! [`interp`] is the language front end and tree-walking evaluator,
//! [`debugger`] the control engine the evaluator reports into, and [`ui`]
//! the two controllers (interactive console, line-JSON server).

pub mod debugger;
pub mod interp;
pub mod log;
pub mod ui;
