use std::sync::Arc;

use crate::interp::ast::{Location, Stmt};
use crate::interp::Environment;

/// Signal that the session is being torn down. The evaluator converts it
/// into its distinguished cancellation error and unwinds without further
/// side effects.
#[derive(Debug, Clone, Copy)]
pub struct Interrupt;

/// The contract between the evaluator and the debugger.
///
/// The evaluator consults the hook synchronously: `before_eval` immediately
/// before every steppable statement (it may block the calling thread),
/// `on_enter_call`/`on_leave_call` in strict pairs around every function
/// call, including error exits.
pub trait EvalHook: Send + Sync {
    fn before_eval(&self, stmt: &Stmt, env: &Environment) -> Result<(), Interrupt>;

    fn on_enter_call(
        &self,
        function_name: &str,
        body: &Arc<Vec<Stmt>>,
        env: &Environment,
        loc: &Location,
    ) -> Result<(), Interrupt>;

    fn on_leave_call(&self) -> Result<(), Interrupt>;
}

/// Hook for undebugged runs. Every entry point returns immediately, so the
/// hot path costs one virtual call per steppable node.
pub struct NopHook;

impl EvalHook for NopHook {
    fn before_eval(&self, _: &Stmt, _: &Environment) -> Result<(), Interrupt> {
        Ok(())
    }

    fn on_enter_call(
        &self,
        _: &str,
        _: &Arc<Vec<Stmt>>,
        _: &Environment,
        _: &Location,
    ) -> Result<(), Interrupt> {
        Ok(())
    }

    fn on_leave_call(&self) -> Result<(), Interrupt> {
        Ok(())
    }
}
