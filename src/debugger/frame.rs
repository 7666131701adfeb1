use std::sync::Arc;

use crate::interp::ast::{Location, Stmt};
use crate::interp::Environment;

/// One active call. Created on function entry, destroyed on return; the
/// environment outlives the frame through any closures that captured it.
#[derive(Debug, Clone)]
pub struct CallFrame {
    pub function_name: String,
    /// The callee's body; kept so a frame stays self-describing.
    pub body: Arc<Vec<Stmt>>,
    /// Innermost scope the frame is currently executing in.
    pub environment: Environment,
    /// Statement the frame last reached.
    pub location: Location,
    /// Index from the bottom of the stack, 0 for the program root.
    pub call_depth: usize,
}

/// Controller-facing view of one frame. Index 0 is the top of the stack.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    pub index: usize,
    pub function_name: String,
    pub location: Location,
}
