use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::debugger::DebugEvent;

/// Incoming command envelope. Unrecognized fields are ignored.
#[derive(Debug, Deserialize)]
pub struct Request {
    #[serde(rename = "type")]
    pub kind: String,
    pub command: String,
    #[serde(default)]
    pub params: Value,
}

/// Outgoing event envelope; one per line, both responses and notifications.
#[derive(Debug, Serialize)]
pub struct Event {
    #[serde(rename = "type")]
    kind: &'static str,
    pub event: String,
    pub data: Value,
}

impl Event {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            kind: "event",
            event: event.into(),
            data,
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Self::new(
            "error",
            json!({ "code": code, "message": message.into() }),
        )
    }
}

pub fn location_json(location: &crate::interp::Location) -> Value {
    json!({
        "file": location.file.as_ref(),
        "line": location.line,
        "column": location.column,
    })
}

/// Translate an engine notification into its wire event.
pub fn notification(event: &DebugEvent) -> Event {
    match event {
        DebugEvent::Stopped { location, reason } => Event::new(
            "stopped",
            json!({
                "location": location_json(location),
                "reason": reason.as_str(),
            }),
        ),
        DebugEvent::Output { text } => Event::new("output", json!({ "output": text })),
        DebugEvent::Exited { code } => Event::new("exited", json!({ "code": code })),
        DebugEvent::Terminated { reason } => {
            Event::new("terminated", json!({ "reason": reason.as_str() }))
        }
        DebugEvent::RuntimeError { message } => Event::error("EvalError", message.clone()),
    }
}
