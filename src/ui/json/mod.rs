//! Line-delimited JSON frontend over arbitrary byte streams (stdio in
//! production, in-memory pipes in tests).
//!
//! One reader thread turns transport lines into inputs, a pump thread
//! forwards engine events, and the single controller thread owns the writer,
//! which keeps all output totally ordered.

pub mod protocol;

use std::io::{BufRead, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use serde_json::{json, Value};

use crate::debugger::{spawn_debugee, DebugEvent, DebugSession, Error, StepMode, TerminateReason};
use crate::interp::Program;

use self::protocol::{notification, Event, Request};

enum Input {
    Line(String),
    Notification(DebugEvent),
    Eof,
}

pub struct JsonServer<W: Write> {
    session: Arc<DebugSession>,
    writer: W,
    program: Program,
    initialized: bool,
    debugee: Option<thread::JoinHandle<()>>,
}

/// Serve one debug session over `reader`/`writer` until `terminate` or end
/// of input. Returns an error only on transport failure (protocol fatal).
pub fn serve<R, W>(reader: R, writer: W, program: Program) -> anyhow::Result<()>
where
    R: BufRead + Send + 'static,
    W: Write,
{
    let (session, event_rx) = DebugSession::new();
    let (input_tx, input_rx) = mpsc::channel();

    spawn_reader(reader, input_tx.clone());
    spawn_event_pump(event_rx, input_tx);

    let server = JsonServer {
        session,
        writer,
        program,
        initialized: false,
        debugee: None,
    };
    server.run(input_rx)
}

fn spawn_reader<R: BufRead + Send + 'static>(reader: R, tx: Sender<Input>) {
    thread::Builder::new()
        .name("ez-transport-read".to_string())
        .spawn(move || {
            for line in reader.lines() {
                let input = match line {
                    Ok(line) => Input::Line(line),
                    Err(err) => {
                        log::warn!(target: "server", "transport read failed: {err:#}");
                        break;
                    }
                };
                if tx.send(input).is_err() {
                    return;
                }
            }
            let _ = tx.send(Input::Eof);
        })
        .expect("spawn transport reader");
}

fn spawn_event_pump(event_rx: Receiver<DebugEvent>, tx: Sender<Input>) {
    thread::Builder::new()
        .name("ez-event-pump".to_string())
        .spawn(move || {
            for event in event_rx {
                if tx.send(Input::Notification(event)).is_err() {
                    return;
                }
            }
        })
        .expect("spawn event pump");
}

impl<W: Write> JsonServer<W> {
    fn run(mut self, input_rx: Receiver<Input>) -> anyhow::Result<()> {
        while let Ok(input) = input_rx.recv() {
            match input {
                Input::Line(line) => self.handle_line(&line)?,
                Input::Notification(event) => {
                    let terminated = matches!(event, DebugEvent::Terminated { .. });
                    self.write_event(notification(&event))?;
                    if terminated {
                        break;
                    }
                }
                Input::Eof => {
                    // Transport gone: end the session cleanly. The loop
                    // closes when the `terminated` notification flows back
                    // through the pump.
                    self.session.terminate(TerminateReason::User);
                }
            }
        }

        if let Some(debugee) = self.debugee.take() {
            let _ = debugee.join();
        }
        Ok(())
    }

    fn handle_line(&mut self, line: &str) -> anyhow::Result<()> {
        if line.trim().is_empty() {
            return Ok(());
        }
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                log::debug!(target: "server", "malformed request: {err}");
                return self.write_event(Event::error("BadRequest", "malformed JSON line"));
            }
        };
        if request.kind != "command" {
            return self.write_event(Event::error(
                "BadRequest",
                format!("unsupported message type `{}`", request.kind),
            ));
        }

        log::debug!(target: "server", "command: {}", request.command);
        self.dispatch(&request)
    }

    fn dispatch(&mut self, request: &Request) -> anyhow::Result<()> {
        match request.command.as_str() {
            "initialize" => {
                self.initialized = true;
                self.session.enable();
                self.write_event(Event::new(
                    "initialized",
                    json!({ "file": self.program.file.as_ref() }),
                ))
            }
            "start" => self.handle_start(),
            "stepInto" => {
                self.session.set_step_mode(StepMode::StepInto);
                Ok(())
            }
            "stepOver" => {
                self.session.set_step_mode(StepMode::StepOver);
                Ok(())
            }
            "stepOut" => {
                self.session.set_step_mode(StepMode::StepOut);
                Ok(())
            }
            "continue" => {
                self.session.cont();
                Ok(())
            }
            "setBreakpoint" => match breakpoint_params(&request.params) {
                Ok((file, line)) => {
                    let bp = self.session.set_breakpoint(&file, line);
                    self.write_event(Event::new(
                        "breakpointSet",
                        json!({ "file": bp.file, "line": bp.line }),
                    ))
                }
                Err(error) => self.write_error(error),
            },
            "clearBreakpoint" => match breakpoint_params(&request.params) {
                Ok((file, line)) => {
                    self.session.clear_breakpoint(&file, line);
                    self.write_event(Event::new(
                        "breakpointCleared",
                        json!({ "file": file, "line": line }),
                    ))
                }
                Err(error) => self.write_error(error),
            },
            "listBreakpoints" => {
                let breakpoints: Vec<Value> = self
                    .session
                    .list_breakpoints()
                    .into_iter()
                    .map(|bp| json!({ "file": bp.file, "line": bp.line, "enabled": bp.enabled }))
                    .collect();
                self.write_event(Event::new(
                    "breakpoints",
                    json!({ "breakpoints": breakpoints }),
                ))
            }
            "getVariables" => self.handle_get_variables(&request.params),
            "getStackTrace" => self.handle_get_stack_trace(),
            "terminate" => {
                // The `terminated` notification arrives through the event
                // pump and closes the loop.
                self.session.terminate(TerminateReason::User);
                Ok(())
            }
            other => self.write_error(Error::BadRequest(format!("unknown command `{other}`"))),
        }
    }

    fn handle_start(&mut self) -> anyhow::Result<()> {
        if !self.initialized {
            return self.write_error(Error::BadRequest(
                "`start` before `initialize`".to_string(),
            ));
        }
        if self.debugee.is_some() {
            return self.write_error(Error::BadRequest("debuggee already started".to_string()));
        }
        // Stop at entry unless the controller already placed breakpoints, in
        // which case run straight to the first one.
        let mode = if self.session.list_breakpoints().is_empty() {
            StepMode::StepInto
        } else {
            StepMode::Continue
        };
        self.session.set_step_mode(mode);
        self.debugee = Some(spawn_debugee(self.session.clone(), self.program.clone()));
        self.write_event(Event::new("started", json!({})))
    }

    fn handle_get_variables(&mut self, params: &Value) -> anyhow::Result<()> {
        let frame_index = params
            .get("frameIndex")
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize;
        match self.session.variables(frame_index) {
            Ok((variables, stale)) => {
                let variables: Vec<Value> = variables
                    .into_iter()
                    .map(|v| json!({ "name": v.name, "value": v.value, "type": v.type_tag }))
                    .collect();
                let mut data = json!({ "variables": variables });
                if stale {
                    data["stale"] = Value::Bool(true);
                }
                self.write_event(Event::new("variables", data))
            }
            Err(error) => self.write_error(error),
        }
    }

    fn handle_get_stack_trace(&mut self) -> anyhow::Result<()> {
        let (frames, stale) = self.session.stack_trace();
        let frames: Vec<Value> = frames
            .into_iter()
            .map(|f| {
                json!({
                    "index": f.index,
                    "functionName": f.function_name,
                    "file": f.location.file.as_ref(),
                    "line": f.location.line,
                    "column": f.location.column,
                })
            })
            .collect();
        let mut data = json!({ "frames": frames });
        if stale {
            data["stale"] = Value::Bool(true);
        }
        self.write_event(Event::new("stackTrace", data))
    }

    fn write_error(&mut self, error: Error) -> anyhow::Result<()> {
        self.write_event(Event::error(error.code(), error.to_string()))
    }

    fn write_event(&mut self, event: Event) -> anyhow::Result<()> {
        let line = serde_json::to_string(&event)?;
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }
}

fn breakpoint_params(params: &Value) -> Result<(String, u32), Error> {
    let file = params
        .get("file")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::BadRequest("missing string param `file`".to_string()))?;
    let line = params
        .get("line")
        .and_then(Value::as_u64)
        .ok_or_else(|| Error::BadRequest("missing integer param `line`".to_string()))?;
    Ok((file.to_string(), line as u32))
}
