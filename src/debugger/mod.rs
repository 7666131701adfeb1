//! The debug control engine.
//!
//! Two threads cooperate through a [`DebugSession`]: the evaluator thread
//! calls the [`hook::EvalHook`] entry points synchronously, the controller
//! thread mutates breakpoints and step mode and signals the rendezvous. One
//! mutex guards all engine state; the rendezvous channel is used only for
//! the pause/resume handshake and is never held across the state lock.

pub mod breakpoint;
pub mod error;
pub mod event;
pub mod frame;
pub mod hook;
pub mod step;
pub mod variable;

pub use breakpoint::Breakpoint;
pub use error::Error;
pub use event::{DebugEvent, StopReason, TerminateReason};
pub use frame::{CallFrame, FrameSnapshot};
pub use step::StepMode;
pub use variable::VariableSnapshot;

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex};
use std::thread;

use crate::interp::ast::{Location, Stmt};
use crate::interp::{Environment, Interpreter, Program};

use self::breakpoint::BreakpointRegistry;
use self::event::EventSink;
use self::hook::{EvalHook, Interrupt};

/// What a parked evaluator is woken with.
enum Resume {
    Go,
    Terminate,
}

struct EngineState {
    enabled: bool,
    terminated: bool,
    step_mode: StepMode,
    /// Frame depth captured when a non-`Continue` mode was set.
    step_depth: usize,
    call_stack: Vec<CallFrame>,
    breakpoints: BreakpointRegistry,
    paused: bool,
}

/// A debug session: engine state, the rendezvous, and the event channel.
///
/// The session doubles as the evaluator's hook implementation; thread it
/// into [`Interpreter`] as `Arc<DebugSession>`.
pub struct DebugSession {
    state: Mutex<EngineState>,
    resume_tx: SyncSender<Resume>,
    /// Receiver end of the rendezvous. Only the evaluator thread ever takes
    /// this lock, and only while parked.
    resume_rx: Mutex<Receiver<Resume>>,
    events: EventSink,
}

impl DebugSession {
    pub fn new() -> (Arc<Self>, Receiver<DebugEvent>) {
        let (events, event_rx) = event::channel();
        let (resume_tx, resume_rx) = mpsc::sync_channel(0);
        let session = Arc::new(Self {
            state: Mutex::new(EngineState {
                enabled: false,
                terminated: false,
                step_mode: StepMode::Continue,
                step_depth: 0,
                call_stack: Vec::new(),
                breakpoints: BreakpointRegistry::default(),
                paused: false,
            }),
            resume_tx,
            resume_rx: Mutex::new(resume_rx),
            events,
        });
        (session, event_rx)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EngineState> {
        self.state.lock().expect("engine state lock poisoned")
    }

    /// Arm the hooks. Until this is called every hook entry is a no-op.
    pub fn enable(&self) {
        self.lock().enabled = true;
    }

    pub fn is_enabled(&self) -> bool {
        self.lock().enabled
    }

    pub fn is_paused(&self) -> bool {
        self.lock().paused
    }

    pub fn is_terminated(&self) -> bool {
        self.lock().terminated
    }

    /// Insert or return the existing breakpoint; never fails.
    pub fn set_breakpoint(&self, file: &str, line: u32) -> Breakpoint {
        self.lock().breakpoints.add(file, line, None)
    }

    /// Returns whether a breakpoint existed at `(file, line)`.
    pub fn clear_breakpoint(&self, file: &str, line: u32) -> bool {
        self.lock().breakpoints.remove(file, line)
    }

    pub fn list_breakpoints(&self) -> Vec<Breakpoint> {
        self.lock().breakpoints.list()
    }

    /// Record the new mode, capture the reference depth, and release the
    /// evaluator if it is parked on the rendezvous.
    pub fn set_step_mode(&self, mode: StepMode) {
        let was_paused = {
            let mut st = self.lock();
            if st.terminated {
                return;
            }
            st.step_mode = mode;
            st.step_depth = st.call_stack.len();
            std::mem::replace(&mut st.paused, false)
        };
        if was_paused {
            // The evaluator is guaranteed to be at `recv`, so this pairs
            // immediately.
            let _ = self.resume_tx.send(Resume::Go);
        }
    }

    pub fn cont(&self) {
        self.set_step_mode(StepMode::Continue);
    }

    /// Snapshot of the call stack, top first. While the debuggee is running
    /// the snapshot may be stale; the flag says so.
    pub fn stack_trace(&self) -> (Vec<FrameSnapshot>, bool) {
        let st = self.lock();
        let frames = st
            .call_stack
            .iter()
            .rev()
            .enumerate()
            .map(|(index, frame)| FrameSnapshot {
                index,
                function_name: frame.function_name.clone(),
                location: frame.location.clone(),
            })
            .collect();
        (frames, !st.paused)
    }

    /// Variables visible from the given frame, innermost scope first with
    /// shadowing applied. `frame_index` is 0 at the top of the stack.
    pub fn variables(&self, frame_index: usize) -> Result<(Vec<VariableSnapshot>, bool), Error> {
        let (env, stale) = {
            let st = self.lock();
            let pos = st
                .call_stack
                .len()
                .checked_sub(1 + frame_index)
                .ok_or(Error::InvalidFrame(frame_index))?;
            (st.call_stack[pos].environment.clone(), !st.paused)
        };
        // The environment chain is walked outside the engine lock.
        Ok((variable::collect(&env), stale))
    }

    /// Resolve one name along the current frame's environment chain.
    pub fn find_variable(&self, name: &str) -> Result<VariableSnapshot, Error> {
        let env = {
            let st = self.lock();
            let frame = st.call_stack.last().ok_or(Error::InvalidFrame(0))?;
            frame.environment.clone()
        };
        variable::find(&env, name).ok_or_else(|| Error::UnknownSymbol(name.to_string()))
    }

    /// End the session. Emits `terminated` exactly once and wakes a parked
    /// evaluator with the cancellation signal.
    pub fn terminate(&self, reason: TerminateReason) {
        let was_paused = {
            let mut st = self.lock();
            if st.terminated {
                return;
            }
            st.terminated = true;
            st.enabled = false;
            std::mem::replace(&mut st.paused, false)
        };
        self.events.send(DebugEvent::Terminated { reason });
        if was_paused {
            let _ = self.resume_tx.send(Resume::Terminate);
        }
    }

    pub fn emit_output(&self, text: &str) {
        self.events.send(DebugEvent::Output {
            text: text.to_string(),
        });
    }

    fn emit_exited(&self, code: i32) {
        self.events.send(DebugEvent::Exited { code });
    }

    fn emit_runtime_error(&self, message: String) {
        self.events.send(DebugEvent::RuntimeError { message });
    }

    /// Hook contract violation: tear the session down as unusable.
    fn abort_internal(&self, message: &str) {
        log::error!(target: "debugger", "hook contract violated: {message}");
        let mut st = self.lock();
        if st.terminated {
            return;
        }
        st.terminated = true;
        st.enabled = false;
        drop(st);
        self.events.send(DebugEvent::Terminated {
            reason: TerminateReason::Internal,
        });
    }
}

impl EvalHook for DebugSession {
    fn before_eval(&self, stmt: &Stmt, env: &Environment) -> Result<(), Interrupt> {
        let (location, reason) = {
            let mut st = self.lock();
            if st.terminated {
                return Err(Interrupt);
            }
            if !st.enabled {
                return Ok(());
            }

            let loc = stmt.loc();
            let depth = st.call_stack.len();
            let (step_mode, step_depth) = (st.step_mode, st.step_depth);
            let hit = st.breakpoints.hit(loc);

            // Keep the top frame current so stack traces taken at the next
            // pause show callers at their call sites.
            if let Some(top) = st.call_stack.last_mut() {
                top.location = loc.clone();
                top.environment = env.clone();
            }

            let reason = if hit {
                StopReason::Breakpoint
            } else if step_mode.should_pause(depth, step_depth) {
                StopReason::Step
            } else {
                return Ok(());
            };

            st.paused = true;
            (loc.clone(), reason)
        };

        // `stopped` reaches the controller before the evaluator parks, so a
        // pause is always observable.
        self.events.send(DebugEvent::Stopped { location, reason });

        let resume = self
            .resume_rx
            .lock()
            .expect("rendezvous lock poisoned")
            .recv();
        match resume {
            Ok(Resume::Go) => Ok(()),
            Ok(Resume::Terminate) | Err(_) => Err(Interrupt),
        }
    }

    fn on_enter_call(
        &self,
        function_name: &str,
        body: &Arc<Vec<Stmt>>,
        env: &Environment,
        loc: &Location,
    ) -> Result<(), Interrupt> {
        let mut st = self.lock();
        if st.terminated {
            return Err(Interrupt);
        }
        if !st.enabled {
            return Ok(());
        }
        let call_depth = st.call_stack.len();
        st.call_stack.push(CallFrame {
            function_name: function_name.to_string(),
            body: body.clone(),
            environment: env.clone(),
            location: loc.clone(),
            call_depth,
        });
        Ok(())
    }

    fn on_leave_call(&self) -> Result<(), Interrupt> {
        let mut st = self.lock();
        if st.terminated {
            return Err(Interrupt);
        }
        if !st.enabled {
            return Ok(());
        }
        if st.call_stack.pop().is_none() {
            drop(st);
            self.abort_internal("leave-call on an empty stack");
            return Err(Interrupt);
        }
        Ok(())
    }
}

/// Run a program on its own thread, reporting completion through the
/// session's event channel.
///
/// A run cancelled by [`DebugSession::terminate`] unwinds silently: the
/// `terminated` event has already been emitted and nothing may follow it.
pub fn spawn_debugee(session: Arc<DebugSession>, program: Program) -> thread::JoinHandle<()> {
    thread::Builder::new()
        .name("ez-debugee".to_string())
        .spawn(move || {
            let output = {
                let session = session.clone();
                Box::new(move |line: &str| session.emit_output(line))
            };
            let hook: Arc<dyn EvalHook> = session.clone();
            let mut interp = Interpreter::new(hook, output);
            match interp.run(&program) {
                Ok(()) => session.emit_exited(0),
                Err(err) if err.is_interrupted() => {}
                Err(err) => {
                    session.emit_runtime_error(err.to_string());
                    session.emit_exited(1);
                }
            }
        })
        .expect("spawn debuggee thread")
}
