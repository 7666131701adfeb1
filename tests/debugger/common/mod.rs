use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use ezdbg::debugger::{
    spawn_debugee, DebugEvent, DebugSession, StepMode, StopReason, TerminateReason,
};
use ezdbg::interp::{self, Location};

pub const TIMEOUT: Duration = Duration::from_secs(5);

/// A program running on its own thread behind a debug session.
pub struct Debugee {
    pub session: Arc<DebugSession>,
    pub events: Receiver<DebugEvent>,
    pub handle: Option<JoinHandle<()>>,
}

/// Launch `src` paused at the first statement, like the console does.
pub fn start_paused(file: &str, src: &str) -> Debugee {
    launch(file, src, &[], StepMode::StepInto)
}

/// Launch `src` running free with breakpoints pre-set on `lines` of `file`.
pub fn start_running(file: &str, src: &str, lines: &[u32]) -> Debugee {
    launch(file, src, lines, StepMode::Continue)
}

fn launch(file: &str, src: &str, lines: &[u32], mode: StepMode) -> Debugee {
    let program = interp::parse(file, src).expect("test program must parse");
    let (session, events) = DebugSession::new();
    session.enable();
    for line in lines {
        session.set_breakpoint(file, *line);
    }
    session.set_step_mode(mode);
    let handle = spawn_debugee(session.clone(), program);
    Debugee {
        session,
        events,
        handle: Some(handle),
    }
}

impl Debugee {
    /// Wait for the debugee's thread to finish.
    pub fn join(&mut self) {
        self.handle.take().expect("already joined").join().unwrap();
    }

    /// Next `stopped` event; program output in between is allowed.
    pub fn expect_stopped(&self) -> (Location, StopReason) {
        loop {
            match self
                .events
                .recv_timeout(TIMEOUT)
                .expect("expected a stopped event")
            {
                DebugEvent::Stopped { location, reason } => return (location, reason),
                DebugEvent::Output { .. } => continue,
                other => panic!("expected stopped, got {other:?}"),
            }
        }
    }

    /// Next `output` event.
    pub fn expect_output(&self) -> String {
        match self
            .events
            .recv_timeout(TIMEOUT)
            .expect("expected an output event")
        {
            DebugEvent::Output { text } => text,
            other => panic!("expected output, got {other:?}"),
        }
    }

    /// Next `exited` event; program output in between is allowed.
    pub fn expect_exited(&self, code: i32) {
        loop {
            match self
                .events
                .recv_timeout(TIMEOUT)
                .expect("expected an exited event")
            {
                DebugEvent::Exited { code: actual } => {
                    assert_eq!(actual, code);
                    return;
                }
                DebugEvent::Output { .. } => continue,
                other => panic!("expected exited, got {other:?}"),
            }
        }
    }

    pub fn expect_terminated(&self) -> TerminateReason {
        loop {
            match self
                .events
                .recv_timeout(TIMEOUT)
                .expect("expected a terminated event")
            {
                DebugEvent::Terminated { reason } => return reason,
                DebugEvent::Output { .. } => continue,
                other => panic!("expected terminated, got {other:?}"),
            }
        }
    }
}

pub fn assert_at(loc: &Location, file: &str, line: u32) {
    assert_eq!(loc.file.as_ref(), file, "paused in the wrong file");
    assert_eq!(loc.line, line, "paused at the wrong line");
}
