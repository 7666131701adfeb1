use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

use crate::interp::Location;

/// Why the debuggee stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Breakpoint,
    Step,
}

impl StopReason {
    pub fn as_str(self) -> &'static str {
        match self {
            StopReason::Breakpoint => "breakpoint",
            StopReason::Step => "step",
        }
    }
}

/// Why the session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminateReason {
    /// The controller asked for it.
    User,
    /// A hook contract violation; the session is unusable.
    Internal,
}

impl TerminateReason {
    pub fn as_str(self) -> &'static str {
        match self {
            TerminateReason::User => "user",
            TerminateReason::Internal => "internal",
        }
    }
}

/// Engine-to-controller notifications. Emission order is total; `stopped`
/// always reaches the channel before the evaluator parks on the rendezvous.
#[derive(Debug, Clone, PartialEq)]
pub enum DebugEvent {
    Stopped {
        location: Location,
        reason: StopReason,
    },
    Output {
        text: String,
    },
    Exited {
        code: i32,
    },
    Terminated {
        reason: TerminateReason,
    },
    RuntimeError {
        message: String,
    },
}

/// Backpressure bound: a stalled controller eventually blocks the evaluator
/// instead of buffering events without limit.
const EVENT_QUEUE_CAP: usize = 256;

#[derive(Clone)]
pub struct EventSink {
    tx: SyncSender<DebugEvent>,
}

impl EventSink {
    pub fn send(&self, event: DebugEvent) {
        // A dropped receiver means the controller is gone and the session is
        // winding down; losing the event is the intended outcome.
        if self.tx.send(event).is_err() {
            log::debug!(target: "debugger", "event dropped: controller disconnected");
        }
    }
}

pub fn channel() -> (EventSink, Receiver<DebugEvent>) {
    let (tx, rx) = sync_channel(EVENT_QUEUE_CAP);
    (EventSink { tx }, rx)
}
