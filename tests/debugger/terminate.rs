use std::sync::mpsc::RecvTimeoutError;
use std::time::Duration;

use crate::common::{assert_at, start_paused, start_running};
use ezdbg::debugger::hook::EvalHook;
use ezdbg::debugger::{DebugSession, Error, StepMode, TerminateReason};

#[test]
fn test_terminate_while_paused() {
    let mut debugee = start_paused("main.ez", "var a = 1;\nvar b = 2;\nprint(a + b);");

    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 1);

    debugee.session.terminate(TerminateReason::User);
    assert_eq!(debugee.expect_terminated(), TerminateReason::User);

    // The evaluator unwinds promptly and nothing follows `terminated`.
    debugee.join();
    assert_eq!(
        debugee.events.recv_timeout(Duration::from_millis(100)),
        Err(RecvTimeoutError::Timeout)
    );
}

#[test]
fn test_terminate_while_running() {
    // No breakpoints and an infinite loop: the only way out is terminate.
    let src = "\
var i = 0;
loop {
  i = i + 1;
}";
    let mut debugee = start_running("spin.ez", src, &[]);

    debugee.session.terminate(TerminateReason::User);
    assert_eq!(debugee.expect_terminated(), TerminateReason::User);
    debugee.join();
}

#[test]
fn test_terminate_is_idempotent() {
    let mut debugee = start_paused("main.ez", "var a = 1;");
    debugee.expect_stopped();

    debugee.session.terminate(TerminateReason::User);
    debugee.session.terminate(TerminateReason::User);
    assert_eq!(debugee.expect_terminated(), TerminateReason::User);

    debugee.join();
    assert_eq!(
        debugee.events.recv_timeout(Duration::from_millis(100)),
        Err(RecvTimeoutError::Timeout)
    );
}

#[test]
fn test_leave_on_empty_stack_aborts_the_session() {
    let (session, events) = DebugSession::new();
    session.enable();

    assert!(session.on_leave_call().is_err());
    match events.recv_timeout(Duration::from_secs(1)).unwrap() {
        ezdbg::debugger::DebugEvent::Terminated { reason } => {
            assert_eq!(reason, TerminateReason::Internal);
        }
        other => panic!("expected terminated, got {other:?}"),
    }
    assert!(session.is_terminated());
}

#[test]
fn test_session_stays_serviceable_after_exit() {
    let mut debugee = start_paused("main.ez", "var a = 1;");
    debugee.expect_stopped();

    debugee.session.cont();
    debugee.expect_exited(0);
    debugee.join();

    // Control commands still succeed, inspection reports the empty stack.
    debugee.session.set_step_mode(StepMode::StepInto);
    let (frames, stale) = debugee.session.stack_trace();
    assert!(frames.is_empty());
    assert!(stale);
    assert!(matches!(
        debugee.session.variables(0),
        Err(Error::InvalidFrame(0))
    ));

    debugee.session.terminate(TerminateReason::User);
    assert_eq!(debugee.expect_terminated(), TerminateReason::User);
}

#[test]
fn test_runtime_error_surfaces_and_session_survives() {
    let mut debugee = start_paused("main.ez", "var a = 1;\nvar b = a / 0;");

    debugee.expect_stopped();
    debugee.session.cont();

    match debugee
        .events
        .recv_timeout(Duration::from_secs(5))
        .expect("expected a runtime error event")
    {
        ezdbg::debugger::DebugEvent::RuntimeError { message } => {
            assert!(message.contains("division by zero"), "got: {message}");
        }
        other => panic!("expected a runtime error, got {other:?}"),
    }
    debugee.expect_exited(1);
    debugee.join();

    // The engine still answers after the evaluator died.
    debugee.session.terminate(TerminateReason::User);
    assert_eq!(debugee.expect_terminated(), TerminateReason::User);
}
