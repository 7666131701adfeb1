use crate::common::{assert_at, start_paused};
use ezdbg::debugger::{StepMode, StopReason};

const CALL_APP: &str = "\
var a = 1;
var b = double(a);
print(b);

fn double(x) {
  return x * 2;
}";

const RECURSION_APP: &str = "\
var r = fact(3);
print(r);

fn fact(n) {
  var result = 1;
  if n > 1 {
    result = n * fact(n - 1);
  }
  return result;
}";

#[test]
fn test_step_into() {
    let mut debugee = start_paused("main.ez", CALL_APP);

    let (loc, reason) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 1);
    assert_eq!(reason, StopReason::Step);

    debugee.session.set_step_mode(StepMode::StepInto);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 2);

    // Into the callee body.
    debugee.session.set_step_mode(StepMode::StepInto);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 6);

    let (frames, stale) = debugee.session.stack_trace();
    assert!(!stale);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].function_name, "double");
    assert_eq!(frames[1].function_name, "<program>");
    // The caller frame shows the call site.
    assert_eq!(frames[1].location.line, 2);

    // Out of the callee, back at the next caller statement.
    debugee.session.set_step_mode(StepMode::StepOut);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 3);

    debugee.session.cont();
    assert_eq!(debugee.expect_output(), "2");
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_step_over_skips_the_callee() {
    let mut debugee = start_paused("main.ez", CALL_APP);

    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 1);

    debugee.session.set_step_mode(StepMode::StepOver);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 2);

    // The call on line 2 runs to completion without a pause inside it.
    debugee.session.set_step_mode(StepMode::StepOver);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 3);

    debugee.session.cont();
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_step_semantics_through_recursion() {
    let mut debugee = start_paused("main.ez", RECURSION_APP);

    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 1);

    // Into fact(3).
    debugee.session.set_step_mode(StepMode::StepInto);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 5);
    assert_eq!(debugee.session.stack_trace().0.len(), 2);

    debugee.session.set_step_mode(StepMode::StepInto);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 6);

    debugee.session.set_step_mode(StepMode::StepInto);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 7);

    // Into fact(2).
    debugee.session.set_step_mode(StepMode::StepInto);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 5);
    let (frames, _) = debugee.session.stack_trace();
    assert_eq!(frames.len(), 3);
    assert_eq!(frames[0].function_name, "fact");
    assert_eq!(frames[1].function_name, "fact");

    // Out of fact(2): next pause must be strictly shallower.
    let depth_before = frames.len();
    debugee.session.set_step_mode(StepMode::StepOut);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 9);
    let (frames, _) = debugee.session.stack_trace();
    assert!(frames.len() < depth_before);

    // Over the return of fact(3): back at the top level.
    debugee.session.set_step_mode(StepMode::StepOver);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 2);
    assert_eq!(debugee.session.stack_trace().0.len(), 1);

    debugee.session.cont();
    assert_eq!(debugee.expect_output(), "6");
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_step_over_at_the_last_statement_exits() {
    let mut debugee = start_paused("main.ez", "var only = 1;");

    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 1);

    debugee.session.set_step_mode(StepMode::StepOver);
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_breakpoint_wins_over_step_mode() {
    // Stepping over a call still pauses on a breakpoint inside it.
    let mut debugee = start_paused("main.ez", CALL_APP);
    debugee.session.set_breakpoint("main.ez", 6);

    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 1);

    debugee.session.set_step_mode(StepMode::StepOver);
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 2);

    debugee.session.set_step_mode(StepMode::StepOver);
    let (loc, reason) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 6);
    assert_eq!(reason, StopReason::Breakpoint);

    debugee.session.cont();
    assert_eq!(debugee.expect_output(), "2");
    debugee.expect_exited(0);
    debugee.join();
}
