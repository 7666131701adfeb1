use crate::common::{assert_at, start_running};
use ezdbg::debugger::{DebugSession, StopReason};

const LINES_APP: &str = "\
var a = 1;
var b = 2;
var c = a + b;
print(c);
var d = c * 2;";

#[test]
fn test_breakpoint_hit() {
    let mut debugee = start_running("main.ez", LINES_APP, &[3]);

    let (loc, reason) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 3);
    assert_eq!(loc.column, 1);
    assert_eq!(reason, StopReason::Breakpoint);

    debugee.session.cont();
    assert_eq!(debugee.expect_output(), "3");
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_breakpoint_repeat_hits_and_clear() {
    let src = "\
var i = 0;
while i < 3 {
  i = i + 1;
}
print(i);";
    let mut debugee = start_running("loop.ez", src, &[3]);

    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "loop.ez", 3);

    debugee.session.cont();
    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "loop.ez", 3);

    assert!(debugee.session.clear_breakpoint("loop.ez", 3));
    debugee.session.cont();
    assert_eq!(debugee.expect_output(), "3");
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_breakpoint_on_non_steppable_line_never_triggers() {
    let src = "\
var a = 1;
# nothing executable here
var b = a + 1;";
    let mut debugee = start_running("main.ez", src, &[2]);

    // No stop: the program runs straight to completion.
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_set_list_clear_roundtrip() {
    let (session, _events) = DebugSession::new();

    session.set_breakpoint("app.ez", 7);
    session.set_breakpoint("app.ez", 7);
    session.set_breakpoint("lib.ez", 2);

    let listed = session.list_breakpoints();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().any(|bp| bp.file == "app.ez" && bp.line == 7));
    assert!(listed.iter().any(|bp| bp.file == "lib.ez" && bp.line == 2));

    assert!(session.clear_breakpoint("app.ez", 7));
    assert!(!session.clear_breakpoint("app.ez", 7));
    assert!(!session.clear_breakpoint("nowhere.ez", 1));

    let listed = session.list_breakpoints();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].file, "lib.ez");
}

#[test]
fn test_breakpoint_matches_by_basename() {
    let program = ezdbg::interp::parse("main.ez", LINES_APP).unwrap();
    let (session, events) = DebugSession::new();
    session.enable();
    // Set through a path form; locations carry the basename.
    session.set_breakpoint("src/main.ez", 2);
    let handle = ezdbg::debugger::spawn_debugee(session.clone(), program);

    let mut debugee = crate::common::Debugee {
        session,
        events,
        handle: Some(handle),
    };
    let (loc, reason) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 2);
    assert_eq!(reason, StopReason::Breakpoint);

    debugee.session.cont();
    debugee.expect_exited(0);
    debugee.join();
}
