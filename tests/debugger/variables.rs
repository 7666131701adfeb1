use crate::common::{assert_at, start_running};
use ezdbg::debugger::Error;

#[test]
fn test_variables_across_scopes() {
    let src = "\
var x = 10;
if true {
  var y = 20;
  print(x + y);
}";
    let mut debugee = start_running("main.ez", src, &[4]);

    let (loc, _) = debugee.expect_stopped();
    assert_at(&loc, "main.ez", 4);

    let (vars, stale) = debugee.session.variables(0).unwrap();
    assert!(!stale);
    let x = vars.iter().find(|v| v.name == "x").unwrap();
    assert_eq!((x.value.as_str(), x.type_tag), ("10", "int"));
    let y = vars.iter().find(|v| v.name == "y").unwrap();
    assert_eq!((y.value.as_str(), y.type_tag), ("20", "int"));

    debugee.session.cont();
    assert_eq!(debugee.expect_output(), "30");
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_inner_scope_shadows_outer() {
    let src = "\
var x = 1;
if true {
  var x = 2;
  print(x);
}";
    let mut debugee = start_running("main.ez", src, &[4]);

    debugee.expect_stopped();
    let (vars, _) = debugee.session.variables(0).unwrap();
    let xs: Vec<_> = vars.iter().filter(|v| v.name == "x").collect();
    assert_eq!(xs.len(), 1);
    assert_eq!(xs[0].value, "2");

    debugee.session.cont();
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_variables_per_frame_and_invalid_frame() {
    let src = "\
var outer = 1;
report(outer + 1);

fn report(value) {
  var doubled = value * 2;
  print(doubled);
}";
    let mut debugee = start_running("main.ez", src, &[6]);

    debugee.expect_stopped();

    // Frame 0: the callee's locals and parameters.
    let (vars, _) = debugee.session.variables(0).unwrap();
    assert!(vars.iter().any(|v| v.name == "value" && v.value == "2"));
    assert!(vars.iter().any(|v| v.name == "doubled" && v.value == "4"));

    // Frame 1: the program root.
    let (vars, _) = debugee.session.variables(1).unwrap();
    assert!(vars.iter().any(|v| v.name == "outer" && v.value == "1"));

    // One past the last frame fails.
    let (frames, _) = debugee.session.stack_trace();
    assert!(matches!(
        debugee.session.variables(frames.len()),
        Err(Error::InvalidFrame(_))
    ));

    debugee.session.cont();
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_find_variable_walks_the_chain() {
    let src = "\
var x = 10;
if true {
  var y = 20;
  print(y);
}";
    let mut debugee = start_running("main.ez", src, &[4]);

    debugee.expect_stopped();

    let x = debugee.session.find_variable("x").unwrap();
    assert_eq!((x.value.as_str(), x.type_tag), ("10", "int"));
    assert!(matches!(
        debugee.session.find_variable("ghost"),
        Err(Error::UnknownSymbol(_))
    ));

    debugee.session.cont();
    debugee.expect_exited(0);
    debugee.join();
}

#[test]
fn test_type_tags_in_snapshots() {
    let src = "\
var i = 42;
var f = 2.5;
var s = \"hi\";
var b = true;
var l = [1, \"two\"];
var n = nil;
print(i);";
    let mut debugee = start_running("main.ez", src, &[7]);

    debugee.expect_stopped();
    let (vars, _) = debugee.session.variables(0).unwrap();
    let tag = |name: &str| {
        vars.iter()
            .find(|v| v.name == name)
            .unwrap_or_else(|| panic!("missing variable `{name}`"))
            .type_tag
    };
    assert_eq!(tag("i"), "int");
    assert_eq!(tag("f"), "float");
    assert_eq!(tag("s"), "string");
    assert_eq!(tag("b"), "bool");
    assert_eq!(tag("l"), "list");
    assert_eq!(tag("n"), "nil");

    let l = vars.iter().find(|v| v.name == "l").unwrap();
    assert_eq!(l.value, "[1, two]");

    debugee.session.cont();
    debugee.expect_exited(0);
    debugee.join();
}
