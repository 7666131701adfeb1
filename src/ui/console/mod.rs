//! Interactive console frontend: a rustyline REPL bound to the debug engine.
//!
//! Engine events are printed asynchronously through the editor's external
//! printer by a drain thread while the main thread owns the prompt.

pub mod editor;
pub mod print;

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::thread;

use rustyline::error::ReadlineError;

use crate::debugger::{
    spawn_debugee, DebugEvent, DebugSession, Error, StepMode, TerminateReason,
};
use crate::interp::Program;
use crate::ui::command::{Command, CommandError};
use crate::ui::console::editor::create_editor;
use crate::ui::console::print::style::{ErrorView, FilePathView, ImportantView, KeywordView};
use crate::ui::console::print::ExternalPrinter;

const PROMT: &str = "(ez) ";
const WELCOME_TEXT: &str = "ezdbg greets. Type \"help\" for commands.";

const HELP: &str = "\
step|s              step to the next statement, entering calls
next|n              step to the next statement, skipping over calls
out|o               run until the current function returns
continue|c          run until the next breakpoint
break|b FILE:LINE   set a breakpoint
clear FILE:LINE     remove a breakpoint
breakpoints|bp      list breakpoints
print|p NAME        print one variable from the current frame
vars|v              print all variables visible from the current frame
stack|st            print the call stack
help|h              this text
quit|q              terminate the session and exit";

pub struct ConsoleApplication {
    session: Arc<DebugSession>,
    event_rx: Receiver<DebugEvent>,
    program: Program,
}

impl ConsoleApplication {
    pub fn new(session: Arc<DebugSession>, event_rx: Receiver<DebugEvent>, program: Program) -> Self {
        Self {
            session,
            event_rx,
            program,
        }
    }

    pub fn run(self) -> anyhow::Result<()> {
        let logger = env_logger::Logger::from_default_env();
        let filter = logger.filter();
        crate::log::LOGGER_SWITCHER.switch(logger, filter);

        let mut editor = create_editor(PROMT)?;
        let printer = ExternalPrinter::new_for_editor(&mut editor)?;
        let event_printer = ExternalPrinter::new_for_editor(&mut editor)?;

        let event_rx = self.event_rx;
        let drain = thread::spawn(move || {
            for event in event_rx {
                print_event(&event_printer, &event);
            }
        });

        println!("{WELCOME_TEXT}");

        // The session starts paused at the first statement.
        self.session.enable();
        self.session.set_step_mode(StepMode::StepInto);
        let debugee = spawn_debugee(self.session.clone(), self.program.clone());

        loop {
            match editor.readline(PROMT) {
                Ok(input) => {
                    if input.trim().is_empty() {
                        continue;
                    }
                    _ = crate::weak_error!(editor.add_history_entry(&input));
                    match Command::parse(&input) {
                        Ok(Command::Quit) => break,
                        Ok(command) => handle_command(&self.session, &printer, command),
                        Err(CommandError::Parsing(report)) => printer.println(report),
                        Err(error) => printer.println(ErrorView::from(format!("error: {error:#}"))),
                    }
                }
                // SIGINT at the prompt: keep the session, redraw the prompt.
                Err(ReadlineError::Interrupted) => continue,
                Err(ReadlineError::Eof) => break,
                Err(error) => {
                    printer.println(ErrorView::from(format!("error: {error:#}")));
                    break;
                }
            }
        }

        self.session.terminate(TerminateReason::User);
        let _ = debugee.join();
        drop(self.session);
        let _ = drain.join();
        Ok(())
    }
}

fn print_event(printer: &ExternalPrinter, event: &DebugEvent) {
    match event {
        DebugEvent::Stopped { location, .. } => {
            printer.println(format!("→ Paused at {}", FilePathView::from(location)));
        }
        DebugEvent::Output { text } => printer.println(text),
        DebugEvent::Exited { code } => {
            printer.println(ImportantView::from(format!("Program exited with code {code}")));
        }
        DebugEvent::Terminated { reason } => {
            printer.println(ImportantView::from(format!(
                "Session terminated ({})",
                reason.as_str()
            )));
        }
        DebugEvent::RuntimeError { message } => {
            printer.println(ErrorView::from(format!("error: {message}")));
        }
    }
}

fn handle_command(session: &DebugSession, printer: &ExternalPrinter, command: Command) {
    match command {
        Command::StepInto => session.set_step_mode(StepMode::StepInto),
        Command::StepOver => session.set_step_mode(StepMode::StepOver),
        Command::StepOut => session.set_step_mode(StepMode::StepOut),
        Command::Continue => session.cont(),
        Command::Break(target) => {
            let bp = session.set_breakpoint(&target.file, target.line);
            printer.println(format!(
                "Breakpoint set at {}:{}",
                FilePathView::from(&bp.file),
                bp.line
            ));
        }
        Command::Clear(target) => {
            if session.clear_breakpoint(&target.file, target.line) {
                printer.println(format!("Breakpoint cleared at {}:{}", target.file, target.line));
            } else {
                printer.println(format!("No breakpoint at {}:{}", target.file, target.line));
            }
        }
        Command::BreakpointList => {
            let breakpoints = session.list_breakpoints();
            if breakpoints.is_empty() {
                printer.println("No breakpoints");
            }
            for bp in breakpoints {
                let state = if bp.enabled { "" } else { " (disabled)" };
                printer.println(format!(
                    "{}:{}{state}",
                    FilePathView::from(&bp.file),
                    bp.line
                ));
            }
        }
        Command::Print(name) => match session.find_variable(&name) {
            Ok(var) => printer.println(format!("{} = {}", var.name, var.value)),
            Err(Error::UnknownSymbol(name)) => printer.println(format!("{name} not found")),
            Err(error) => print_error(printer, error),
        },
        Command::Vars => match session.variables(0) {
            Ok((vars, stale)) => {
                if stale {
                    printer.println(ImportantView::from("(not paused, values may be stale)"));
                }
                for var in vars {
                    printer.println(format!("{} = {} ({})", var.name, var.value, var.type_tag));
                }
            }
            Err(error) => print_error(printer, error),
        },
        Command::Stack => {
            let (frames, stale) = session.stack_trace();
            if stale {
                printer.println(ImportantView::from("(not paused, stack may be stale)"));
            }
            for frame in frames {
                printer.println(format!(
                    "#{} {} at {}",
                    frame.index,
                    KeywordView::from(&frame.function_name),
                    FilePathView::from(&frame.location),
                ));
            }
        }
        Command::Help { .. } => printer.println(HELP),
        Command::Quit => unreachable!("handled by the input loop"),
    }
}

fn print_error(printer: &ExternalPrinter, error: Error) {
    printer.println(ErrorView::from(format!("error: {error:#}")));
}
