use std::fs;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use ezdbg::debugger::hook::NopHook;
use ezdbg::debugger::DebugSession;
use ezdbg::interp::{self, Interpreter, Program};
use ezdbg::log::{FileLogger, LOGGER_SWITCHER};
use ezdbg::ui::console::ConsoleApplication;
use ezdbg::ui::json;

#[derive(Parser, Debug)]
#[command(author, version, about = "Debugger for the EZ language", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Execute a program without the debugger
    Run { file: PathBuf },
    /// Debug a program in the interactive console
    Debug { file: PathBuf },
    /// Serve the line-JSON debug protocol over stdio
    Debugserver {
        file: PathBuf,
        /// Write diagnostics here instead of stderr, keeping it silent
        #[clap(long)]
        log_file: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();
    let code = match cli.command {
        Cmd::Run { file } => cmd_run(&file),
        Cmd::Debug { file } => cmd_debug(&file),
        Cmd::Debugserver { file, log_file } => cmd_debugserver(&file, log_file.as_deref()),
    };
    process::exit(code);
}

/// Load and parse a source file; both failure kinds exit with code 1.
fn load_program(path: &Path) -> Option<Program> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            eprintln!("error: cannot read {}: {err}", path.display());
            return None;
        }
    };
    // Locations carry the basename, the same canonical form breakpoints use.
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("program.ez");
    match interp::parse(name, &source) {
        Ok(program) => Some(program),
        Err(err) => {
            eprintln!("error: {err}");
            None
        }
    }
}

fn switch_in_env_logger() {
    let logger = env_logger::Logger::from_default_env();
    let filter = logger.filter();
    LOGGER_SWITCHER.switch(logger, filter);
}

fn cmd_run(file: &Path) -> i32 {
    switch_in_env_logger();
    let Some(program) = load_program(file) else {
        return 1;
    };
    let mut interp = Interpreter::new(Arc::new(NopHook), Box::new(|line| println!("{line}")));
    match interp.run(&program) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err}");
            1
        }
    }
}

fn cmd_debug(file: &Path) -> i32 {
    let Some(program) = load_program(file) else {
        return 1;
    };
    let (session, event_rx) = DebugSession::new();
    let app = ConsoleApplication::new(session, event_rx, program);
    match app.run() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {err:#}");
            2
        }
    }
}

fn cmd_debugserver(file: &Path, log_file: Option<&Path>) -> i32 {
    match log_file {
        Some(path) => match FileLogger::new(path) {
            Ok(logger) => {
                let filter = logger.filter();
                LOGGER_SWITCHER.switch(logger, filter);
            }
            Err(err) => {
                eprintln!("error: cannot open log file {}: {err}", path.display());
                return 1;
            }
        },
        // env_logger writes to stderr, which is not part of the protocol
        // stream, so it is safe here.
        None => switch_in_env_logger(),
    }

    let Some(program) = load_program(file) else {
        return 1;
    };
    match json::serve(BufReader::new(io::stdin()), io::stdout(), program) {
        Ok(()) => 0,
        Err(err) => {
            log::error!(target: "server", "protocol fatal: {err:#}");
            eprintln!("error: {err:#}");
            2
        }
    }
}
