use super::{BreakpointTarget, Command, CommandError};
use ariadne::{Color, Fmt, Label, Report, ReportKind, Source};
use chumsky::error::{Rich, RichPattern, RichReason};
use chumsky::prelude::{any, choice, end, just};
use chumsky::text::whitespace;
use chumsky::{extra, text, Boxed, Parser};
use itertools::Itertools;

pub const STEP_INTO_COMMAND: &str = "step";
pub const STEP_INTO_COMMAND_SHORT: &str = "s";
pub const STEP_OVER_COMMAND: &str = "next";
pub const STEP_OVER_COMMAND_SHORT: &str = "n";
pub const STEP_OUT_COMMAND: &str = "out";
pub const STEP_OUT_COMMAND_SHORT: &str = "o";
pub const CONTINUE_COMMAND: &str = "continue";
pub const CONTINUE_COMMAND_SHORT: &str = "c";
pub const BREAK_COMMAND: &str = "break";
pub const BREAK_COMMAND_SHORT: &str = "b";
pub const CLEAR_COMMAND: &str = "clear";
pub const BREAKPOINT_LIST_COMMAND: &str = "breakpoints";
pub const BREAKPOINT_LIST_COMMAND_SHORT: &str = "bp";
pub const PRINT_COMMAND: &str = "print";
pub const PRINT_COMMAND_SHORT: &str = "p";
pub const VARS_COMMAND: &str = "vars";
pub const VARS_COMMAND_SHORT: &str = "v";
pub const STACK_COMMAND: &str = "stack";
pub const STACK_COMMAND_SHORT: &str = "st";
pub const HELP_COMMAND: &str = "help";
pub const HELP_COMMAND_SHORT: &str = "h";
pub const QUIT_COMMAND: &str = "quit";
pub const QUIT_COMMAND_SHORT: &str = "q";

type Err<'a> = extra::Err<Rich<'a, char>>;

/// `FILE:LINE` breakpoint address.
pub fn file_line<'a>() -> impl chumsky::Parser<'a, &'a str, BreakpointTarget, Err<'a>> + Clone {
    any()
        .filter(|c: &char| *c != ':' && !c.is_whitespace())
        .repeated()
        .at_least(1)
        .to_slice()
        .then_ignore(just(':'))
        .then(text::int(10).from_str().unwrapped())
        .map(|(file, line): (&str, u32)| BreakpointTarget {
            file: file.to_string(),
            line,
        })
        .padded()
        .labelled("FILE:LINE")
}

pub fn identifier<'a>() -> impl chumsky::Parser<'a, &'a str, &'a str, Err<'a>> + Clone {
    text::ascii::ident().padded().labelled("variable name")
}

fn command<'a, I>(ctx: &'static str, inner: I) -> Boxed<'a, 'a, &'a str, Command, Err<'a>>
where
    I: chumsky::Parser<'a, &'a str, Command, Err<'a>> + 'a,
{
    inner.then_ignore(end()).labelled(ctx).boxed()
}

impl Command {
    /// Parse a line of controller input. The verb is case-insensitive,
    /// arguments keep their case.
    pub fn parse(input: &str) -> Result<Command, CommandError> {
        let input = normalize_verb(input);
        let result = Self::parser().parse(input.as_str()).into_result();
        result.map_err(|errors| CommandError::Parsing(Self::render_errors(&input, errors)))
    }

    pub fn render_errors(src: &str, errors: Vec<Rich<char>>) -> String {
        let mut reports = vec![];

        for e in errors {
            fn generate_reports(
                src: &str,
                reports: &mut Vec<String>,
                err: &Rich<char>,
                reason: &RichReason<char>,
            ) {
                let report = Report::build(ReportKind::Error, "<command>", err.span().start)
                    .with_help("try \"help\" command");

                let report = match reason {
                    RichReason::ExpectedFound { expected, found } => report
                        .with_message(format!(
                            "{}, expected {}",
                            if found.is_some() {
                                "unexpected token in input"
                            } else {
                                "unexpected end of input"
                            },
                            if expected.is_empty() {
                                "something else".to_string()
                            } else {
                                expected
                                    .iter()
                                    .map(|e| match e {
                                        RichPattern::Token(tok) => tok.to_string(),
                                        RichPattern::Label(label) => label.to_string(),
                                        RichPattern::EndOfInput => "end of input".to_string(),
                                        other => other.to_string(),
                                    })
                                    .join(", ")
                            }
                        ))
                        .with_label(
                            Label::new(("<command>", err.span().into_range()))
                                .with_message(format!(
                                    "unexpected token {}",
                                    err.found()
                                        .map(|t| t.to_string())
                                        .unwrap_or("EOL".to_string())
                                        .fg(Color::Red)
                                ))
                                .with_color(Color::Red),
                        ),
                    RichReason::Custom(msg) => report.with_message(msg).with_label(
                        Label::new(("<command>", err.span().into_range()))
                            .with_message(format!("{}", msg.fg(Color::Red)))
                            .with_color(Color::Red),
                    ),
                };

                let mut buf = vec![];
                _ = report
                    .finish()
                    .write_for_stdout(("<command>", Source::from(&src)), &mut buf);
                reports.push(
                    std::str::from_utf8(&buf[..])
                        .expect("infallible")
                        .to_string(),
                );
            }

            generate_reports(src, &mut reports, &e, e.reason());
        }

        reports.join("\n")
    }

    fn parser<'a>() -> impl Parser<'a, &'a str, Command, Err<'a>> {
        let ws_req = whitespace().at_least(1);
        let ws_req_or_end = ws_req.or(end());
        let op = |sym| whitespace().then(just(sym)).then(ws_req_or_end);
        let op_w_arg = |sym| whitespace().then(just(sym)).then(ws_req);

        let step_into = op(STEP_INTO_COMMAND)
            .or(op(STEP_INTO_COMMAND_SHORT))
            .map(|_| Command::StepInto);
        let step_over = op(STEP_OVER_COMMAND)
            .or(op(STEP_OVER_COMMAND_SHORT))
            .map(|_| Command::StepOver);
        let step_out = op(STEP_OUT_COMMAND)
            .or(op(STEP_OUT_COMMAND_SHORT))
            .map(|_| Command::StepOut);
        let r#continue = op(CONTINUE_COMMAND)
            .or(op(CONTINUE_COMMAND_SHORT))
            .map(|_| Command::Continue);

        let breakpoint_list = op(BREAKPOINT_LIST_COMMAND)
            .or(op(BREAKPOINT_LIST_COMMAND_SHORT))
            .map(|_| Command::BreakpointList);
        let r#break = op_w_arg(BREAK_COMMAND)
            .or(op_w_arg(BREAK_COMMAND_SHORT))
            .ignore_then(file_line())
            .map(Command::Break);
        let clear = op_w_arg(CLEAR_COMMAND)
            .ignore_then(file_line())
            .map(Command::Clear);

        let print = op_w_arg(PRINT_COMMAND)
            .or(op_w_arg(PRINT_COMMAND_SHORT))
            .ignore_then(identifier())
            .map(|name: &str| Command::Print(name.to_string()));
        let vars = op(VARS_COMMAND)
            .or(op(VARS_COMMAND_SHORT))
            .map(|_| Command::Vars);
        let stack = op(STACK_COMMAND)
            .or(op(STACK_COMMAND_SHORT))
            .map(|_| Command::Stack);

        let help_with_arg = op_w_arg(HELP_COMMAND)
            .or(op_w_arg(HELP_COMMAND_SHORT))
            .ignore_then(identifier())
            .map(|cmd: &str| Command::Help {
                command: Some(cmd.to_string()),
            });
        let help = op(HELP_COMMAND)
            .or(op(HELP_COMMAND_SHORT))
            .map(|_| Command::Help { command: None });

        let quit = op(QUIT_COMMAND)
            .or(op(QUIT_COMMAND_SHORT))
            .map(|_| Command::Quit);

        choice((
            command("step", step_into),
            command("next", step_over),
            command("out", step_out),
            command("continue", r#continue),
            command("breakpoints", breakpoint_list),
            command("break", r#break),
            command("clear", clear),
            command("print", print),
            command("vars", vars),
            command("stack", stack),
            command("help", help_with_arg),
            command("help", help),
            command("quit", quit),
        ))
    }
}

/// Lowercase the verb (first whitespace-delimited token) and leave the rest
/// of the line untouched.
fn normalize_verb(input: &str) -> String {
    let trimmed = input.trim_start();
    let split = trimmed
        .find(char::is_whitespace)
        .unwrap_or(trimmed.len());
    let (verb, rest) = trimmed.split_at(split);
    format!("{}{}", verb.to_lowercase(), rest)
}
