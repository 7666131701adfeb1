use crate::ui::command::parser::{
    BREAKPOINT_LIST_COMMAND, BREAKPOINT_LIST_COMMAND_SHORT, BREAK_COMMAND, BREAK_COMMAND_SHORT,
    CLEAR_COMMAND, CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT, HELP_COMMAND, HELP_COMMAND_SHORT,
    PRINT_COMMAND, PRINT_COMMAND_SHORT, QUIT_COMMAND, QUIT_COMMAND_SHORT, STACK_COMMAND,
    STACK_COMMAND_SHORT, STEP_INTO_COMMAND, STEP_INTO_COMMAND_SHORT, STEP_OUT_COMMAND,
    STEP_OUT_COMMAND_SHORT, STEP_OVER_COMMAND, STEP_OVER_COMMAND_SHORT, VARS_COMMAND,
    VARS_COMMAND_SHORT,
};
use crossterm::style::{Color, Stylize};
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{CompletionType, Config, Context, Editor, Helper};
use std::borrow::Cow;

pub type EzEditor = Editor<EzHelper, DefaultHistory>;

/// Verb table shared by the completer; long form first, then the alias.
const COMMANDS: &[(&str, &str)] = &[
    (STEP_INTO_COMMAND, STEP_INTO_COMMAND_SHORT),
    (STEP_OVER_COMMAND, STEP_OVER_COMMAND_SHORT),
    (STEP_OUT_COMMAND, STEP_OUT_COMMAND_SHORT),
    (CONTINUE_COMMAND, CONTINUE_COMMAND_SHORT),
    (BREAK_COMMAND, BREAK_COMMAND_SHORT),
    (CLEAR_COMMAND, CLEAR_COMMAND),
    (BREAKPOINT_LIST_COMMAND, BREAKPOINT_LIST_COMMAND_SHORT),
    (PRINT_COMMAND, PRINT_COMMAND_SHORT),
    (VARS_COMMAND, VARS_COMMAND_SHORT),
    (STACK_COMMAND, STACK_COMMAND_SHORT),
    (HELP_COMMAND, HELP_COMMAND_SHORT),
    (QUIT_COMMAND, QUIT_COMMAND_SHORT),
];

pub struct EzHelper {
    pub colored_prompt: String,
}

impl EzHelper {
    fn new(prompt: &str) -> Self {
        Self {
            colored_prompt: format!("{}", prompt.with(Color::DarkGreen)),
        }
    }
}

impl Completer for EzHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Complete the verb only; arguments are free-form.
        let head = &line[..pos];
        if head.contains(char::is_whitespace) {
            return Ok((pos, vec![]));
        }
        let candidates = COMMANDS
            .iter()
            .filter(|(long, _)| long.starts_with(head))
            .map(|(long, _)| Pair {
                display: long.to_string(),
                replacement: long.to_string(),
            })
            .collect();
        Ok((0, candidates))
    }
}

impl Hinter for EzHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for EzHelper {
    fn highlight_prompt<'b, 's: 'b, 'p: 'b>(
        &'s self,
        prompt: &'p str,
        default: bool,
    ) -> Cow<'b, str> {
        if default {
            Cow::Borrowed(&self.colored_prompt)
        } else {
            Cow::Borrowed(prompt)
        }
    }
}

impl Validator for EzHelper {}

impl Helper for EzHelper {}

pub fn create_editor(prompt: &str) -> rustyline::Result<EzEditor> {
    let config = Config::builder()
        .completion_type(CompletionType::List)
        .build();
    let mut editor = EzEditor::with_config(config)?;
    editor.set_helper(Some(EzHelper::new(prompt)));
    Ok(editor)
}
