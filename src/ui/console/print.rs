use super::editor::EzEditor;
use rustyline::ExternalPrinter as RLExternalPrinter;
use std::cell::RefCell;
use std::fmt::Display;

/// [`ExternalPrinter`] safely prints messages above an active readline
/// prompt, from any thread.
pub struct ExternalPrinter {
    printer: RefCell<Box<dyn RLExternalPrinter>>,
}

unsafe impl Send for ExternalPrinter {}

impl ExternalPrinter {
    pub fn new_for_editor(editor: &mut EzEditor) -> rustyline::Result<Self> {
        let external_p = editor.create_external_printer()?;
        Ok(Self {
            printer: RefCell::new(Box::new(external_p)),
        })
    }

    pub fn print(&self, msg: impl Display) {
        let msg = msg.to_string();
        self.printer
            .borrow_mut()
            .print(msg)
            .expect("external printer error");
    }

    pub fn println(&self, msg: impl Display) {
        let msg = format!("{msg}\n");
        self.print(msg)
    }
}

pub mod style {
    use crossterm::style::{Color, Stylize};
    use std::fmt::{Display, Formatter};

    struct View<T: Display> {
        inner: T,
        color: Color,
    }

    impl<T: Display> Display for View<T> {
        fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
            let rendered = self.inner.to_string();
            f.write_fmt(format_args!("{}", rendered.with(self.color)))
        }
    }

    /// Construct structure declaration to display data of the same type
    /// (file paths, errors, keywords).
    macro_rules! view_struct {
        ($name: ident, $color: expr) => {
            pub struct $name<T: Display>(View<T>);

            impl<T: Display> From<T> for $name<T> {
                fn from(value: T) -> Self {
                    Self(View {
                        inner: value,
                        color: $color,
                    })
                }
            }

            impl<T: Display> Display for $name<T> {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    self.0.fmt(f)
                }
            }
        };
    }

    view_struct!(ErrorView, Color::Red);
    view_struct!(FilePathView, Color::Cyan);
    view_struct!(KeywordView, Color::Green);
    view_struct!(ImportantView, Color::Yellow);
}
