use serde::Serialize;

/// Error raised while compiling a template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CompileError {
    /// Ill-formed construct (duplicate id, unclosed embedded quote, missing `)` ...)
    #[error("{message} | at line {lineno} \"{locus}\"")]
    Syntax {
        message: String,
        locus: String,
        lineno: usize,
    },

    /// No dispatch rule matched a non-empty line
    #[error("Invalid syntax at line {lineno}: {line}")]
    NoParser { lineno: usize, line: String },

    /// The cursor ran out of lines inside a balanced expression
    #[error("Unterminated expression at line {lineno}: {expr}")]
    UnterminatedBrace { lineno: usize, expr: String },

    /// Embedded markup nested deeper than the configured limit
    #[error("Embedded markup is nested deeper than {limit} levels")]
    RecursionLimit { limit: usize },

    /// A `-lang` block names a markup language with no registered transpiler
    #[error("No transpiler registered for '-{lang}' at line {lineno}")]
    MissingTranspiler { lang: String, lineno: usize },

    /// `make_profile` was given a name it does not know
    #[error("Unknown syntax profile '{name}'")]
    UnknownProfile { name: String },
}

impl CompileError {
    pub(crate) fn syntax(message: impl Into<String>, locus: impl Into<String>, lineno: usize) -> Self {
        CompileError::Syntax {
            message: message.into(),
            locus: locus.into(),
            lineno,
        }
    }

    /// Point a line-bound error at `lineno` of the enclosing template
    pub(crate) fn at_line(mut self, lineno: usize) -> Self {
        match &mut self {
            CompileError::Syntax { lineno: n, .. }
            | CompileError::NoParser { lineno: n, .. }
            | CompileError::UnterminatedBrace { lineno: n, .. }
            | CompileError::MissingTranspiler { lineno: n, .. } => *n = lineno,
            CompileError::RecursionLimit { .. } | CompileError::UnknownProfile { .. } => {}
        }
        self
    }

    /// Line number the error points to (1-based), if it has one
    pub fn lineno(&self) -> Option<usize> {
        match self {
            CompileError::Syntax { lineno, .. }
            | CompileError::NoParser { lineno, .. }
            | CompileError::UnterminatedBrace { lineno, .. }
            | CompileError::MissingTranspiler { lineno, .. } => Some(*lineno).filter(|n| *n > 0),
            CompileError::RecursionLimit { .. } | CompileError::UnknownProfile { .. } => None,
        }
    }

    fn help(&self) -> Option<&'static str> {
        match self {
            CompileError::Syntax { message, .. } if message.contains("two \"id\"") => {
                Some("Use either the #id shortcut or an id=\"...\" attribute, not both")
            }
            CompileError::Syntax { message, .. } if message.contains("Embedding quote") => {
                Some("Close the embedded markup with ` or `_, or write `` for a literal backtick")
            }
            CompileError::NoParser { .. } => {
                Some("Tag names are lowercase; start literal text with | or an uppercase letter")
            }
            CompileError::UnterminatedBrace { .. } => Some("Check for a missing ), ] or }"),
            _ => None,
        }
    }

    /// Render the error with source context (no color)
    pub fn render(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, false)
    }

    /// Render the error with ANSI color codes
    pub fn render_color(&self, source: &str, filename: &str) -> String {
        self.render_inner(source, filename, true)
    }

    fn render_inner(&self, source: &str, filename: &str, color: bool) -> String {
        let red = if color { "\x1b[1;31m" } else { "" };
        let dim = if color { "\x1b[2m" } else { "" };
        let cyan = if color { "\x1b[1;38;5;73m" } else { "" };
        let reset = if color { "\x1b[0m" } else { "" };

        let mut output = String::new();
        output.push('\n');

        match self.lineno() {
            Some(line) => output.push_str(&format!(" {}file:{} {}:{}\n", dim, reset, filename, line)),
            None => output.push_str(&format!(" {}file:{} {}\n", dim, reset, filename)),
        }
        output.push_str(&format!("{}error:{} {}\n", red, reset, self));

        if let Some(line) = self.lineno() {
            if let Some(source_line) = source.lines().nth(line - 1) {
                let width = format!("{}", line).len().max(2);
                let indent = source_line.len() - source_line.trim_start().len();
                let marked = source_line.trim().chars().count().max(1);
                output.push_str(&format!("{}{:>width$} |{}\n", dim, "", reset, width = width));
                output.push_str(&format!(
                    "{}{:>width$} |{} {}\n",
                    dim, line, reset, source_line, width = width
                ));
                output.push_str(&format!(
                    "{}{:>width$} |{} {}{}{}{}\n",
                    dim,
                    "",
                    reset,
                    " ".repeat(indent),
                    red,
                    "^".repeat(marked),
                    reset,
                    width = width
                ));
            }
        }

        if let Some(help) = self.help() {
            output.push('\n');
            output.push_str(&format!(" {}help:{} {}\n", cyan, reset, help));
        }

        output.push('\n');
        output
    }
}
