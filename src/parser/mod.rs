//! Line parsers and the indentation-driven dispatch loop.
//!
//! Every parser receives the indentation level of its headline, the headline body and
//! the shared [`Source`] cursor. It returns its output together with the first line it
//! did not consume (the "tail"), which the caller dispatches next.

pub mod literal;
pub mod mako;
pub mod python;
pub mod statement;
pub mod tag;

use crate::error::CompileError;
use crate::source::{Source, scan_line};
use crate::syntax::{Delimiters, Profile};

/// Shared state of one compilation
#[derive(Debug, Clone, Copy)]
pub struct Context<'p> {
    profile: &'p Profile,
    max_depth: usize,
    depth: usize,
}

impl<'p> Context<'p> {
    pub fn new(profile: &'p Profile, max_depth: usize) -> Self {
        Self {
            profile,
            max_depth,
            depth: 0,
        }
    }

    pub fn profile(&self) -> &'p Profile {
        self.profile
    }

    pub fn delimiters(&self) -> &'p Delimiters {
        self.profile.delimiters()
    }

    /// Embedding depth, 0 for the top-level template
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Compile an embedded fragment one level deeper, without stripping the result.
    pub fn compile_nested(&self, text: &str) -> Result<String, CompileError> {
        let depth = self.depth + 1;
        if depth > self.max_depth {
            return Err(CompileError::RecursionLimit { limit: self.max_depth });
        }
        let nested = Context { depth, ..*self };
        compile_source(&nested, text, false)
    }
}

/// Result of one parser: output text plus the first unconsumed line.
///
/// An empty `tail_line` means the parser stopped at a line boundary (or at the end of
/// the input) and the caller should pull the next line itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Parsed {
    pub output: String,
    pub tail_indent: usize,
    pub tail_line: String,
}

impl Parsed {
    pub fn new(output: impl Into<String>, tail_indent: usize, tail_line: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            tail_indent,
            tail_line: tail_line.into(),
        }
    }

    /// Output that consumed everything up to the end of the input
    pub fn exhausted(output: impl Into<String>) -> Self {
        Self::new(output, 0, "")
    }
}

/// Run the first rule of the profile that matches `line`.
pub fn dispatch(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let Some((rule, caps)) = ctx.profile().dispatch(line) else {
        return Err(CompileError::NoParser {
            lineno: source.lineno(),
            line: line.to_string(),
        });
    };
    tracing::debug!(rule = rule.name(), lineno = source.lineno(), indent_level, "dispatch");
    (rule.parse())(ctx, indent_level, line, &caps, source)
}

/// Dispatch the remainder of a headline (after `:` or an inline statement body)
/// at the headline's own indentation level.
pub fn parse_tail(
    ctx: &Context<'_>,
    indent_level: usize,
    tail_line: &str,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let mut output = String::new();
    let mut tail_indent = indent_level;
    let mut tail_line = tail_line.to_string();

    while !tail_line.is_empty() {
        let parsed = dispatch(ctx, indent_level, &tail_line, source)?;
        output.push_str(&parsed.output);
        tail_indent = parsed.tail_indent;
        tail_line = parsed.tail_line;
        if tail_indent <= indent_level {
            break;
        }
    }

    Ok(Parsed::new(output, tail_indent, tail_line))
}

/// Dispatch every following line indented deeper than `indent_level`.
///
/// Blank lines are skipped. Stops at the first line at or above `indent_level`
/// and returns it as the tail.
pub fn parse_nested(ctx: &Context<'_>, indent_level: usize, source: &mut Source<'_>) -> Result<Parsed, CompileError> {
    let mut output = String::new();

    while let Some((_, raw)) = source.next() {
        let (mut tail_indent, line) = scan_line(raw);
        let mut tail_line = line.to_string();
        while !tail_line.is_empty() {
            if tail_indent <= indent_level {
                return Ok(Parsed::new(output, tail_indent, tail_line));
            }
            let parsed = dispatch(ctx, tail_indent, &tail_line, source)?;
            output.push_str(&parsed.output);
            tail_indent = parsed.tail_indent;
            tail_line = parsed.tail_line;
        }
    }

    Ok(Parsed::exhausted(output))
}

/// Compile a whole template.
pub(crate) fn compile_source(ctx: &Context<'_>, text: &str, strip: bool) -> Result<String, CompileError> {
    let mut source = Source::new(text);
    let mut output = String::new();

    while let Some((_, raw)) = source.next() {
        let (mut tail_indent, line) = scan_line(raw);
        let mut tail_line = line.to_string();
        while !tail_line.is_empty() {
            let parsed = dispatch(ctx, tail_indent, &tail_line, &mut source)?;
            output.push_str(&parsed.output);
            tail_indent = parsed.tail_indent;
            tail_line = parsed.tail_line;
        }
    }

    if strip {
        Ok(output.trim().to_string())
    } else {
        Ok(output)
    }
}
