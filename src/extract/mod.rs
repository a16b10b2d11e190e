//! Extractors pull one lexical unit off the front of a line.
//!
//! Each one returns `None` when the line does not start with its opening sequence.
//! On success it returns the captured text and the rest of the line. Extractors that
//! accept multi-line input pull continuation lines from the [`Source`] on demand.

mod attribute;
mod braces;
mod embedded;
mod ident;
mod quotes;
mod tag_line;

pub use attribute::{extract_dynamic_attributes, extract_tag_attribute};
pub use braces::{Braces, extract_braces};
pub use embedded::{extract_embedding_quotes, parse_embedded_markup};
pub use ident::extract_identifier;
pub use quotes::search_quotes;
pub use tag_line::{Rename, TagLine, extract_line_break, extract_statement_expression, extract_tag_line};
pub(crate) use tag_line::inject_no_escape;

use crate::error::CompileError;
use crate::source::Source;

/// Drop the first character of `s`.
pub(crate) fn skip_first(s: &str) -> &str {
    let mut chars = s.chars();
    chars.next();
    chars.as_str()
}

/// Drop the first `n` characters of `s`.
pub(crate) fn skip_chars(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((idx, _)) => &s[idx..],
        None => "",
    }
}

/// Pull the next line for an expression that spans lines, left-trimmed.
pub(crate) fn pull_continuation(source: &mut Source<'_>, expr: &str) -> Result<String, CompileError> {
    match source.next() {
        Some((lineno, line)) => {
            tracing::trace!(lineno, "continuation line");
            Ok(line.trim_start().to_string())
        }
        None => Err(CompileError::UnterminatedBrace {
            lineno: source.lineno(),
            expr: expr.to_string(),
        }),
    }
}
