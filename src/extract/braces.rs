use super::{pull_continuation, search_quotes};
use crate::error::CompileError;
use crate::source::Source;

/// Counting mode for [`extract_braces`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Braces<'d> {
    /// Host-language expression: `(`, `[` and `{` all nest together
    Python,
    /// Variable placeholder between the profile's start and end sequences.
    /// Brace-based pairs (`${`/`}`, `{{`/`}}`) count single `{` and `}`; any other
    /// pair (`[[`/`]]`) counts whole start and end sequences.
    Placeholder { start: &'d str, end: &'d str },
}

impl Braces<'_> {
    /// Length of the opening sequence and the depth it leaves us at
    fn opening(&self, line: &str) -> Option<(usize, usize)> {
        match *self {
            Braces::Python => line
                .chars()
                .next()
                .filter(|c| matches!(c, '(' | '[' | '{'))
                .map(|_| (1, 1)),
            Braces::Placeholder { start, .. } => {
                if start.is_empty() || !line.starts_with(start) {
                    return None;
                }
                let depth = if self.counts_braces() {
                    start.matches('{').count()
                } else {
                    1
                };
                Some((start.len(), depth))
            }
        }
    }

    fn counts_braces(&self) -> bool {
        match *self {
            Braces::Python => false,
            Braces::Placeholder { start, end } => start.contains('{') && end.contains('}'),
        }
    }

    /// Nesting delimiter at the head of `tail`: its length and whether it opens
    fn delimiter(&self, tail: &str) -> Option<(usize, bool)> {
        let c = tail.chars().next()?;
        match *self {
            Braces::Python => match c {
                '(' | '[' | '{' => Some((1, true)),
                ')' | ']' | '}' => Some((1, false)),
                _ => None,
            },
            Braces::Placeholder { .. } if self.counts_braces() => match c {
                '{' => Some((1, true)),
                '}' => Some((1, false)),
                _ => None,
            },
            Braces::Placeholder { start, end } => {
                if !end.is_empty() && tail.starts_with(end) {
                    Some((end.len(), false))
                } else if tail.starts_with(start) {
                    Some((start.len(), true))
                } else {
                    None
                }
            }
        }
    }
}

/// Extract a balanced brace expression from the start of `line`.
///
/// String literals are copied whole. When the line ends inside the expression the
/// next line is pulled from `source` and scanning continues; running out of lines
/// is an [`CompileError::UnterminatedBrace`]. Returns the expression including its
/// outer braces, and the rest of the line after the closing brace.
pub fn extract_braces(
    line: &str,
    source: &mut Source<'_>,
    mode: Braces<'_>,
) -> Result<Option<(String, String)>, CompileError> {
    let Some((start_len, mut depth)) = mode.opening(line) else {
        return Ok(None);
    };
    let mut buf = line[..start_len].to_string();
    let mut tail = line[start_len..].to_string();

    loop {
        let Some(c) = tail.chars().next() else {
            tail = pull_continuation(source, &buf)?;
            continue;
        };

        if let Some((len, opens)) = mode.delimiter(&tail) {
            buf.push_str(&tail[..len]);
            tail.replace_range(..len, "");
            if opens {
                depth += 1;
            } else {
                depth -= 1;
                if depth == 0 {
                    return Ok(Some((buf, tail)));
                }
            }
        } else if c == '\n' || tail.starts_with("\r\n") {
            tail = pull_continuation(source, &buf)?;
        } else if let Some(end) = search_quotes(&tail) {
            buf.push_str(&tail[..end]);
            tail.replace_range(..end, "");
        } else {
            buf.push(c);
            tail.replace_range(..c.len_utf8(), "");
        }
    }
}
