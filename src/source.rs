/// Line cursor over a template. Lines keep their terminators and are numbered from 1.
///
/// The cursor only moves forward: a parser that pulls a line owns it, and hands any
/// line it cannot handle back to its caller as a `tail_line`.
#[derive(Debug, Clone)]
pub struct Source<'s> {
    lines: Vec<&'s str>,
    pos: usize,
}

impl<'s> Source<'s> {
    pub fn new(text: &'s str) -> Self {
        Self {
            lines: text.split_inclusive('\n').collect(),
            pos: 0,
        }
    }

    /// Number of the last line handed out (0 before the first pull)
    pub fn lineno(&self) -> usize {
        self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.pos >= self.lines.len()
    }
}

impl<'s> Iterator for Source<'s> {
    type Item = (usize, &'s str);

    fn next(&mut self) -> Option<Self::Item> {
        let line = *self.lines.get(self.pos)?;
        self.pos += 1;
        Some((self.pos, line))
    }
}

/// Split a raw line into `(indent_width, body)`.
///
/// `indent_width` counts leading whitespace characters. Tabs count as one column each
/// and are not expanded. The body has its line terminator removed but keeps any other
/// trailing text. A blank line yields an empty body.
pub fn scan_line(line: &str) -> (usize, &str) {
    let body = line.trim_start();
    if body.trim_end_matches(['\n', '\r']).is_empty() {
        return (leading_width(line), "");
    }
    let indent = line[..line.len() - body.len()].chars().count();
    let body = body
        .strip_suffix('\n')
        .map(|b| b.strip_suffix('\r').unwrap_or(b))
        .unwrap_or(body);
    (indent, body)
}

/// Width of the indentation of a whitespace-only line, excluding its terminator.
fn leading_width(line: &str) -> usize {
    line.trim_end_matches(['\n', '\r'])
        .chars()
        .take_while(|c| c.is_whitespace())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scan_line() {
        assert_eq!(scan_line("body"), (0, "body"));
        assert_eq!(scan_line("    div"), (4, "div"));
        assert_eq!(scan_line(""), (0, ""));
        assert_eq!(scan_line(" "), (1, ""));
        assert_eq!(scan_line("  p text\n"), (2, "p text"));
        assert_eq!(scan_line("\tp\r\n"), (1, "p"));
        assert_eq!(scan_line("\n"), (0, ""));
    }

    #[test]
    fn test_source_numbers_lines_from_one() {
        let mut source = Source::new("a\nb\n\nc");
        assert_eq!(source.lineno(), 0);
        assert_eq!(source.next(), Some((1, "a\n")));
        assert_eq!(source.next(), Some((2, "b\n")));
        assert_eq!(source.next(), Some((3, "\n")));
        assert!(!source.is_exhausted());
        assert_eq!(source.next(), Some((4, "c")));
        assert_eq!(source.lineno(), 4);
        assert!(source.is_exhausted());
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_empty_source() {
        let mut source = Source::new("");
        assert!(source.is_exhausted());
        assert_eq!(source.next(), None);
    }
}
