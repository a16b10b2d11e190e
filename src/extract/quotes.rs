const QUOTES: [&str; 4] = ["\"\"\"", "'''", "\"", "'"];

/// Find the end of a string literal at the start of `line`.
///
/// Returns the byte offset just past the closing quote, or `None` if the line
/// does not open with a quote or the literal is not closed on this line.
pub fn search_quotes(line: &str) -> Option<usize> {
    let quote = QUOTES.iter().find(|q| line.starts_with(**q))?;
    let mut pos = quote.len();
    while pos < line.len() {
        let rest = &line[pos..];
        if let Some(escaped) = rest.strip_prefix('\\') {
            pos += 1 + escaped.chars().next().map_or(1, char::len_utf8);
            continue;
        }
        if rest.starts_with(quote) {
            return Some(pos + quote.len());
        }
        pos += rest.chars().next().map_or(1, char::len_utf8);
    }
    None
}
