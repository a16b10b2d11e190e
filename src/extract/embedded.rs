use crate::error::CompileError;
use crate::parser::Context;

/// Extract one backtick span from the start of `content`.
///
/// A span closes at the next single backtick, optionally followed by `_`. Inside the
/// span a doubled backtick stands for a literal one. Returns the embedded source,
/// the span exactly as written, and the rest of the content.
pub fn extract_embedding_quotes(
    content: &str,
    lineno: usize,
) -> Result<Option<(String, String, &str)>, CompileError> {
    let Some(mut tail) = content.strip_prefix('`') else {
        return Ok(None);
    };
    let mut original = String::from("`");
    let mut embedded = String::new();

    while let Some(c) = tail.chars().next() {
        if let Some(rest) = tail.strip_prefix("``") {
            original.push_str("``");
            embedded.push('`');
            tail = rest;
            continue;
        }
        if c == '`' {
            original.push_str(if tail.starts_with("`_") { "`_" } else { "`" });
            let rest = &content[original.len()..];
            return Ok(Some((embedded, original, rest)));
        }
        original.push(c);
        embedded.push(c);
        tail = &tail[c.len_utf8()..];
    }

    Err(CompileError::syntax(
        format!("Embedding quote is not closed: \"{}\"", original),
        content,
        lineno,
    ))
}

/// Render text that may carry backtick-embedded markup.
///
/// Each span is compiled as a nested template one level deeper. A span that no rule
/// recognises is kept as written; any other failure propagates, pointed at the line
/// holding the span. `lineno` is the line of the first line of `content`. Outside
/// spans a doubled backtick is a literal one.
pub fn parse_embedded_markup(ctx: &Context<'_>, content: &str, lineno: usize) -> Result<String, CompileError> {
    let mut out = String::with_capacity(content.len());
    let mut tail = content;
    let mut lineno = lineno;

    while let Some(c) = tail.chars().next() {
        if let Some(rest) = tail.strip_prefix("``") {
            out.push('`');
            tail = rest;
            continue;
        }

        if let Some((embedded, original, rest)) = extract_embedding_quotes(tail, lineno)? {
            tail = rest;
            let span_lineno = lineno;
            lineno += original.matches('\n').count();
            let embedded = embedded.trim();
            if embedded.is_empty() {
                continue;
            }
            match ctx.compile_nested(embedded) {
                Ok(html) => out.push_str(&html),
                Err(CompileError::NoParser { line, .. }) => {
                    tracing::debug!(lineno = span_lineno, line = %line, "embedded span kept verbatim");
                    out.push_str(&original);
                }
                Err(err) => return Err(err.at_line(span_lineno)),
            }
            continue;
        }

        if c == '\n' {
            lineno += 1;
        }
        out.push(c);
        tail = &tail[c.len_utf8()..];
    }

    Ok(out)
}
