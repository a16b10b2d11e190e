use super::{Braces, extract_braces, search_quotes};
use crate::error::CompileError;
use crate::source::Source;

/// Read a token that starts with `prefix` and runs up to the first terminator.
///
/// Placeholder expressions (delimited per `placeholder`), string literals and bracketed
/// expressions are swallowed whole, so `.item-${user.id}` or `url(a, b)` come back
/// as a single token. Terminators may be longer than one character. The token is
/// right-trimmed; the rest of the line starts at the terminator.
pub fn extract_identifier(
    line: &str,
    source: &mut Source<'_>,
    prefix: &str,
    terminators: &[&str],
    placeholder: Braces<'_>,
) -> Result<Option<(String, String)>, CompileError> {
    if line.is_empty() || !line.starts_with(prefix) {
        return Ok(None);
    }

    let mut buf = prefix.to_string();
    let mut tail = line[prefix.len()..].to_string();

    while let Some(c) = tail.chars().next() {
        if terminators.iter().any(|t| tail.starts_with(*t)) {
            break;
        }

        if let Some((expr, rest)) = extract_braces(&tail, source, placeholder)? {
            buf.push_str(&expr);
            tail = rest;
            continue;
        }

        if let Some(end) = search_quotes(&tail) {
            buf.push_str(&tail[..end]);
            tail.replace_range(..end, "");
            continue;
        }

        if let Some((expr, rest)) = extract_braces(&tail, source, Braces::Python)? {
            buf.push_str(&expr);
            tail = rest;
            continue;
        }

        buf.push(c);
        tail.replace_range(..c.len_utf8(), "");
    }

    let token = buf.trim_end().to_string();
    Ok(Some((token, tail)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSS: &[&str] = &[".", " ", "(", ":"];
    const MAKO: Braces<'static> = Braces::Placeholder { start: "${", end: "}" };

    fn ident(line: &str, prefix: &str) -> (String, String) {
        let mut source = Source::new("");
        extract_identifier(line, &mut source, prefix, CSS, MAKO).unwrap().unwrap()
    }

    #[test]
    fn test_css_shortcuts() {
        assert_eq!(ident("#test", "#").0, "#test");
        assert_eq!(ident("#test ", "#"), ("#test".to_string(), " ".to_string()));
        assert_eq!(ident("#test.class", "#"), ("#test".to_string(), ".class".to_string()));
        assert_eq!(ident(".test.class", ".").0, ".test");
        assert_eq!(ident(".абв.где", ".").0, ".абв");
    }

    #[test]
    fn test_swallows_placeholders() {
        assert_eq!(ident(".${test.test}.class", ".").0, ".${test.test}");
        assert_eq!(ident(".${test.test}test.class", ".").0, ".${test.test}test");
        assert_eq!(ident(".test-${test.test}test.class", ".").0, ".test-${test.test}test");

        let line = r#".test-${test.test + "${{'test':1}}"}${test}test.class"#;
        assert_eq!(ident(line, ".").0, r#".test-${test.test + "${{'test':1}}"}${test}test"#);
    }

    #[test]
    fn test_swallows_calls_and_strings() {
        let mut source = Source::new("");
        let (token, tail) =
            extract_identifier("url('a b', f(x)) rest", &mut source, "", &[" "], MAKO).unwrap().unwrap();
        assert_eq!(token, "url('a b', f(x))");
        assert_eq!(tail, " rest");
    }

    #[test]
    fn test_missing_prefix() {
        let mut source = Source::new("");
        assert_eq!(extract_identifier("", &mut source, "", CSS, MAKO).unwrap(), None);
        assert_eq!(extract_identifier("test", &mut source, "#", CSS, MAKO).unwrap(), None);
    }

    #[test]
    fn test_multichar_terminator() {
        let mut source = Source::new("");
        let (token, tail) =
            extract_identifier("x = 1 --- rest", &mut source, "", &["---", "\n"], MAKO).unwrap().unwrap();
        assert_eq!(token, "x = 1");
        assert_eq!(tail, "--- rest");
    }
}
