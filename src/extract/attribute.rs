use lazy_static::lazy_static;
use regex::Regex;

use super::{extract_identifier, search_quotes, skip_first};
use crate::error::CompileError;
use crate::source::Source;
use crate::syntax::Delimiters;

lazy_static! {
    static ref NUMERIC_VALUE: Regex = Regex::new(r"^(?:[-+]?[0-9]*\.[0-9]+|[-+]?[0-9]+%?)").unwrap();
}

const ATTRIBUTE_TERMINATORS: &[&str] = &["=", " ", ":", "|", ","];
const ATTRIBUTE_TERMINATORS_IN_PARENS: &[&str] = &["=", " ", ")", "\n"];
const VALUE_TERMINATORS: &[&str] = &[" ", ":", "|", ",", "=", "?"];
const VALUE_TERMINATORS_IN_PARENS: &[&str] = &[" ", ":", "|", ",", "=", "?", ")", "\n"];
const SPLAT_TERMINATORS: &[&str] = &[" ", "\n", "|", ",", "*", ":", "\\"];
const SPLAT_TERMINATORS_IN_PARENS: &[&str] = &[" ", "\n", "|", ",", "*", ":", "\\", ")"];

/// Extract one `**mapping` splat and expand it into a loop over the mapping's items.
pub fn extract_dynamic_attributes(
    line: &str,
    source: &mut Source<'_>,
    delims: &Delimiters,
    inside_parens: bool,
) -> Result<Option<(String, String)>, CompileError> {
    let Some(rest) = line.strip_prefix("**") else {
        return Ok(None);
    };
    let terminators = if inside_parens {
        SPLAT_TERMINATORS_IN_PARENS
    } else {
        SPLAT_TERMINATORS
    };
    let Some((expr, tail)) = extract_identifier(rest, source, "", terminators, delims.placeholder())? else {
        return Ok(None);
    };
    if expr.is_empty() {
        return Ok(None);
    }

    let d = delims;
    let attributes = format!(
        "\n{}for __plim_key__, __plim_value__ in {}.items(){}\n\
         {vs}__plim_key__{ve}=\"{vs}__plim_value__{ve}\"\n\
         {}endfor{}\n",
        d.statement_start,
        expr,
        d.statement_start_end,
        d.statement_end_start,
        d.statement_end_end,
        vs = d.variable_start,
        ve = d.variable_end,
    );
    Ok(Some((attributes, tail)))
}

/// Extract one `name`, `name=value` or `name=value?` attribute.
///
/// Inside parentheses a bare name followed by a space, `)` or the end of the line is a
/// boolean attribute and comes back as `name="name"`.
pub fn extract_tag_attribute(
    line: &str,
    source: &mut Source<'_>,
    delims: &Delimiters,
    inside_parens: bool,
) -> Result<Option<(String, String)>, CompileError> {
    let terminators = if inside_parens {
        ATTRIBUTE_TERMINATORS_IN_PARENS
    } else {
        ATTRIBUTE_TERMINATORS
    };
    let Some((name, tail)) = extract_identifier(line, source, "", terminators, delims.placeholder())? else {
        return Ok(None);
    };
    if name.is_empty() {
        return Ok(None);
    }

    if let Some(value) = tail.strip_prefix('=') {
        if let Some((value, rest)) = extract_quoted_attr_value(value) {
            return Ok(Some((format!("{}=\"{}\"", name, value.trim_end()), rest.to_string())));
        }

        if let Some(m) = NUMERIC_VALUE.find(value) {
            return Ok(Some((format!("{}=\"{}\"", name, m.as_str()), value[m.end()..].to_string())));
        }

        let terminators = if inside_parens {
            VALUE_TERMINATORS_IN_PARENS
        } else {
            VALUE_TERMINATORS
        };
        let Some((value, rest)) = extract_dynamic_attr_value(value, source, terminators, delims)? else {
            return Ok(None);
        };
        let value = value.trim_end();
        if let Some(rest) = rest.strip_prefix('?') {
            let attribute = format!(
                "{}({}) and '{name}=\"{name}\"' or ''|{}{}",
                delims.variable_start,
                value,
                delims.no_escape,
                delims.variable_end,
                name = name,
            );
            return Ok(Some((attribute, rest.to_string())));
        }
        let attribute = format!(
            "{}=\"{}{}{}\"",
            name, delims.variable_start, value, delims.variable_end
        );
        return Ok(Some((attribute, rest)));
    }

    let boolean = if inside_parens {
        tail.is_empty() || tail.starts_with(' ') || tail.starts_with('\n') || tail.starts_with(')')
    } else {
        tail.starts_with(')')
    };
    if boolean {
        return Ok(Some((format!("{name}=\"{name}\""), tail)));
    }
    Ok(None)
}

/// Strip the quotes off a string literal and decode its escape sequences once.
fn extract_quoted_attr_value(line: &str) -> Option<(String, &str)> {
    let end = search_quotes(line)?;
    let skip = if line.starts_with("\"\"\"") || line.starts_with("'''") { 3 } else { 1 };
    let value = unescape(&line[skip..end - skip]);
    Some((value, &line[end..]))
}

/// Dynamic value: `${expr}` and `(expr)` lose their wrappers, anything else is taken as is.
fn extract_dynamic_attr_value(
    line: &str,
    source: &mut Source<'_>,
    terminators: &[&str],
    delims: &Delimiters,
) -> Result<Option<(String, String)>, CompileError> {
    let Some((expr, tail)) = extract_identifier(line, source, "", terminators, delims.placeholder())? else {
        return Ok(None);
    };
    let (vs, ve) = (&delims.variable_start, &delims.variable_end);
    let value = if !vs.is_empty() && line.starts_with(vs.as_str()) {
        expr.get(vs.len()..expr.len().saturating_sub(ve.len()))
            .unwrap_or_default()
            .to_string()
    } else if line.starts_with('(') {
        let inner = skip_first(&expr);
        let mut chars = inner.chars();
        chars.next_back();
        chars.as_str().to_string()
    } else {
        expr
    };
    Ok(Some((value, tail)))
}

/// Decode backslash escapes the way a host-language string literal would.
/// Unknown escapes are kept verbatim.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };
        match next {
            '\n' => {}
            '\\' => out.push('\\'),
            '\'' => out.push('\''),
            '"' => out.push('"'),
            'a' => out.push('\x07'),
            'b' => out.push('\x08'),
            'f' => out.push('\x0c'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\x0b'),
            '0'..='7' => {
                let mut code = next.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            code = code * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(code));
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let decoded = (digits.len() == width && digits.chars().all(|d| d.is_ascii_hexdigit()))
                    .then(|| u32::from_str_radix(&digits, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attr(line: &str, inside_parens: bool) -> Option<(String, String)> {
        let mut source = Source::new("");
        extract_tag_attribute(line, &mut source, &Delimiters::mako(), inside_parens).unwrap()
    }

    fn assert_attr(line: &str, inside_parens: bool, expected: &str, tail: &str) {
        let (attribute, rest) = attr(line, inside_parens).unwrap_or_else(|| panic!("no attribute in {line:?}"));
        assert_eq!(attribute, expected, "attribute of {line:?}");
        assert_eq!(rest, tail, "tail of {line:?}");
    }

    #[test]
    fn test_not_an_attribute() {
        assert_eq!(attr("", false), None);
        assert_eq!(attr(" ", false), None);
        assert_eq!(attr("=", false), None);
        assert_eq!(attr(" = ", false), None);
        assert_eq!(attr("|", false), None);
        assert_eq!(attr("'", false), None);
        assert_eq!(attr(")", true), None);
        assert_eq!(attr("text", false), None);
    }

    #[test]
    fn test_literal_values() {
        assert_attr(r#"attr="value""#, false, r#"attr="value""#, "");
        assert_attr(r#"attr="value")"#, true, r#"attr="value""#, ")");
        assert_attr(r#"attr="${\"val\"}"? selected"#, false, r#"attr="${"val"}""#, "? selected");
        assert_attr(r#"attr="${\"val\"}"?) selected"#, true, r#"attr="${"val"}""#, "?) selected");
        assert_attr(
            r#"attr${attr}attr="${\"val\"}"?) selected"#,
            true,
            r#"attr${attr}attr="${"val"}""#,
            "?) selected",
        );
    }

    #[test]
    fn test_numeric_values() {
        for value in ["7", ".7", "-7", "+7", "-.7", "+.7", "10.7", "-10.7", "+10.7", "10.107", "107", "50%"] {
            assert_attr(
                &format!("attr={value} attr2=val"),
                false,
                &format!("attr=\"{value}\""),
                " attr2=val",
            );
        }
    }

    #[test]
    fn test_dynamic_values() {
        assert_attr("attr=${val}", false, r#"attr="${val}""#, "");
        assert_attr("attr=(val)", false, r#"attr="${val}""#, "");
        assert_attr("style=c.selected_cover", false, r#"style="${c.selected_cover}""#, "");
        assert_attr("href=item['url']", false, r#"href="${item['url']}""#, "");
        assert_attr("value=extra_title[0]", false, r#"value="${extra_title[0]}""#, "");
        assert_attr(
            r#"attr=obj.url(request, func("test(['") + "{test}".format(test="123"), cover['image'])"#,
            false,
            r#"attr="${obj.url(request, func("test(['") + "{test}".format(test="123"), cover['image'])}""#,
            "",
        );
        assert_attr("attr=${val} selected", false, r#"attr="${val}""#, " selected");
        assert_attr("attr=(val) selected", false, r#"attr="${val}""#, " selected");
        assert_attr("attr=val selected", false, r#"attr="${val}""#, " selected");
        assert_attr("attr=_('i18n message') selected", false, r#"attr="${_('i18n message')}""#, " selected");
        assert_attr("attr=${val})", true, r#"attr="${val}""#, ")");
        assert_attr("attr=(val))", true, r#"attr="${val}""#, ")");
        assert_attr("attr=${val} selected)", true, r#"attr="${val}""#, " selected)");
        assert_attr("attr=(val) selected)", true, r#"attr="${val}""#, " selected)");
        assert_attr("attr=val) selected", true, r#"attr="${val}""#, ") selected");
    }

    #[test]
    fn test_boolean_marker() {
        let expected = r#"${(val) and 'attr="attr"' or ''|n}"#;
        assert_attr("attr=${val}? selected", false, expected, " selected");
        assert_attr("attr=(val)? selected", false, expected, " selected");
        assert_attr("attr=val? selected", false, expected, " selected");
        assert_attr("attr=${val}?)", true, expected, ")");
        assert_attr("attr=(val)?)", true, expected, ")");
        assert_attr(
            "attr=${val + 1}? selected",
            false,
            r#"${(val + 1) and 'attr="attr"' or ''|n}"#,
            " selected",
        );
        assert_attr(
            r#"attr=(val("test() is a function"))?)"#,
            true,
            r#"${(val("test() is a function")) and 'attr="attr"' or ''|n}"#,
            ")",
        );
    }

    #[test]
    fn test_boolean_marker_django() {
        let mut source = Source::new("");
        let (attribute, _) = extract_tag_attribute("checked=on?", &mut source, &Delimiters::django(), false)
            .unwrap()
            .unwrap();
        assert_eq!(attribute, r#"{{(on) and 'checked="checked"' or ''|safe}}"#);
    }

    #[test]
    fn test_bare_boolean_attributes() {
        assert_attr("disabled)", true, r#"disabled="disabled""#, ")");
        assert_attr("disabled name=x)", true, r#"disabled="disabled""#, " name=x)");
        assert_attr("disabled", true, r#"disabled="disabled""#, "");
        assert_attr("disabled\n", true, r#"disabled="disabled""#, "\n");
        assert_eq!(attr("disabled name=x", false), None);
    }

    #[test]
    fn test_dynamic_value_in_parens() {
        let mut source = Source::new("");
        let (value, tail) = extract_dynamic_attr_value(
            "(value in func('test') and 'yes' or 'no')",
            &mut source,
            VALUE_TERMINATORS_IN_PARENS,
            &Delimiters::mako(),
        )
        .unwrap()
        .unwrap();
        assert_eq!(value, "value in func('test') and 'yes' or 'no'");
        assert_eq!(tail, "");
    }

    #[test]
    fn test_splat() {
        let mut source = Source::new("");
        let (attributes, tail) =
            extract_dynamic_attributes("**attrs rest", &mut source, &Delimiters::mako(), false)
                .unwrap()
                .unwrap();
        assert_eq!(
            attributes,
            "\n%for __plim_key__, __plim_value__ in attrs.items():\n\
             ${__plim_key__}=\"${__plim_value__}\"\n\
             %endfor\n"
        );
        assert_eq!(tail, " rest");

        let (_, tail) = extract_dynamic_attributes("**get(x))", &mut source, &Delimiters::mako(), true)
            .unwrap()
            .unwrap();
        assert_eq!(tail, ")");
        assert!(extract_dynamic_attributes("*x", &mut source, &Delimiters::mako(), false).unwrap().is_none());
    }

    #[test]
    fn test_unescape() {
        assert_eq!(unescape(r"a\tb\nc"), "a\tb\nc");
        assert_eq!(unescape(r#"\"q\" \'s\'"#), "\"q\" 's'");
        assert_eq!(unescape(r"\\"), "\\");
        assert_eq!(unescape(r"\u4e2d\u6587"), "中文");
        assert_eq!(unescape("中文"), "中文");
        assert_eq!(unescape(r"\x41\101"), "AA");
        assert_eq!(unescape(r"\d \u12"), r"\d \u12");
        assert_eq!(unescape("trailing\\"), "trailing\\");
    }
}
