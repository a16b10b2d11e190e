use lazy_static::lazy_static;
use regex::Regex;

use super::{
    Braces, extract_braces, extract_dynamic_attributes, extract_identifier, extract_tag_attribute,
    parse_embedded_markup, search_quotes, skip_first,
};
use crate::error::CompileError;
use crate::html::is_void_element;
use crate::parser::Context;
use crate::source::Source;
use crate::syntax::Delimiters;

lazy_static! {
    static ref TAG_NAME: Regex = Regex::new(r"^[a-z][a-z0-9]*").unwrap();
    static ref FILTERS_TAIL: Regex = Regex::new(
        r"\|\s*(?P<filters>[a-zA-Z][_.a-zA-Z0-9]*(?:,\s*[a-zA-Z][_.a-zA-Z0-9]*)*)\s*$"
    )
    .unwrap();
}

const CSS_ID_TERMINATORS: &[&str] = &[".", " ", "(", ":"];
const CSS_CLASS_TERMINATORS: &[&str] = &[".", " ", "(", ":"];

/// One extracted headline tag
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagLine {
    /// Opening tag followed by any inline content
    pub open: String,
    /// Closing tag, empty for void elements
    pub close: String,
    pub name: String,
    /// Serialized attributes, space separated
    pub attributes: String,
    /// Serialized inline content
    pub content: String,
    /// Whatever follows a `:` separator; the caller dispatches it as a nested line
    pub tail: String,
}

/// Replace the tag name and put an attribute in front of the others
#[derive(Debug, Clone, Copy)]
pub struct Rename<'a> {
    pub name: &'a str,
    pub leading_attribute: &'a str,
}

/// Extract the first tag of a headline such as `a#home.nav(href="/") = title`.
///
/// Reads the name (default `div`), the `#id` and `.class` shortcuts, then attributes,
/// either bare or inside parentheses that may span several lines. Content after the
/// attributes is rendered inline; a `:` instead leaves the rest in [`TagLine::tail`].
pub fn extract_tag_line(
    ctx: &Context<'_>,
    line: &str,
    source: &mut Source<'_>,
    rename: Option<Rename<'_>>,
) -> Result<TagLine, CompileError> {
    let d = ctx.delimiters();
    let placeholder = d.placeholder();

    let (name, rest) = match TAG_NAME.find(line) {
        Some(m) => (m.as_str().to_string(), &line[m.end()..]),
        None => ("div".to_string(), line),
    };
    let mut tail = rest.to_string();
    let mut attributes = Vec::new();
    let name = match rename {
        Some(rename) => {
            attributes.push(rename.leading_attribute.to_string());
            rename.name.to_string()
        }
        None => name,
    };

    let css_id = match extract_identifier(&tail, source, "#", CSS_ID_TERMINATORS, placeholder)? {
        Some((id, rest)) => {
            tail = rest;
            skip_first(&id).trim_end().to_string()
        }
        None => String::new(),
    };

    let mut classes = Vec::new();
    while let Some((class, rest)) = extract_identifier(&tail, source, ".", CSS_CLASS_TERMINATORS, placeholder)? {
        classes.push(skip_first(&class).trim_end().to_string());
        tail = rest;
    }

    (_, tail) = extract_line_break(tail.trim_start(), source);
    let inside_parens = tail.starts_with('(');
    if inside_parens {
        tail = skip_first(&tail).trim_start().to_string();
    }

    loop {
        (_, tail) = extract_line_break(tail.trim_start(), source);

        if let Some((splat, rest)) = extract_dynamic_attributes(&tail, source, d, inside_parens)? {
            attributes.push(splat);
            tail = rest;
            continue;
        }

        if let Some((pair, rest)) = extract_tag_attribute(&tail, source, d, inside_parens)? {
            tail = rest;
            if pair.starts_with("id=\"") && !css_id.is_empty() {
                return Err(CompileError::syntax(
                    "Your template has two \"id\" attribute definitions",
                    line,
                    source.lineno(),
                ));
            }
            match pair.strip_prefix("class=\"").and_then(|v| v.strip_suffix('"')) {
                Some(class) => classes.push(class.to_string()),
                None => attributes.push(pair),
            }
            continue;
        }

        if inside_parens && tail.is_empty() {
            match source.next() {
                Some((lineno, next)) => {
                    tracing::trace!(lineno, "attribute continuation line");
                    tail = next.to_string();
                    continue;
                }
                None => {
                    return Err(CompileError::syntax("Unexpected end of line", line, source.lineno()));
                }
            }
        }

        if !css_id.is_empty() {
            attributes.push(format!("id=\"{}\"", css_id));
        }
        if !classes.is_empty() {
            attributes.push(format!("class=\"{}\"", classes.join(" ")));
        }
        break;
    }

    let attributes = attributes.join(" ");
    let mut open = format!("<{}", name);
    if !attributes.is_empty() {
        open.push(' ');
        open.push_str(&attributes);
    }

    if inside_parens {
        match tail.strip_prefix(')') {
            Some(rest) => tail = rest.trim_start().to_string(),
            None => return Err(CompileError::syntax("Unexpected end of line", tail, source.lineno())),
        }
    } else if tail.starts_with(' ') {
        tail = tail.trim_start().to_string();
    }

    let close = if is_void_element(&name) {
        open.push_str("/>");
        String::new()
    } else {
        open.push('>');
        format!("</{}>", name)
    };

    if let Some(rest) = tail.strip_prefix(':') {
        return Ok(TagLine {
            open,
            close,
            name,
            attributes,
            content: String::new(),
            tail: rest.trim_start().to_string(),
        });
    }

    let content = if tail.is_empty() {
        String::new()
    } else if let Some(expr) = tail.strip_prefix('=') {
        inline_expression(expr, source, d)?
    } else if let Some(text) = tail.strip_prefix('|') {
        parse_embedded_markup(ctx, text.trim(), source.lineno())?
    } else if let Some(text) = tail.strip_prefix(',') {
        let mut text = parse_embedded_markup(ctx, text.trim(), source.lineno())?;
        text.push(' ');
        text
    } else {
        parse_embedded_markup(ctx, tail.trim(), source.lineno())?
    };
    open.push_str(&content);

    Ok(TagLine {
        open,
        close,
        name,
        attributes,
        content,
        tail: String::new(),
    })
}

/// Inline `= expr`, `== expr`, `=, expr` or `==, expr` content (leading `=` already removed)
fn inline_expression(expr: &str, source: &mut Source<'_>, d: &Delimiters) -> Result<String, CompileError> {
    let (no_escape, expr) = match expr.strip_prefix('=') {
        Some(rest) => (true, rest),
        None => (false, expr),
    };
    let (trailing_space, expr) = match expr.strip_prefix(',') {
        Some(rest) => (true, rest),
        None => (false, expr),
    };
    let mut expr = extract_statement_expression(expr, source)?;
    if no_escape {
        expr = inject_no_escape(&expr, d);
    }
    let space = if trailing_space { " " } else { "" };
    Ok(format!("{}{}{}{}", d.variable_start, expr, d.variable_end, space))
}

/// Add the no-escape filter to an expression, merging it into a trailing `|filters` list.
pub(crate) fn inject_no_escape(expr: &str, d: &Delimiters) -> String {
    match FILTERS_TAIL.captures(expr).and_then(|caps| caps.name("filters")) {
        Some(filters) => format!(
            "{}{}{}{}",
            expr[..filters.start()].trim_end(),
            d.no_escape,
            d.filter_separator,
            &expr[filters.start()..]
        ),
        None => format!("{}|{}", expr, d.no_escape),
    }
}

/// Follow `\` line continuations.
///
/// A tail made only of a backslash (plus whitespace) is replaced by the next line,
/// left-trimmed. Returns whether a continuation was followed.
pub fn extract_line_break(tail: &str, source: &mut Source<'_>) -> (bool, String) {
    let mut found = false;
    let mut tail = tail.to_string();
    while tail.trim_end() == "\\" {
        found = true;
        match source.next() {
            Some((_, next)) => tail = next.trim_start().to_string(),
            None => return (true, String::new()),
        }
    }
    (found, tail)
}

/// Read an expression that may continue over several lines through open brackets
/// or trailing backslashes. The result is trimmed.
pub fn extract_statement_expression(tail: &str, source: &mut Source<'_>) -> Result<String, CompileError> {
    let mut buf = String::new();
    let mut tail = format!("{}\n", tail.trim());

    while !tail.is_empty() {
        let (found, rest) = extract_line_break(&tail, source);
        tail = rest;
        if found {
            buf.push(' ');
        }

        if let Some((expr, rest)) = extract_braces(&tail, source, Braces::Python)? {
            buf.push_str(&expr);
            tail = rest;
            continue;
        }

        if let Some(end) = search_quotes(&tail) {
            buf.push_str(&tail[..end]);
            tail.replace_range(..end, "");
            continue;
        }

        if let Some(c) = tail.chars().next() {
            buf.push(c);
            tail.replace_range(..c.len_utf8(), "");
        }
    }

    Ok(buf.trim().to_string())
}
