//! Text blocks: literals, raw HTML, variables, comments and `-lang` markup.

use regex::Captures;

use super::{Context, Parsed, parse_nested};
use crate::error::CompileError;
use crate::extract::{inject_no_escape, parse_embedded_markup, skip_chars, skip_first};
use crate::source::{Source, scan_line};

/// Read a literal block: the text after the leading `|` or `,` plus every following
/// line indented deeper than `indent_level`.
///
/// Continuation lines are aligned on the smallest indentation seen so far and lose
/// their trailing whitespace. Blank lines are kept. A leading `,` appends a space.
pub(crate) fn literal_block(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    embedded: bool,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let trailing_space = line.starts_with(',');
    let first = skip_first(line).trim();
    let first_lineno = if first.is_empty() {
        source.lineno() + 1
    } else {
        source.lineno()
    };
    let mut text = first.to_string();
    if !first.is_empty() {
        text.push('\n');
    }

    let mut align = usize::MAX;
    let (tail_indent, tail_line) = loop {
        let Some((_, raw)) = source.next() else {
            break (0, String::new());
        };
        let (indent, body) = scan_line(raw);
        if body.is_empty() {
            text.push('\n');
            continue;
        }
        if indent <= indent_level {
            break (indent, body.to_string());
        }
        align = align.min(indent);
        text.push_str(skip_chars(raw, align).trim_end());
        text.push('\n');
    };

    let mut text = text.trim_end().to_string();
    if trailing_space {
        text.push(' ');
    }
    if embedded {
        text = parse_embedded_markup(ctx, &text, first_lineno)?;
    }
    Ok(Parsed::new(text, tail_indent, tail_line))
}

/// `| text` and `, text`
pub fn parse_explicit_literal(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    _caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    literal_block(ctx, indent_level, line, true, source)
}

/// Text that starts with something no tag could start with, like a capital letter
pub fn parse_implicit_literal(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let line = format!("|{}", &caps["line"]);
    literal_block(ctx, indent_level, &line, true, source)
}

/// Raw HTML lines pass through; deeper lines are parsed as usual.
pub fn parse_raw_html(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    _caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let mut output = line.trim().to_string();
    output.push('\n');
    let nested = parse_nested(ctx, indent_level, source)?;
    output.push_str(&nested.output);
    Ok(Parsed::new(output, nested.tail_indent, nested.tail_line))
}

/// `= expr`, `== expr` (no escaping) and `=, expr` (trailing space)
pub fn parse_variable(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let d = ctx.delimiters();
    let mut expr = caps["line"].trim_end().to_string();

    let (tail_indent, tail_line) = loop {
        let Some((_, raw)) = source.next() else {
            break (0, String::new());
        };
        let (indent, body) = scan_line(raw);
        if body.is_empty() {
            continue;
        }
        if indent <= indent_level {
            break (indent, body.to_string());
        }
        expr.push_str(body.trim());
    };

    if caps.name("prevent_escape").is_some() {
        expr = inject_no_escape(&expr, d);
    }
    let space = if caps.name("explicit_space").is_some() { " " } else { "" };
    let output = format!("{}{}{}{}", d.variable_start, expr, d.variable_end, space);
    Ok(Parsed::new(output, tail_indent, tail_line))
}

/// `/ comment` drops the line and everything nested under it.
pub fn parse_comment(
    _ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    _caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    while let Some((_, raw)) = source.next() {
        let (indent, body) = scan_line(raw);
        if !body.is_empty() && indent <= indent_level {
            return Ok(Parsed::new("", indent, body));
        }
    }
    Ok(Parsed::exhausted(""))
}

/// `-md`, `-rst`, `-scss` ... run the block body through the profile's transpiler.
pub fn parse_markup_language(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let lang = &caps["lang"];
    let Some(transpiler) = ctx.profile().transpiler(lang) else {
        return Err(CompileError::MissingTranspiler {
            lang: lang.to_string(),
            lineno: source.lineno(),
        });
    };
    let body = literal_block(ctx, indent_level, "|", false, source)?;
    let output = transpiler(&body.output).trim().to_string();
    Ok(Parsed::new(output, body.tail_indent, body.tail_line))
}
