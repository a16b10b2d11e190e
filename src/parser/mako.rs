//! Mako tags: `-def` / `-block`, `-include` and friends, `-text` and `-call`.

use regex::Captures;

use super::literal::literal_block;
use super::{Context, Parsed, parse_nested};
use crate::error::CompileError;
use crate::extract::extract_tag_line;
use crate::source::Source;

/// `-def name(args)` and `-block name` wrap their nested lines.
pub fn parse_def_block(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let tag = extract_tag_line(ctx, &caps["line"], source, None)?;

    let mut output = format!("<%{}", tag.name);
    let name = tag.content.trim();
    if !name.is_empty() {
        output.push_str(&format!(" name=\"{}\"", name));
    }
    if !tag.attributes.is_empty() {
        output.push(' ');
        output.push_str(&tag.attributes);
    }
    output.push_str(">\n");

    let body = parse_nested(ctx, indent_level, source)?;
    output.push_str(&body.output);
    output.push_str(&format!("</%{}>\n", tag.name));
    Ok(Parsed::new(output, body.tail_indent, body.tail_line))
}

/// `-include file`, `-inherit file`, `-page args`, `-namespace file`
pub fn parse_one_liners(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let tag = extract_tag_line(ctx, &caps["line"], source, None)?;

    let mut output = format!("<%{}", tag.name);
    if !tag.content.is_empty() {
        output.push_str(&format!(" file=\"{}\"", tag.content));
    }
    if !tag.attributes.is_empty() {
        output.push(' ');
        output.push_str(&tag.attributes);
    }
    output.push_str("/>");
    Ok(Parsed::new(output, indent_level, ""))
}

/// `-text` keeps its body away from the template engine.
pub fn parse_text(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let tag = extract_tag_line(ctx, &caps["line"], source, None)?;

    let mut output = format!("\n<%{}", tag.name);
    if !tag.attributes.is_empty() {
        output.push(' ');
        output.push_str(&tag.attributes);
    }
    output.push_str(">\n");
    if !tag.content.is_empty() {
        output.push_str(&tag.content);
        output.push('\n');
    }

    let body = literal_block(ctx, indent_level, "|", false, source)?;
    if !body.output.is_empty() {
        output.push_str(body.output.trim_end());
        output.push('\n');
    }
    output.push_str(&format!("</%{}>\n", tag.name));
    Ok(Parsed::new(output, body.tail_indent, body.tail_line))
}

/// `-call namespace:defname args` invokes a def with a body.
pub fn parse_call(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let tag = extract_tag_line(ctx, &caps["line"], source, None)?;
    let call = tag.content.trim();
    let Some(def_name) = call.split_whitespace().next() else {
        return Err(CompileError::syntax(
            "-call must contain namespace:defname declaration",
            line,
            source.lineno(),
        ));
    };

    let mut output = format!("\n<%{}", call);
    if !tag.attributes.is_empty() {
        output.push(' ');
        output.push_str(&tag.attributes);
    }
    output.push_str(">\n");

    let body = parse_nested(ctx, indent_level, source)?;
    output.push_str(&body.output);
    output.push_str(&format!("</%{}>\n", def_name));
    Ok(Parsed::new(output, body.tail_indent, body.tail_line))
}
