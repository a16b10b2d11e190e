//! Tag headlines and the tag-like special forms.

use regex::Captures;

use super::literal::literal_block;
use super::{Context, Parsed, parse_nested, parse_tail};
use crate::error::CompileError;
use crate::extract::{Rename, extract_tag_line};
use crate::html::doctype;
use crate::source::Source;

const HANDLEBARS: Rename<'static> = Rename {
    name: "script",
    leading_attribute: r#"type="text/x-handlebars""#,
};

/// A tag with its children: the nested block, or the rest of the headline after `:`.
pub fn parse_tag_tree(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    _caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    tag_tree(ctx, indent_level, line.trim(), source, None)
}

/// `handlebars#id` becomes a `<script type="text/x-handlebars">` element.
pub fn parse_handlebars(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    _caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    tag_tree(ctx, indent_level, line.trim(), source, Some(HANDLEBARS))
}

fn tag_tree(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    source: &mut Source<'_>,
    rename: Option<Rename<'_>>,
) -> Result<Parsed, CompileError> {
    let tag = extract_tag_line(ctx, line, source, rename)?;
    let mut output = tag.open;

    let children = if tag.tail.is_empty() {
        parse_nested(ctx, indent_level, source)?
    } else {
        parse_tail(ctx, indent_level, &tag.tail, source)?
    };
    output.push_str(&children.output);
    output.push_str(&tag.close);

    Ok(Parsed::new(output, children.tail_indent, children.tail_line))
}

/// `style` and `script` bodies are copied verbatim.
pub fn parse_style_script(
    ctx: &Context<'_>,
    indent_level: usize,
    line: &str,
    _caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let tag = extract_tag_line(ctx, line.trim(), source, None)?;
    let body = literal_block(ctx, indent_level, "|", false, source)?;

    let mut output = tag.open;
    output.push('\n');
    output.push_str(&body.output);
    output.push_str(&tag.close);
    Ok(Parsed::new(output, body.tail_indent, body.tail_line))
}

pub fn parse_doctype(
    _ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    _source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let key = caps["type"].to_lowercase();
    Ok(Parsed::new(doctype(&key), indent_level, ""))
}
