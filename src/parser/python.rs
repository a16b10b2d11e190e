//! Embedded code blocks: `-py` / `-python` and the `---` form.

use regex::Captures;

use super::literal::literal_block;
use super::{Context, Parsed};
use crate::error::CompileError;
use crate::extract::extract_identifier;
use crate::source::Source;

/// `-py expr` or `-py!` (module level) with an optional indented body
pub fn parse_python(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let module_level = &caps["excl"] == "!";
    let inline = caps.name("expr").map(|m| m.as_str());
    python_block(ctx, indent_level, module_level, inline, source)
}

/// `--- expr ---` or `---!` followed by an indented body
pub fn parse_python_new_style(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let module_level = caps.name("excl").is_some();
    let inline = match caps.name("expr") {
        Some(expr) => {
            let placeholder = ctx.delimiters().placeholder();
            extract_identifier(expr.as_str(), source, "", &["---", "\n"], placeholder)?.map(|(code, _)| code)
        }
        None => None,
    };
    python_block(ctx, indent_level, module_level, inline.as_deref(), source)
}

fn python_block(
    ctx: &Context<'_>,
    indent_level: usize,
    module_level: bool,
    inline: Option<&str>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let d = ctx.delimiters();
    let inline = inline.map(str::trim).filter(|code| !code.is_empty());
    let body = literal_block(ctx, indent_level, "|", false, source)?;

    if inline.is_none() && body.output.is_empty() {
        return Ok(Parsed::new("", body.tail_indent, body.tail_line));
    }

    let mut output = d.code_start.clone();
    if module_level {
        output.push('!');
    }
    output.push('\n');
    if let Some(code) = inline {
        output.push_str(code);
        output.push('\n');
    }
    output.push_str(body.output.trim_end());
    output.push('\n');
    output.push_str(&d.code_end);
    output.push('\n');
    Ok(Parsed::new(output, body.tail_indent, body.tail_line))
}
