//! Control statements: `-if`, `-for`, `-while`, `-with`, `-try`, their negated
//! forms `-unless` / `-until`, and `-return` / `-continue` / `-break`.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use super::{Context, Parsed, dispatch, parse_tail};
use crate::error::CompileError;
use crate::extract::{extract_identifier, extract_statement_expression, skip_first};
use crate::source::{Source, scan_line};

lazy_static! {
    static ref ELIF_ELSE: Regex = Regex::new(r"^-\s*(?P<control>elif|else)(?P<expr>.*)").unwrap();
    static ref EXCEPT_ELSE_FINALLY: Regex =
        Regex::new(r"^-\s*(?P<control>except|else|finally)(?P<expr>.*)").unwrap();
}

pub fn parse_statements(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let expr = caps.name("expr").map_or("", |m| m.as_str());
    statement_block(ctx, indent_level, &caps["stmnt"], expr, source)
}

/// `-unless expr` is `-if not (expr)`, `-until expr` is `-while not (expr)`.
pub fn parse_foreign_statements(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let keyword = if &caps["stmnt"] == "unless" { "if" } else { "while" };
    let expr = extract_statement_expression(&caps["expr"], source)?;
    statement_block(ctx, indent_level, keyword, &format!(" not ({})", expr), source)
}

pub fn parse_early_return(
    ctx: &Context<'_>,
    indent_level: usize,
    _line: &str,
    caps: &Captures<'_>,
    _source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let d = ctx.delimiters();
    let output = format!("\n{} {} {}\n", d.code_start, &caps["keyword"], d.code_end);
    Ok(Parsed::new(output, indent_level, ""))
}

/// Split `expr: inline body` into the statement expression and the inline body.
fn split_statement(expr: &str, ctx: &Context<'_>, source: &mut Source<'_>) -> Result<(String, String), CompileError> {
    let expr = extract_statement_expression(expr, source)?;
    match extract_identifier(&expr, source, "", &[":", "\n"], ctx.delimiters().placeholder())? {
        Some((head, rest)) => Ok((head.trim_start().to_string(), skip_first(&rest).trim_start().to_string())),
        None => Ok((String::new(), String::new())),
    }
}

fn statement_block(
    ctx: &Context<'_>,
    indent_level: usize,
    keyword: &str,
    expr: &str,
    source: &mut Source<'_>,
) -> Result<Parsed, CompileError> {
    let d = ctx.delimiters();
    let mut output = format!("\n{}{}", d.statement_start, keyword);

    let (mut tail_indent, mut tail_line) = if expr.trim().is_empty() {
        output.push_str(&d.statement_start_end);
        output.push('\n');
        (indent_level, String::new())
    } else {
        let (expr, inline) = split_statement(expr, ctx, source)?;
        output.push(' ');
        output.push_str(&expr);
        output.push_str(&d.statement_start_end);
        output.push('\n');
        let body = parse_tail(ctx, indent_level, &inline, source)?;
        output.push_str(&body.output);
        (body.tail_indent, body.tail_line)
    };

    let close = |mut output: String, tail_indent: usize, tail_line: String| -> Result<Parsed, CompileError> {
        output.push_str(&format!("\n{}end{}{}\n", d.statement_end_start, keyword, d.statement_end_end));
        Ok(Parsed::new(output, tail_indent, tail_line))
    };

    // set once `else` (for `if`) or `finally` (for `try`) has been emitted
    let mut last_clause = false;

    loop {
        while !tail_line.is_empty() {
            if tail_indent < indent_level {
                return close(output, tail_indent, tail_line);
            }

            if tail_indent == indent_level {
                let clause = match keyword {
                    _ if last_clause => None,
                    "if" => ELIF_ELSE.captures(&tail_line),
                    "try" => EXCEPT_ELSE_FINALLY.captures(&tail_line),
                    _ => None,
                };
                let Some(clause) = clause else {
                    return close(output, tail_indent, tail_line);
                };
                let control = clause["control"].to_string();
                let clause_expr = clause["expr"].to_string();
                last_clause = matches!((keyword, control.as_str()), ("if", "else") | (_, "finally"));

                let (clause_expr, inline) = match control.as_str() {
                    "elif" | "except" => split_statement(&clause_expr, ctx, source)?,
                    _ => {
                        let inline = match extract_identifier(&clause_expr, source, "", &[":", "\n"], d.placeholder())? {
                            Some((_, rest)) => skip_first(&rest).trim_start().to_string(),
                            None => String::new(),
                        };
                        (String::new(), inline)
                    }
                };

                output.push('\n');
                output.push_str(&d.statement_start);
                output.push_str(&control);
                if !clause_expr.is_empty() {
                    output.push(' ');
                    output.push_str(&clause_expr);
                }
                output.push_str(&d.statement_start_end);
                output.push('\n');

                let body = parse_tail(ctx, indent_level, &inline, source)?;
                output.push_str(&body.output);
                tail_indent = body.tail_indent;
                tail_line = body.tail_line;
                continue;
            }

            let parsed = dispatch(ctx, tail_indent, &tail_line, source)?;
            output.push_str(&parsed.output);
            tail_indent = parsed.tail_indent;
            tail_line = parsed.tail_line;
        }

        match source.next() {
            Some((_, raw)) => {
                let (indent, body) = scan_line(raw);
                tail_indent = indent;
                tail_line = body.to_string();
            }
            None => break,
        }
    }

    close(output, 0, String::new())
}

#[cfg(test)]
mod tests {
    use crate::{Profile, compile};

    fn mako(text: &str) -> String {
        compile(text, &Profile::mako()).unwrap()
    }

    fn django(text: &str) -> String {
        compile(text, &Profile::django()).unwrap()
    }

    #[test]
    fn test_if_else() {
        let plim = "- if user\n  p Hello\n- else\n  p Anon\n";
        assert_eq!(mako(plim), "%if user:\n<p>Hello</p>\n%else:\n<p>Anon</p>\n%endif");
        assert_eq!(
            django(plim),
            "{% if user %}\n<p>Hello</p>\n{% else %}\n<p>Anon</p>\n{% endif %}"
        );
    }

    #[test]
    fn test_elif_chain() {
        let plim = "-if a\n  | A\n-elif b\n  | B\n-else\n  | C\np";
        assert_eq!(
            mako(plim),
            "%if a:\nA\n%elif b:\nB\n%else:\nC\n%endif\n<p></p>"
        );
    }

    #[test]
    fn test_single_else() {
        let plim = "-if a\n  | A\n-else\n  | B\n-else\n  | C";
        let out = compile(plim, &Profile::mako());
        // the second else is not part of the statement and has no parser of its own
        assert!(out.is_err());
        assert_eq!(mako("-if a\n  | A\n-else\n  | B").matches("%else").count(), 1);
    }

    #[test]
    fn test_inline_bodies() {
        assert_eq!(mako("-if x: p y"), "%if x:\n<p>y</p>\n%endif");
        assert_eq!(mako("-if a: | A\n-else: | B"), "%if a:\nA\n%else:\nB\n%endif");
    }

    #[test]
    fn test_loops_close_on_dedent() {
        assert_eq!(
            mako("ul\n  -for i in items\n    li = i\n  p after"),
            "<ul>\n%for i in items:\n<li>${i}</li>\n%endfor\n<p>after</p></ul>"
        );
        assert_eq!(mako("-while x\n  | go"), "%while x:\ngo\n%endwhile");
        assert_eq!(mako("-with open(f) as fh\n  = fh"), "%with open(f) as fh:\n${fh}\n%endwith");
    }

    #[test]
    fn test_multiline_expression() {
        assert_eq!(
            mako("-for x in func(a,\n        b)\n  = x"),
            "%for x in func(a,b):\n${x}\n%endfor"
        );
    }

    #[test]
    fn test_try_clauses() {
        let plim = "-try\n  | a\n-except ValueError as e\n  | b\n-else\n  | c\n-finally\n  | d";
        assert_eq!(
            mako(plim),
            "%try:\na\n%except ValueError as e:\nb\n%else:\nc\n%finally:\nd\n%endtry"
        );
    }

    #[test]
    fn test_foreign_statements() {
        assert_eq!(mako("-unless x\n  | y"), mako("-if not (x)\n  | y"));
        assert_eq!(mako("-unless x\n  | y"), "%if not (x):\ny\n%endif");
        assert_eq!(mako("-until done\n  | y"), "%while not (done):\ny\n%endwhile");
    }

    #[test]
    fn test_early_return() {
        assert_eq!(mako("-return"), "<% return %>");
        assert_eq!(mako("-for x in y\n  -if x\n    -break"), "%for x in y:\n\n%if x:\n\n<% break %>\n\n%endif\n\n%endfor");
    }
}
