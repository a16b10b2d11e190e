use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::error::CompileError;
use crate::extract::Braces;
use crate::markup::{self, Transpiler};
use crate::parser::{Context, Parsed, literal, mako, python, statement, tag};
use crate::source::Source;

/// Parser entry point: `(ctx, indent_level, line, captures, source)`.
///
/// `line` is the body of the matched line and `captures` the rule's match on it.
/// The parser consumes what it owns from `source` and hands back the first line it
/// does not own as [`Parsed::tail_line`].
pub type ParseFn =
    fn(&Context<'_>, usize, &str, &Captures<'_>, &mut Source<'_>) -> Result<Parsed, CompileError>;

/// Dialect-specific strings the emitters are built from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Delimiters {
    pub variable_start: String,
    pub variable_end: String,
    /// Opens a statement line (`%` in `%if x:`)
    pub statement_start: String,
    /// Closes a statement line (`:` in `%if x:`)
    pub statement_start_end: String,
    pub statement_end_start: String,
    pub statement_end_end: String,
    /// Inline code tag used by `-return`, `-continue`, `-break` and python blocks
    pub code_start: String,
    pub code_end: String,
    /// Filter that disables escaping (`==` content, boolean attributes)
    pub no_escape: String,
    /// Separator placed between the no-escape filter and filters already on an expression
    pub filter_separator: String,
}

impl Default for Delimiters {
    fn default() -> Self {
        Self::mako()
    }
}

impl Delimiters {
    pub fn mako() -> Self {
        Self {
            variable_start: "${".into(),
            variable_end: "}".into(),
            statement_start: "%".into(),
            statement_start_end: ":".into(),
            statement_end_start: "%".into(),
            statement_end_end: String::new(),
            code_start: "<%".into(),
            code_end: "%>".into(),
            no_escape: "n".into(),
            filter_separator: ",".into(),
        }
    }

    pub fn django() -> Self {
        Self {
            variable_start: "{{".into(),
            variable_end: "}}".into(),
            statement_start: "{% ".into(),
            statement_start_end: " %}".into(),
            statement_end_start: "{% ".into(),
            statement_end_end: " %}".into(),
            code_start: "{%".into(),
            code_end: "%}".into(),
            no_escape: "safe".into(),
            filter_separator: "|".into(),
        }
    }

    /// Brace mode for placeholder expressions written with these delimiters
    pub fn placeholder(&self) -> Braces<'_> {
        Braces::Placeholder {
            start: &self.variable_start,
            end: &self.variable_end,
        }
    }
}

/// One entry of the dispatch table
#[derive(Clone)]
pub struct Rule {
    name: Cow<'static, str>,
    pattern: Regex,
    parse: ParseFn,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

impl Rule {
    /// Build a rule. The pattern is anchored at the start of the line.
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        pattern: &str,
        parse: ParseFn,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: Regex::new(&format!("^(?:{})", pattern))?,
            parse,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    pub(crate) fn parse(&self) -> ParseFn {
        self.parse
    }
}

lazy_static! {
    static ref STANDARD_RULES: Vec<Rule> = {
        let table: [(&'static str, &str, ParseFn); 19] = [
            ("style_script", r"(?i)(?:style|script).*", tag::parse_style_script),
            ("doctype", r"(?i)doctype\s+(?P<type>[0-9a-z\.]+)", tag::parse_doctype),
            ("handlebars", r"handlebars.*", tag::parse_handlebars),
            ("tag_tree", r"(?:#|\.|[a-z][a-z0-9]*).*", tag::parse_tag_tree),
            ("explicit_literal", r"[|,].*", literal::parse_explicit_literal),
            (
                "implicit_literal",
                r"(?P<line>(?:\$?\{|\(|\[|&.+;|[0-9]+|[^\x21-\x7E]|[A-Z]).*)",
                literal::parse_implicit_literal,
            ),
            ("raw_html", r"<.*", literal::parse_raw_html),
            (
                "variable",
                r"=(?P<prevent_escape>=)?(?P<explicit_space>,)?\s*(?P<line>.*)",
                literal::parse_variable,
            ),
            ("comment", r"/.*", literal::parse_comment),
            (
                "statements",
                r"-\s*(?P<stmnt>if|for|while|with|try)(?P<expr>.*)",
                statement::parse_statements,
            ),
            (
                "foreign_statements",
                r"-\s*(?P<stmnt>unless|until)(?P<expr>.*)",
                statement::parse_foreign_statements,
            ),
            (
                "python_new",
                r"---[-]*(?P<excl>!)?\s*(?P<expr>[^-].*)?",
                python::parse_python_new_style,
            ),
            (
                "python",
                r"-\s*(?P<python>py(?:thon)?(?P<excl>!?))(?P<expr>\s+.*)?",
                python::parse_python,
            ),
            ("def_block", r"-\s*(?P<line>(?:def|block)(?:\s+.*)?)", mako::parse_def_block),
            (
                "mako_one_liners",
                r"-\s*(?P<line>(?:include|inherit|page|namespace)(?:\s+.*)?)",
                mako::parse_one_liners,
            ),
            ("mako_text", r"-\s*(?P<line>text(?:\s+.*)?)", mako::parse_text),
            ("call", r"-\s*(?P<line>call(?:\s+.*)?)", mako::parse_call),
            (
                "early_return",
                r"-\s*(?P<keyword>return|continue|break)\s*",
                statement::parse_early_return,
            ),
            (
                "markup_languages",
                r"-\s*(?P<lang>md|markdown|rst|rest|coffee|scss|sass|stylus)\s*",
                literal::parse_markup_language,
            ),
        ];
        table
            .into_iter()
            .map(|(name, pattern, parse)| Rule::new(name, pattern, parse).unwrap())
            .collect()
    };
}

/// Rules that only make sense for the Mako dialect
const MAKO_ONLY_RULES: &[&str] = &["mako_one_liners", "mako_text", "call"];

/// A target dialect: delimiters, the ordered dispatch table and markup transpilers.
#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    delimiters: Delimiters,
    rules: Vec<Rule>,
    markup: HashMap<String, Transpiler>,
}

impl Default for Profile {
    fn default() -> Self {
        Self::mako()
    }
}

impl Profile {
    pub fn mako() -> Self {
        Self {
            name: "mako".into(),
            delimiters: Delimiters::mako(),
            rules: STANDARD_RULES.clone(),
            markup: HashMap::new(),
        }
    }

    pub fn django() -> Self {
        let mut profile = Self {
            name: "django".into(),
            delimiters: Delimiters::django(),
            ..Self::mako()
        };
        for name in MAKO_ONLY_RULES {
            profile = profile.without_rule(name);
        }
        profile
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn delimiters(&self) -> &Delimiters {
        &self.delimiters
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Put `rule` in front of the table, so it wins over every existing rule.
    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.insert(0, rule);
        self
    }

    /// Drop every rule with the given name
    pub fn without_rule(mut self, name: &str) -> Self {
        self.rules.retain(|rule| rule.name() != name);
        self
    }

    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Register a transpiler for `-lang` blocks. Overrides the built-in ones.
    pub fn register_markup(&mut self, lang: impl Into<String>, transpiler: Transpiler) -> &mut Self {
        self.markup.insert(lang.into(), transpiler);
        self
    }

    pub fn transpiler(&self, lang: &str) -> Option<Transpiler> {
        self.markup
            .get(lang)
            .copied()
            .or_else(|| markup::builtin_transpiler(lang))
    }

    /// First rule whose pattern matches `line`, with its captures
    pub fn dispatch<'l>(&self, line: &'l str) -> Option<(&Rule, Captures<'l>)> {
        self.rules
            .iter()
            .find_map(|rule| rule.pattern.captures(line).map(|caps| (rule, caps)))
    }
}

/// Build a named profile with `custom_rules` placed ahead of the standard table.
///
/// Custom rules keep their relative order and are not deduplicated against the
/// standard ones.
pub fn make_profile(name: &str, custom_rules: Vec<Rule>) -> Result<Profile, CompileError> {
    let mut profile = match name {
        "mako" => Profile::mako(),
        "django" => Profile::django(),
        other => return Err(CompileError::UnknownProfile { name: other.to_string() }),
    };
    let mut rules = custom_rules;
    rules.append(&mut profile.rules);
    profile.rules = rules;
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_for(line: &str) -> String {
        let profile = Profile::mako();
        let (rule, _) = profile.dispatch(line).unwrap_or_else(|| panic!("no rule for {line:?}"));
        rule.name().to_string()
    }

    #[test]
    fn test_dispatch_order() {
        assert_eq!(rule_for("script src=\"a.js\""), "style_script");
        assert_eq!(rule_for("STYLE"), "style_script");
        assert_eq!(rule_for("doctype html"), "doctype");
        assert_eq!(rule_for("handlebars#tpl"), "handlebars");
        assert_eq!(rule_for("div.cls"), "tag_tree");
        assert_eq!(rule_for("#main"), "tag_tree");
        assert_eq!(rule_for(".item"), "tag_tree");
        assert_eq!(rule_for("| text"), "explicit_literal");
        assert_eq!(rule_for(", text"), "explicit_literal");
        assert_eq!(rule_for("Hello"), "implicit_literal");
        assert_eq!(rule_for("${x}"), "implicit_literal");
        assert_eq!(rule_for("&nbsp;"), "implicit_literal");
        assert_eq!(rule_for("42 items"), "implicit_literal");
        assert_eq!(rule_for("Привет"), "implicit_literal");
        assert_eq!(rule_for("<br>"), "raw_html");
        assert_eq!(rule_for("== x"), "variable");
        assert_eq!(rule_for("/ note"), "comment");
        assert_eq!(rule_for("- if x"), "statements");
        assert_eq!(rule_for("-unless x"), "foreign_statements");
        assert_eq!(rule_for("--- x = 1"), "python_new");
        assert_eq!(rule_for("-py! import os"), "python");
        assert_eq!(rule_for("-def title()"), "def_block");
        assert_eq!(rule_for("-include a.html"), "mako_one_liners");
        assert_eq!(rule_for("-text"), "mako_text");
        assert_eq!(rule_for("-call ns:d"), "call");
        assert_eq!(rule_for("-break"), "early_return");
        assert_eq!(rule_for("-md"), "markup_languages");
    }

    #[test]
    fn test_statement_captures() {
        let profile = Profile::mako();
        let (_, caps) = profile.dispatch("- if 1").unwrap();
        assert_eq!(&caps["expr"], " 1");
        let (_, caps) = profile.dispatch("-for i in [1,2,3,4,5]").unwrap();
        assert_eq!(&caps["expr"], " i in [1,2,3,4,5]");
    }

    #[test]
    fn test_unknown_line() {
        assert!(Profile::mako().dispatch("?what").is_none());
        assert!(Profile::mako().dispatch("-bogus").is_none());
    }

    #[test]
    fn test_django_drops_mako_only_rules() {
        let profile = Profile::django();
        assert_eq!(profile.delimiters().variable_start, "{{");
        for name in MAKO_ONLY_RULES {
            assert!(profile.rules().iter().all(|r| r.name() != *name));
        }
        assert_eq!(profile.rules().len(), STANDARD_RULES.len() - MAKO_ONLY_RULES.len());
        assert!(profile.dispatch("-include a.html").is_none());
    }

    #[test]
    fn test_make_profile_prepends_custom_rules() {
        let custom = Rule::new("display_comment", r"/!.*", literal::parse_comment).unwrap();
        let profile = make_profile("mako", vec![custom]).unwrap();
        assert_eq!(profile.rules()[0].name(), "display_comment");
        assert_eq!(profile.rules().len(), STANDARD_RULES.len() + 1);

        let err = make_profile("jinja", vec![]).unwrap_err();
        assert_eq!(err, CompileError::UnknownProfile { name: "jinja".into() });
    }

    #[test]
    fn test_delimiters_partial_override() {
        let delimiters: Delimiters = serde_json::from_str(r#"{"variable_start": "<<", "variable_end": ">>"}"#).unwrap();
        assert_eq!(delimiters.variable_start, "<<");
        assert_eq!(delimiters.statement_start, "%");
    }

    #[test]
    fn test_builtin_markdown_transpiler() {
        let profile = Profile::mako();
        assert!(profile.transpiler("md").is_some());
        assert!(profile.transpiler("rst").is_none());

        let mut profile = Profile::mako();
        profile.register_markup("rst", |src| format!("<pre>{}</pre>", src));
        assert!(profile.transpiler("rst").is_some());
    }
}
