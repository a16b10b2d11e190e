//! Transpilers for `-lang` blocks.
//!
//! Only Markdown ships with the crate. Other languages (`rst`, `coffee`, `scss`,
//! `stylus` ...) are wired in per profile with [`Profile::register_markup`].
//!
//! [`Profile::register_markup`]: crate::Profile::register_markup

use pulldown_cmark::{Options, Parser, html};

/// Turns the body of a `-lang` block into HTML (or CSS / JS wrapped in a tag)
pub type Transpiler = fn(&str) -> String;

/// Markdown to HTML
pub fn markdown(source: &str) -> String {
    let options = Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_FOOTNOTES;
    let parser = Parser::new_ext(source, options);
    let mut out = String::with_capacity(source.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

pub(crate) fn builtin_transpiler(lang: &str) -> Option<Transpiler> {
    match lang {
        "md" | "markdown" => Some(markdown),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown() {
        let html = markdown("# Title\n\nSome *emphasis* here.\n");
        assert!(html.contains("<h1>Title</h1>"));
        assert!(html.contains("<p>Some <em>emphasis</em> here.</p>"));
    }

    #[test]
    fn test_builtin_languages() {
        assert!(builtin_transpiler("md").is_some());
        assert!(builtin_transpiler("markdown").is_some());
        assert!(builtin_transpiler("scss").is_none());
    }
}
