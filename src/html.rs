//! HTML vocabulary used by the tag emitters.

/// Tags emitted in self-closing form, never with a closing tag.
const VOID_ELEMENTS: &[&str] = &[
    "meta", "img", "link", "input", "area", "base", "col", "br", "hr",
];

/// `doctype <key>` lines, keyed by the identifier after `doctype`.
const DOCTYPES: &[(&str, &str)] = &[
    ("html", "<!DOCTYPE html>"),
    ("5", "<!DOCTYPE html>"),
    ("1.1", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#),
    ("strict", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#),
    ("xml", r#"<?xml version="1.0" encoding="utf-8" ?>"#),
    ("transitional", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#),
    ("frameset", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#),
    ("basic", r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#),
    ("mobile", r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#),
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Declaration for a doctype key; unknown keys fall back to HTML5.
pub fn doctype(key: &str) -> &'static str {
    DOCTYPES
        .iter()
        .find(|(k, _)| *k == key)
        .map_or("<!DOCTYPE html>", |(_, declaration)| *declaration)
}
