//! Compiler from Plim, a terse indentation-based markup, to Mako or Django templates.
//!
//! ```
//! use plim_transpiler::{Profile, compile};
//!
//! let mako = compile("ul#nav\n  li.active: a href=\"/\" = title\n", &Profile::mako()).unwrap();
//! assert_eq!(mako, r#"<ul id="nav"><li class="active"><a href="/">${title}</a></li></ul>"#);
//! ```

mod error;
pub mod extract;
mod html;
pub mod markup;
pub mod parser;
mod source;
pub mod syntax;

pub use error::CompileError;
pub use markup::Transpiler;
pub use parser::{Context, Parsed};
pub use source::{Source, scan_line};
pub use syntax::{Delimiters, ParseFn, Profile, Rule, make_profile};

/// Configuration for compilation.
#[derive(Debug, Clone)]
pub struct Options {
    /// Trim leading and trailing whitespace from the output (default: true)
    pub strip: bool,
    /// How deep backtick-embedded markup may nest (default: 64)
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            strip: true,
            max_depth: 64,
        }
    }
}

pub fn compile(source: &str, profile: &Profile) -> Result<String, CompileError> {
    compile_with(source, profile, Options::default())
}

pub fn compile_with(source: &str, profile: &Profile, options: Options) -> Result<String, CompileError> {
    let ctx = Context::new(profile, options.max_depth);
    parser::compile_source(&ctx, source, options.strip)
}
