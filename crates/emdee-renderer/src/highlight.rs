//! Class-based syntax highlighting for fenced code.

use std::sync::LazyLock;

use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use crate::error::RenderError;

/// Prefix of the token classes emitted inside highlighted blocks.
pub const CLASS_PREFIX: &str = "hl-";

static SYNTAXES: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

/// Look up a fence language by token (name or file extension).
pub fn find_language(token: &str) -> Option<&'static SyntaxReference> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    SYNTAXES.find_syntax_by_token(token)
}

/// Highlight `code` as `syntax`, returning `<span>` markup.
pub fn highlight(code: &str, syntax: &SyntaxReference) -> Result<String, RenderError> {
    let mut generator = ClassedHTMLGenerator::new_with_class_style(
        syntax,
        &SYNTAXES,
        ClassStyle::SpacedPrefixed {
            prefix: CLASS_PREFIX,
        },
    );
    for line in LinesWithEndings::from(code) {
        generator.parse_html_for_line_which_includes_newline(line)?;
    }
    Ok(generator.finalize())
}

/// Force the syntax set to load.
pub(crate) fn warm_up() {
    LazyLock::force(&SYNTAXES);
}
