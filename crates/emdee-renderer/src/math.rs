//! LaTeX math typesetting to MathML via pulldown-latex.

use emdee_extensions::{ExtensionError, ExtensionId, ExtensionSource, LoadFuture};
use pulldown_latex::config::{DisplayMode, RenderConfig};
use pulldown_latex::mathml::push_mathml;
use pulldown_latex::{Parser, Storage};

use crate::error::RenderError;
use crate::state::escape_html;

/// Typeset `latex` (without delimiters) to MathML.
pub fn render_math(latex: &str, display: bool) -> Result<String, RenderError> {
    let storage = Storage::new();
    let events: Vec<_> = Parser::new(latex, &storage).collect();

    let errors: Vec<String> = events
        .iter()
        .filter_map(|event| event.as_ref().err().map(ToString::to_string))
        .collect();
    if !errors.is_empty() {
        return Err(RenderError::Math(errors.join("; ")));
    }

    let config = RenderConfig {
        display_mode: if display {
            DisplayMode::Block
        } else {
            DisplayMode::Inline
        },
        ..Default::default()
    };
    let mut mathml = String::new();
    push_mathml(&mut mathml, events.into_iter(), config)
        .map_err(|e| RenderError::Math(e.to_string()))?;
    Ok(mathml)
}

/// Escaped source shown in place of LaTeX that failed to typeset.
pub fn math_error_html(latex: &str, message: &str, display: bool) -> String {
    let mode = if display { "math-display" } else { "math-inline" };
    format!(
        r#"<span class="math math-error {mode}" title="{}"><code>{}</code></span>"#,
        escape_html(message),
        escape_html(latex)
    )
}

/// [`ExtensionSource`] for the capabilities built into this crate.
///
/// Loading math exercises the typesetter once, so the first document that
/// needs it does not pay the setup cost mid-render.
pub struct BuiltinExtensions;

impl ExtensionSource for BuiltinExtensions {
    fn load(&self, id: ExtensionId) -> LoadFuture {
        Box::pin(async move {
            match id {
                ExtensionId::Math => render_math(r"\frac{a}{b}", true)
                    .map(drop)
                    .map_err(|e| ExtensionError::new(id, e.to_string())),
            }
        })
    }
}
