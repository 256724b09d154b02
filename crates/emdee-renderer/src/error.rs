//! Error types for rendering internals.

/// Failure inside a rendering stage.
///
/// Never returned to callers of [`render`](crate::Pipeline::render): every
/// variant is recovered by a local fallback and logged.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Syntax highlighting failed for a code block.
    #[error("Highlighting failed: {0}")]
    Highlight(#[from] syntect::Error),

    /// LaTeX could not be typeset.
    #[error("Math error: {0}")]
    Math(String),

    /// A stage panicked.
    #[error("Renderer panicked: {0}")]
    Panicked(String),
}
