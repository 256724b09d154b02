//! Render backend trait for output-specific markup.
//!
//! The event loop in [`MarkdownRenderer`](crate::MarkdownRenderer) handles
//! block structure, inline formatting and state tracking. Elements whose
//! markup carries document-reader conventions (code blocks, headings with
//! permalinks, wrapped tables, hardened links, math) are delegated here.

/// Backend trait for format-specific rendering operations.
pub trait RenderBackend {
    /// Render a fenced or indented code block.
    ///
    /// # Arguments
    ///
    /// * `lang` - Fence language, if any
    /// * `content` - The code content
    /// * `highlight` - Whether syntax highlighting is enabled
    /// * `out` - Output buffer to write to
    fn code_block(lang: Option<&str>, content: &str, highlight: bool, out: &mut String);

    /// Render a complete heading element with its generated id.
    fn heading(level: u8, id: &str, content_html: &str, out: &mut String);

    /// Render an image.
    fn image(src: &str, alt: &str, title: &str, out: &mut String);

    /// Render a link start tag.
    fn link_start(href: &str, title: &str, out: &mut String);

    /// Render typeset math.
    fn math(latex: &str, display: bool, out: &mut String);

    /// Render table start. Tables are wrapped so wide ones can scroll.
    fn table_start(out: &mut String) {
        out.push_str("<table>");
    }

    /// Render table end.
    fn table_end(out: &mut String) {
        out.push_str("</tbody></table>");
    }

    /// Render a hard break.
    fn hard_break(out: &mut String) {
        out.push_str("<br>");
    }

    /// Render a horizontal rule.
    fn horizontal_rule(out: &mut String) {
        out.push_str("<hr>");
    }

    /// Render a task list marker.
    ///
    /// Default uses a disabled HTML checkbox.
    fn task_list_marker(checked: bool, out: &mut String) {
        if checked {
            out.push_str(r#"<input type="checkbox" checked disabled> "#);
        } else {
            out.push_str(r#"<input type="checkbox" disabled> "#);
        }
    }
}
