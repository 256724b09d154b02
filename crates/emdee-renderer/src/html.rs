//! HTML backend for markdown rendering.
//!
//! Produces the markup the reader's stylesheet expects: `hljs-block` code
//! containers, headings with a trailing `header-anchor` permalink,
//! scroll-wrapped tables and hardened external links.

use std::fmt::Write;

pub use emdee_toc::PERMALINK_CLASS;

use crate::backend::RenderBackend;
use crate::highlight;
use crate::math::{math_error_html, render_math};
use crate::state::escape_html;
use crate::util::is_external_url;

/// Glyph shown by the permalink anchor.
pub const PERMALINK_SYMBOL: &str = "#";

/// HTML render backend.
pub struct HtmlBackend;

impl RenderBackend for HtmlBackend {
    fn code_block(lang: Option<&str>, content: &str, highlight_enabled: bool, out: &mut String) {
        if let Some(lang) = lang.filter(|_| highlight_enabled)
            && let Some(syntax) = highlight::find_language(lang)
        {
            match highlight::highlight(content, syntax) {
                Ok(html) => {
                    let _ = write!(
                        out,
                        r#"<pre class="hljs-block"><code class="hljs language-{}">{html}</code></pre>"#,
                        escape_html(lang)
                    );
                    return;
                }
                Err(e) => {
                    tracing::debug!(lang, error = %e, "Highlighting failed, emitting plain code");
                }
            }
        }

        let _ = write!(
            out,
            r#"<pre class="hljs-block"><code class="hljs">{}</code></pre>"#,
            escape_html(content)
        );
    }

    fn heading(level: u8, id: &str, content_html: &str, out: &mut String) {
        let _ = write!(
            out,
            r##"<h{level} id="{id}">{} <a class="{PERMALINK_CLASS}" href="#{id}" aria-hidden="true">{PERMALINK_SYMBOL}</a></h{level}>"##,
            content_html.trim()
        );
    }

    fn image(src: &str, alt: &str, title: &str, out: &mut String) {
        let title_attr = if title.is_empty() {
            String::new()
        } else {
            format!(r#" title="{}""#, escape_html(title))
        };
        let _ = write!(
            out,
            r#"<img src="{}" alt="{}"{title_attr}>"#,
            escape_html(src),
            escape_html(alt)
        );
    }

    fn link_start(href: &str, title: &str, out: &mut String) {
        let _ = write!(out, r#"<a href="{}""#, escape_html(href));
        if !title.is_empty() {
            let _ = write!(out, r#" title="{}""#, escape_html(title));
        }
        if is_external_url(href) {
            out.push_str(r#" target="_blank" rel="noopener noreferrer""#);
        }
        out.push('>');
    }

    fn math(latex: &str, display: bool, out: &mut String) {
        match render_math(latex, display) {
            Ok(mathml) => out.push_str(&mathml),
            Err(e) => {
                tracing::debug!(error = %e, "Math left as source");
                out.push_str(&math_error_html(latex, &e.to_string(), display));
            }
        }
    }

    fn table_start(out: &mut String) {
        out.push_str(r#"<div class="table-wrapper"><table>"#);
    }

    fn table_end(out: &mut String) {
        out.push_str("</tbody></table></div>");
    }
}
