//! Markdown to sanitized HTML for the document reader.
//!
//! This crate provides a generic [`MarkdownRenderer`] driven by the
//! [`RenderBackend`] trait, and a [`Pipeline`] that wraps it with everything a
//! displayed document needs.
//!
//! # Architecture
//!
//! [`Pipeline::render`] runs, in order:
//! - front-matter removal ([`strip_front_matter`])
//! - the pulldown-cmark event loop with [`HtmlBackend`] (heading permalinks,
//!   highlighted code, wrapped tables, hardened links, math once ready)
//! - asset URI resolution through an [`AssetResolver`]
//! - allow-list sanitization ([`Sanitizer`]), on every path including failures
//! - heading extraction from the sanitized markup
//!
//! Results are memoized by a hash of everything that determines them.
//!
//! # Example
//!
//! ```
//! use emdee_extensions::Capabilities;
//! use emdee_renderer::Pipeline;
//!
//! let pipeline = Pipeline::default();
//! let result = pipeline.render("# Hello\n\n**Bold** text", None, Capabilities::none());
//! assert_eq!(result.headings[0].id, "hello");
//! assert!(result.html.contains("<strong>Bold</strong>"));
//! ```

mod assets;
mod backend;
mod error;
mod front_matter;
pub mod highlight;
mod html;
mod math;
mod memo;
mod pipeline;
mod renderer;
mod sanitize;
mod state;
mod util;

pub use assets::{
    AssetProtocolResolver, AssetResolver, FileUriResolver, is_relative_reference,
    resolve_reference,
};
pub use backend::RenderBackend;
pub use error::RenderError;
pub use front_matter::strip_front_matter;
pub use html::{HtmlBackend, PERMALINK_CLASS, PERMALINK_SYMBOL};
pub use math::{BuiltinExtensions, render_math};
pub use memo::{DEFAULT_MEMO_ENTRIES, RenderKey, RenderMemo};
pub use pipeline::{FALLBACK_CLASS, Pipeline, RenderOptions, RenderResult, render};
pub use renderer::{AssetContext, MarkdownRenderer};
pub use sanitize::{Sanitizer, URL_SCHEMES, sanitize};
pub use state::{FALLBACK_SLUG, escape_html, slugify};
pub use util::is_external_url;
