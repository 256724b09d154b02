//! Full render: front matter, markdown, sanitization, headings.
//!
//! [`Pipeline::render`] never fails. Anything that goes wrong inside the
//! markdown stage, including a panic in a third-party crate, degrades to the
//! escaped source text. Sanitization runs on every path.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::{Arc, LazyLock, Mutex, PoisonError};

use emdee_extensions::{Capabilities, ExtensionId};
use emdee_toc::{DEFAULT_MAX_LEVEL, Heading, extract_headings_up_to};

use crate::assets::AssetResolver;
use crate::error::RenderError;
use crate::front_matter::strip_front_matter;
use crate::highlight;
use crate::html::HtmlBackend;
use crate::memo::{DEFAULT_MEMO_ENTRIES, RenderKey, RenderMemo};
use crate::renderer::{AssetContext, MarkdownRenderer};
use crate::sanitize::Sanitizer;
use crate::state::escape_html;

/// Class of the `<pre>` shown when rendering fails.
pub const FALLBACK_CLASS: &str = "render-fallback";

/// Rendering switches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderOptions {
    /// Typeset math once the math extension is ready.
    pub math: bool,
    /// Syntax-highlight fenced code with a known language.
    pub highlight: bool,
    /// Typographic quotes and dashes.
    pub smart_punctuation: bool,
    /// Link bare URLs and email addresses.
    pub linkify: bool,
    /// Deepest heading level listed in [`RenderResult::headings`].
    pub max_heading_level: u8,
    /// Number of memoized renders.
    pub memo_entries: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            math: true,
            highlight: true,
            smart_punctuation: true,
            linkify: true,
            max_heading_level: DEFAULT_MAX_LEVEL,
            memo_entries: DEFAULT_MEMO_ENTRIES,
        }
    }
}

/// Sanitized HTML and the headings it contains.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderResult {
    pub html: String,
    /// Headings in document order, ids matching the `id` attributes in `html`.
    pub headings: Vec<Heading>,
}

/// Markdown to sanitized HTML, with memoization.
pub struct Pipeline {
    options: RenderOptions,
    resolver: Option<Arc<dyn AssetResolver>>,
    sanitizer: Sanitizer,
    memo: Mutex<RenderMemo>,
}

impl Pipeline {
    /// Create a pipeline without asset resolution.
    #[must_use]
    pub fn new(options: RenderOptions) -> Self {
        let memo = Mutex::new(RenderMemo::new(options.memo_entries));
        Self {
            options,
            resolver: None,
            sanitizer: Sanitizer::default(),
            memo,
        }
    }

    /// Resolve relative image references through `resolver`.
    ///
    /// The resolver's scheme is added to the sanitizer allow-list.
    #[must_use]
    pub fn with_resolver(mut self, resolver: Arc<dyn AssetResolver>) -> Self {
        self.sanitizer = Sanitizer::new(Some(resolver.scheme()));
        self.resolver = Some(resolver);
        self.clear_memo();
        self
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Load syntax definitions ahead of the first highlighted block.
    pub fn warm_up(&self) {
        if self.options.highlight {
            highlight::warm_up();
        }
    }

    /// Drop every memoized result.
    pub fn clear_memo(&self) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Render `raw_text` with the given capability snapshot.
    ///
    /// `source_location` is the path of the document; its directory is the
    /// base for relative image references.
    pub fn render(
        &self,
        raw_text: &str,
        source_location: Option<&Path>,
        capabilities: Capabilities,
    ) -> Arc<RenderResult> {
        let hash = RenderKey {
            raw_text,
            source_location,
            capabilities,
            resolver_scheme: self.resolver.as_ref().map_or("", |r| r.scheme()),
        }
        .compute_hash();

        if let Some(hit) = self
            .memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&hash)
        {
            return hit;
        }
        tracing::debug!(hash = %hash, "Render memo miss");

        let result = Arc::new(self.assemble(raw_text, || {
            self.render_markdown(strip_front_matter(raw_text), source_location, capabilities)
        }));
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(hash, Arc::clone(&result));
        result
    }

    fn render_markdown(
        &self,
        text: &str,
        source_location: Option<&Path>,
        capabilities: Capabilities,
    ) -> String {
        if text.is_empty() {
            return String::new();
        }
        let math = self.options.math && capabilities.is_ready(ExtensionId::Math);
        let mut renderer = MarkdownRenderer::<HtmlBackend>::new()
            .with_math(math)
            .with_highlight(self.options.highlight)
            .with_smart_punctuation(self.options.smart_punctuation)
            .with_linkify(self.options.linkify);

        if let (Some(resolver), Some(directory)) = (
            &self.resolver,
            source_location.and_then(Path::parent),
        ) {
            renderer = renderer.with_assets(AssetContext {
                directory: directory.to_path_buf(),
                resolver: Arc::clone(resolver),
            });
        }
        renderer.render_markdown(text)
    }

    /// Run the markdown stage under a panic guard, then sanitize and
    /// collect headings.
    fn assemble(&self, raw_text: &str, markdown_stage: impl FnOnce() -> String) -> RenderResult {
        let html = panic::catch_unwind(AssertUnwindSafe(markdown_stage)).unwrap_or_else(|payload| {
            let error = RenderError::Panicked(panic_message(payload.as_ref()));
            tracing::warn!(error = %error, "Rendering failed, showing source text");
            fallback_html(raw_text)
        });

        let html = self.sanitizer.clean(&html);
        let headings = extract_headings_up_to(&html, self.options.max_heading_level);
        RenderResult { html, headings }
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(RenderOptions::default())
    }
}

static DEFAULT_PIPELINE: LazyLock<Pipeline> = LazyLock::new(Pipeline::default);

/// Render with default options and no asset resolution.
pub fn render(
    raw_text: &str,
    source_location: Option<&Path>,
    capabilities: Capabilities,
) -> Arc<RenderResult> {
    DEFAULT_PIPELINE.render(raw_text, source_location, capabilities)
}

/// Escaped source text shown when rendering fails.
fn fallback_html(raw_text: &str) -> String {
    format!(
        r#"<pre class="{FALLBACK_CLASS}">{}</pre>"#,
        escape_html(raw_text)
    )
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_owned()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_owned()
    }
}
