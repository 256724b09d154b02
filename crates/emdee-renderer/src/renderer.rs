//! Generic markdown renderer with pluggable backend.

use std::fmt::Write;
use std::marker::PhantomData;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use linkify::{LinkFinder, LinkKind};
use pulldown_cmark::{CodeBlockKind, Event, LinkType, Options, Parser, Tag, TagEnd, TextMergeStream};
use regex::Regex;

use crate::assets::{AssetResolver, resolve_reference};
use crate::backend::RenderBackend;
use crate::state::{CodeBlockState, HeadingState, ImageState, TableState, escape_html};
use crate::util::heading_level_to_num;

/// `id` attributes inside raw HTML, quoted or bare.
static RAW_HTML_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(?:^|\s)id\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#).unwrap()
});

/// Directory and resolver used to rewrite relative image references.
#[derive(Clone)]
pub struct AssetContext {
    pub directory: PathBuf,
    pub resolver: Arc<dyn AssetResolver>,
}

/// Generic markdown renderer with pluggable backend.
///
/// Uses the [`RenderBackend`] trait to delegate output-specific markup
/// while handling common elements (lists, inline formatting, tables) generically.
pub struct MarkdownRenderer<B: RenderBackend> {
    output: String,
    code: CodeBlockState,
    table: TableState,
    image: ImageState,
    heading: HeadingState,
    pending_image: Option<(String, String)>,
    assets: Option<AssetContext>,
    math: bool,
    highlight: bool,
    smart_punctuation: bool,
    linkify: bool,
    /// Nesting depth of open links; bare URLs are not linked inside one.
    link_depth: usize,
    _backend: PhantomData<B>,
}

impl<B: RenderBackend> MarkdownRenderer<B> {
    /// Create a renderer with highlighting, smart punctuation and bare URL
    /// linking enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            output: String::with_capacity(4096),
            code: CodeBlockState::default(),
            table: TableState::default(),
            image: ImageState::default(),
            heading: HeadingState::default(),
            pending_image: None,
            assets: None,
            math: false,
            highlight: true,
            smart_punctuation: true,
            linkify: true,
            link_depth: 0,
            _backend: PhantomData,
        }
    }

    /// Parse `$…$` and `$$…$$` as math.
    ///
    /// Only enable once the math capability is ready; otherwise dollar signs
    /// must stay literal text.
    #[must_use]
    pub fn with_math(mut self, enabled: bool) -> Self {
        self.math = enabled;
        self
    }

    /// Enable or disable syntax highlighting of fenced code.
    #[must_use]
    pub fn with_highlight(mut self, enabled: bool) -> Self {
        self.highlight = enabled;
        self
    }

    /// Enable or disable typographic quotes and dashes.
    #[must_use]
    pub fn with_smart_punctuation(mut self, enabled: bool) -> Self {
        self.smart_punctuation = enabled;
        self
    }

    /// Turn bare `http(s)://` URLs and email addresses in text into links.
    #[must_use]
    pub fn with_linkify(mut self, enabled: bool) -> Self {
        self.linkify = enabled;
        self
    }

    /// Rewrite relative image references through `context`.
    #[must_use]
    pub fn with_assets(mut self, context: AssetContext) -> Self {
        self.assets = Some(context);
        self
    }

    /// Get parser options for the current configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        let mut options =
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        if self.smart_punctuation {
            options |= Options::ENABLE_SMART_PUNCTUATION;
        }
        if self.math {
            options |= Options::ENABLE_MATH;
        }
        options
    }

    /// Create a configured parser for the given markdown text.
    #[must_use]
    pub fn create_parser<'a>(&self, markdown: &'a str) -> Parser<'a> {
        Parser::new_ext(markdown, self.parser_options())
    }

    /// Render markdown text directly using configured parser options.
    pub fn render_markdown(&mut self, markdown: &str) -> String {
        self.render(TextMergeStream::new(self.create_parser(markdown)))
    }

    /// Render markdown events and return the HTML.
    pub fn render<'a, I>(&mut self, events: I) -> String
    where
        I: Iterator<Item = Event<'a>>,
    {
        // Ids from raw HTML are taken before any heading is numbered, wherever
        // they appear in the document.
        let events: Vec<Event<'a>> = events.collect();
        for event in &events {
            if let Event::Html(html) | Event::InlineHtml(html) = event {
                for id in raw_html_ids(html) {
                    self.heading.reserve(id);
                }
            }
        }
        for event in events {
            self.process_event(event);
        }
        std::mem::take(&mut self.output)
    }

    /// Push content to output or heading buffer based on context.
    ///
    /// Markup inside image alt text is dropped; only its text is kept.
    fn push_inline(&mut self, content: &str) {
        if self.image.is_active() {
            return;
        }
        if self.heading.is_active() {
            self.heading.push_html(content);
        } else {
            self.output.push_str(content);
        }
    }

    fn process_event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => self.end_tag(tag),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => self.inline_code(&code),
            Event::Html(html) => self.output.push_str(&html),
            Event::InlineHtml(html) => self.push_inline(&html),
            Event::InlineMath(latex) => self.math(&latex, false),
            Event::DisplayMath(latex) => self.math(&latex, true),
            Event::SoftBreak => self.soft_break(),
            Event::HardBreak => {
                let mut br = String::new();
                B::hard_break(&mut br);
                self.push_inline(&br);
            }
            Event::Rule => B::horizontal_rule(&mut self.output),
            Event::TaskListMarker(checked) => B::task_list_marker(checked, &mut self.output),
            Event::FootnoteReference(_) => {
                // Not supported
            }
        }
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => self.output.push_str("<p>"),
            Tag::Heading { level, .. } => {
                // Opening tag is written in end_tag once the id is known.
                self.heading.start_heading(heading_level_to_num(level));
            }
            Tag::BlockQuote(_) => self.output.push_str("<blockquote>"),
            Tag::CodeBlock(kind) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|token| token.trim_matches(|c| c == '{' || c == '}').to_owned())
                        .filter(|token| !token.is_empty()),
                    CodeBlockKind::Indented => None,
                };
                self.code.start(lang);
            }
            Tag::List(start) => match start {
                Some(1) => self.output.push_str("<ol>"),
                Some(n) => {
                    let _ = write!(self.output, r#"<ol start="{n}">"#);
                }
                None => self.output.push_str("<ul>"),
            },
            Tag::Item => self.output.push_str("<li>"),
            Tag::FootnoteDefinition(_) | Tag::HtmlBlock | Tag::MetadataBlock(_) => {}
            Tag::DefinitionList => self.output.push_str("<dl>"),
            Tag::DefinitionListTitle => self.output.push_str("<dt>"),
            Tag::DefinitionListDefinition => self.output.push_str("<dd>"),
            Tag::Table(alignments) => {
                self.table.start(alignments);
                B::table_start(&mut self.output);
            }
            Tag::TableHead => {
                self.table.start_head();
                self.output.push_str("<thead><tr>");
            }
            Tag::TableRow => {
                self.table.start_row();
                self.output.push_str("<tr>");
            }
            Tag::TableCell => {
                let align = self.table.current_alignment_class();
                let tag = if self.table.is_in_head() { "th" } else { "td" };
                let _ = write!(self.output, "<{tag}{align}>");
            }
            Tag::Emphasis => self.push_inline("<em>"),
            Tag::Strong => self.push_inline("<strong>"),
            Tag::Strikethrough => self.push_inline("<s>"),
            Tag::Superscript => self.push_inline("<sup>"),
            Tag::Subscript => self.push_inline("<sub>"),
            Tag::Link {
                link_type,
                dest_url,
                title,
                ..
            } => {
                let href = if link_type == LinkType::Email {
                    format!("mailto:{dest_url}")
                } else {
                    dest_url.to_string()
                };
                let mut link = String::new();
                B::link_start(&href, &title, &mut link);
                self.push_inline(&link);
                self.link_depth += 1;
            }
            Tag::Image {
                dest_url, title, ..
            } => {
                // Alt text is collected until the matching end tag.
                if !self.image.is_active() {
                    self.pending_image = Some((dest_url.to_string(), title.to_string()));
                }
                self.image.start();
            }
        }
    }

    fn end_tag(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.output.push_str("</p>"),
            TagEnd::Heading(_) => {
                if let Some((level, id, html)) = self.heading.complete_heading() {
                    B::heading(level, &id, &html, &mut self.output);
                }
            }
            TagEnd::BlockQuote(_) => self.output.push_str("</blockquote>"),
            TagEnd::CodeBlock => {
                let (lang, content) = self.code.end();
                B::code_block(lang.as_deref(), &content, self.highlight, &mut self.output);
            }
            TagEnd::List(ordered) => {
                self.output
                    .push_str(if ordered { "</ol>" } else { "</ul>" });
            }
            TagEnd::Item => self.output.push_str("</li>"),
            TagEnd::FootnoteDefinition | TagEnd::HtmlBlock | TagEnd::MetadataBlock(_) => {}
            TagEnd::DefinitionList => self.output.push_str("</dl>"),
            TagEnd::DefinitionListTitle => self.output.push_str("</dt>"),
            TagEnd::DefinitionListDefinition => self.output.push_str("</dd>"),
            TagEnd::Table => B::table_end(&mut self.output),
            TagEnd::TableHead => {
                self.output.push_str("</tr></thead><tbody>");
                self.table.end_head();
            }
            TagEnd::TableRow => self.output.push_str("</tr>"),
            TagEnd::TableCell => {
                self.output.push_str(if self.table.is_in_head() {
                    "</th>"
                } else {
                    "</td>"
                });
                self.table.next_cell();
            }
            TagEnd::Emphasis => self.push_inline("</em>"),
            TagEnd::Strong => self.push_inline("</strong>"),
            TagEnd::Strikethrough => self.push_inline("</s>"),
            TagEnd::Superscript => self.push_inline("</sup>"),
            TagEnd::Subscript => self.push_inline("</sub>"),
            TagEnd::Link => {
                self.link_depth = self.link_depth.saturating_sub(1);
                self.push_inline("</a>");
            }
            TagEnd::Image => {
                let Some(alt) = self.image.end() else {
                    return;
                };
                if let Some((src, title)) = self.pending_image.take() {
                    let src = self.resolve_asset(&src);
                    let mut img = String::new();
                    B::image(&src, &alt, &title, &mut img);
                    self.push_inline(&img);
                }
            }
        }
    }

    fn text(&mut self, text: &str) {
        if self.code.is_active() {
            self.code.push_str(text);
        } else if self.image.is_active() {
            self.image.push_str(text);
        } else {
            let linked = self.linked_html(text);
            if self.heading.is_active() {
                match linked {
                    Some(html) => {
                        self.heading.push_plain(text);
                        self.heading.push_html(&html);
                    }
                    None => self.heading.push_text(text),
                }
            } else {
                self.output
                    .push_str(&linked.unwrap_or_else(|| escape_html(text)));
            }
        }
    }

    /// Escaped `text` with bare URLs and emails wrapped in links, or `None`
    /// when nothing is linked.
    fn linked_html(&self, text: &str) -> Option<String> {
        if !self.linkify || self.link_depth > 0 {
            return None;
        }
        let finder = LinkFinder::new();
        let mut links = finder.links(text).peekable();
        links.peek()?;

        let mut html = String::with_capacity(text.len() + 64);
        let mut cursor = 0;
        for link in links {
            html.push_str(&escape_html(&text[cursor..link.start()]));
            let href = match link.kind() {
                LinkKind::Email => format!("mailto:{}", link.as_str()),
                _ => link.as_str().to_owned(),
            };
            B::link_start(&href, "", &mut html);
            html.push_str(&escape_html(link.as_str()));
            html.push_str("</a>");
            cursor = link.end();
        }
        html.push_str(&escape_html(&text[cursor..]));
        Some(html)
    }

    fn inline_code(&mut self, code: &str) {
        if self.image.is_active() {
            self.image.push_str(code);
            return;
        }
        let html = format!("<code>{}</code>", escape_html(code));
        if self.heading.is_active() {
            self.heading.push_plain(code);
            self.heading.push_html(&html);
        } else {
            self.output.push_str(&html);
        }
    }

    fn math(&mut self, latex: &str, display: bool) {
        if self.image.is_active() {
            self.image.push_str(latex);
            return;
        }
        if self.heading.is_active() {
            self.heading.push_plain(latex);
        }
        let mut html = String::new();
        B::math(latex, display, &mut html);
        self.push_inline(&html);
    }

    fn soft_break(&mut self) {
        if self.code.is_active() {
            self.code.push_str("\n");
        } else if self.image.is_active() {
            self.image.push_str(" ");
        } else if self.heading.is_active() {
            self.heading.push_plain(" ");
            self.heading.push_html("\n");
        } else {
            self.output.push('\n');
        }
    }

    fn resolve_asset(&self, src: &str) -> String {
        self.assets
            .as_ref()
            .and_then(|ctx| resolve_reference(ctx.resolver.as_ref(), &ctx.directory, src))
            .unwrap_or_else(|| src.to_owned())
    }
}

/// Values of `id` attributes written in a raw HTML fragment.
fn raw_html_ids(html: &str) -> impl Iterator<Item = &str> {
    RAW_HTML_ID.captures_iter(html).filter_map(|caps| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|value| value.as_str())
    })
}

impl<B: RenderBackend> Default for MarkdownRenderer<B> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::FileUriResolver;
    use crate::html::HtmlBackend;
    use pretty_assertions::assert_eq;

    fn render_html(markdown: &str) -> String {
        MarkdownRenderer::<HtmlBackend>::new().render_markdown(markdown)
    }

    #[test]
    fn test_html_basic_paragraph() {
        assert_eq!(render_html("Hello, world!"), "<p>Hello, world!</p>");
    }

    #[test]
    fn test_html_heading_with_id_and_permalink() {
        assert_eq!(
            render_html("## Section Title"),
            r##"<h2 id="section-title">Section Title <a class="header-anchor" href="#section-title" aria-hidden="true">#</a></h2>"##
        );
    }

    #[test]
    fn test_duplicate_headings_get_suffixes() {
        let html = render_html("# Test\n\n## Test\n\n### Test");
        assert!(html.contains(r#"<h1 id="test">"#));
        assert!(html.contains(r#"<h2 id="test-1">"#));
        assert!(html.contains(r#"<h3 id="test-2">"#));
    }

    #[test]
    fn test_heading_with_inline_code() {
        let html = render_html("# Use `cargo run`");
        assert!(html.starts_with(r#"<h1 id="use-cargo-run">Use <code>cargo run</code> <a"#));
    }

    #[test]
    fn test_empty_heading_uses_fallback_slug() {
        let html = render_html("# ???");
        assert!(html.contains(r#"id="section""#));
    }

    #[test]
    fn test_html_code_block_highlighted() {
        let html = render_html("```rust\nfn main() {}\n```");
        assert!(html.contains(r#"<code class="hljs language-rust">"#));
        assert!(html.contains("main"));
    }

    #[test]
    fn test_html_code_block_unknown_language_escaped() {
        let html = render_html("```unknownlang\n<b>test</b>\n```");
        assert_eq!(
            html,
            "<pre class=\"hljs-block\"><code class=\"hljs\">&lt;b&gt;test&lt;/b&gt;\n</code></pre>"
        );
    }

    #[test]
    fn test_fence_info_attributes_are_ignored() {
        let html = render_html("```python title=\"x.py\"\nprint(1)\n```");
        assert!(html.contains("language-python"));
    }

    #[test]
    fn test_task_list() {
        let html = render_html("- [ ] todo\n- [x] done\n- [X] also");
        assert_eq!(
            html,
            concat!(
                r#"<ul><li><input type="checkbox" disabled> todo</li>"#,
                r#"<li><input type="checkbox" checked disabled> done</li>"#,
                r#"<li><input type="checkbox" checked disabled> also</li></ul>"#,
            )
        );
    }

    #[test]
    fn test_table_wrapped_with_alignment_classes() {
        let html = render_html("| A | B |\n|:--|--:|\n| 1 | 2 |");
        assert_eq!(
            html,
            concat!(
                r#"<div class="table-wrapper"><table><thead><tr>"#,
                r#"<th class="align-left">A</th><th class="align-right">B</th></tr></thead>"#,
                r#"<tbody><tr><td class="align-left">1</td><td class="align-right">2</td></tr>"#,
                "</tbody></table></div>",
            )
        );
    }

    #[test]
    fn test_links() {
        let html = render_html("[ext](https://example.com) [local](#top) <mail@example.com>");
        assert!(html.contains(
            r#"<a href="https://example.com" target="_blank" rel="noopener noreferrer">ext</a>"#
        ));
        assert!(html.contains(r##"<a href="#top">local</a>"##));
        assert!(html.contains(r#"<a href="mailto:mail@example.com">mail@example.com</a>"#));
    }

    #[test]
    fn test_link_title() {
        let html = render_html(r#"[a](page.md "The page")"#);
        assert_eq!(html, r#"<p><a href="page.md" title="The page">a</a></p>"#);
    }

    #[test]
    fn test_bare_urls_are_linked() {
        let html = render_html("See https://example.com/a_b?x=1&y=2, or write to me@example.com.");
        assert_eq!(
            html,
            concat!(
                r#"<p>See <a href="https://example.com/a_b?x=1&amp;y=2" target="_blank" rel="noopener noreferrer">"#,
                r#"https://example.com/a_b?x=1&amp;y=2</a>, or write to "#,
                r#"<a href="mailto:me@example.com">me@example.com</a>.</p>"#
            )
        );
    }

    #[test]
    fn test_bare_urls_skipped_in_links_and_code() {
        let html = render_html("[https://a.org](https://b.org) `https://c.org`\n\n```\nhttps://d.org\n```");
        assert_eq!(html.matches("<a ").count(), 1);
        assert!(html.contains("<code>https://c.org</code>"));
        assert!(!html.contains(r#"href="https://d.org""#));

        let html = MarkdownRenderer::<HtmlBackend>::new()
            .with_linkify(false)
            .render_markdown("https://example.com");
        assert_eq!(html, "<p>https://example.com</p>");
    }

    #[test]
    fn test_bare_url_in_heading_keeps_slug() {
        let html = render_html("## Docs at https://x.org");
        assert!(html.starts_with(r#"<h2 id="docs-at-httpsxorg">Docs at <a href="https://x.org""#));
    }

    #[test]
    fn test_raw_html_ids_are_reserved() {
        let html = render_html("# Intro\n\n<h2 id=\"intro\">Raw</h2>\n\n<span id='note'>n</span> # Note\n\n# Note");
        assert!(html.contains(r#"<h1 id="intro-1">"#));
        assert!(html.contains(r#"<h1 id="note-1">"#));
        assert_eq!(html.matches(r#"id="intro""#).count(), 1);
    }

    #[test]
    fn test_raw_html_ids() {
        let ids: Vec<_> = raw_html_ids(r#"<div id="a" data-id="x"><p ID='b'><i id=c>"#).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_image_alt_drops_markup() {
        let html = render_html("![an *important* `chart`](chart.png)");
        assert_eq!(
            html,
            r#"<p><img src="chart.png" alt="an important chart"></p>"#
        );
    }

    #[test]
    fn test_image_resolved_through_assets() {
        let html = MarkdownRenderer::<HtmlBackend>::new()
            .with_assets(AssetContext {
                directory: PathBuf::from("/notes"),
                resolver: Arc::new(FileUriResolver),
            })
            .render_markdown("![a](img/a.png) ![b](https://x.org/b.png)");
        assert!(html.contains(r#"src="file:///notes/img/a.png""#));
        assert!(html.contains(r#"src="https://x.org/b.png""#));
    }

    #[test]
    fn test_math_disabled_keeps_dollars() {
        let html = render_html("Cost $x^2$ and $5");
        assert_eq!(html, "<p>Cost $x^2$ and $5</p>");
    }

    #[test]
    fn test_math_enabled_typesets() {
        let html = MarkdownRenderer::<HtmlBackend>::new()
            .with_math(true)
            .render_markdown("Inline $x^2$\n\n$$\\frac{a}{b}$$");
        assert!(html.contains("<math"));
        assert!(html.contains("<mfrac"));
        assert!(!html.contains("$x^2$"));
    }

    #[test]
    fn test_smart_punctuation() {
        let html = render_html("\"Quoted\" -- it's");
        assert_eq!(html, "<p>\u{201c}Quoted\u{201d} \u{2013} it\u{2019}s</p>");

        let html = MarkdownRenderer::<HtmlBackend>::new()
            .with_smart_punctuation(false)
            .render_markdown("it's");
        assert_eq!(html, "<p>it's</p>");
    }

    #[test]
    fn test_raw_html_passthrough() {
        let html = render_html("<kbd>Ctrl</kbd> key\n\n<details><summary>More</summary>x</details>");
        assert!(html.contains("<kbd>Ctrl</kbd>"));
        assert!(html.contains("<details><summary>More</summary>x</details>"));
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(render_html("3. c\n4. d"), r#"<ol start="3"><li>c</li><li>d</li></ol>"#);
    }
}
