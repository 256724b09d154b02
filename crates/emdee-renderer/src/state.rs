//! Event-processing state for the markdown renderer.

use std::collections::HashSet;

use pulldown_cmark::Alignment;

/// Slug used when a heading has no sluggable characters.
pub const FALLBACK_SLUG: &str = "section";

/// State for tracking code block rendering.
#[derive(Default)]
pub struct CodeBlockState {
    active: bool,
    /// Fence language (e.g., "rust", "python").
    language: Option<String>,
    buffer: String,
}

impl CodeBlockState {
    /// Start a new code block with optional language.
    pub fn start(&mut self, language: Option<String>) {
        self.active = true;
        self.language = language;
        self.buffer.clear();
    }

    /// End the current code block and return (language, content).
    pub fn end(&mut self) -> (Option<String>, String) {
        self.active = false;
        (self.language.take(), std::mem::take(&mut self.buffer))
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn push_str(&mut self, text: &str) {
        self.buffer.push_str(text);
    }
}

/// State for tracking table rendering.
#[derive(Default)]
pub struct TableState {
    in_head: bool,
    alignments: Vec<Alignment>,
    cell_index: usize,
}

impl TableState {
    /// Start a new table with column alignments.
    pub fn start(&mut self, alignments: Vec<Alignment>) {
        self.alignments = alignments;
        self.in_head = false;
        self.cell_index = 0;
    }

    pub fn start_head(&mut self) {
        self.in_head = true;
        self.cell_index = 0;
    }

    pub fn end_head(&mut self) {
        self.in_head = false;
    }

    pub fn start_row(&mut self) {
        self.cell_index = 0;
    }

    pub fn next_cell(&mut self) {
        self.cell_index += 1;
    }

    pub fn is_in_head(&self) -> bool {
        self.in_head
    }

    /// Class attribute carrying the current cell's alignment.
    ///
    /// Alignment is a class rather than inline style so the sanitizer never
    /// has to allow `style` on table cells.
    pub fn current_alignment_class(&self) -> &'static str {
        match self.alignments.get(self.cell_index) {
            Some(Alignment::Left) => r#" class="align-left""#,
            Some(Alignment::Center) => r#" class="align-center""#,
            Some(Alignment::Right) => r#" class="align-right""#,
            Some(Alignment::None) | None => "",
        }
    }
}

/// State for tracking image alt text capture.
#[derive(Default)]
pub struct ImageState {
    /// Nesting depth; images inside image alt text only contribute text.
    depth: usize,
    alt_text: String,
}

impl ImageState {
    pub fn start(&mut self) {
        if self.depth == 0 {
            self.alt_text.clear();
        }
        self.depth += 1;
    }

    /// End image capture. Returns the alt text when the outermost image closes.
    pub fn end(&mut self) -> Option<String> {
        self.depth = self.depth.saturating_sub(1);
        (self.depth == 0).then(|| std::mem::take(&mut self.alt_text))
    }

    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    pub fn push_str(&mut self, text: &str) {
        self.alt_text.push_str(text);
    }
}

/// Heading capture and id assignment.
#[derive(Default)]
pub struct HeadingState {
    current_level: Option<u8>,
    /// Plain text, used for the slug.
    text: String,
    /// Inline HTML of the heading content.
    html: String,
    used_ids: HashSet<String>,
}

impl HeadingState {
    /// Check if we're currently inside a heading.
    pub fn is_active(&self) -> bool {
        self.current_level.is_some()
    }

    pub fn start_heading(&mut self, level: u8) {
        self.current_level = Some(level);
        self.text.clear();
        self.html.clear();
    }

    /// Complete the heading. Returns (level, id, html) or None if not in a heading.
    pub fn complete_heading(&mut self) -> Option<(u8, String, String)> {
        let level = self.current_level.take()?;
        let text = std::mem::take(&mut self.text);
        let html = std::mem::take(&mut self.html);
        let id = self.unique_id(&slugify(&text));
        Some((level, id, html))
    }

    /// Mark an id written outside markdown headings as taken.
    pub fn reserve(&mut self, id: &str) {
        self.used_ids.insert(id.to_owned());
    }

    /// Reserve an id, suffixing `-1`, `-2`, ... on collision.
    fn unique_id(&mut self, base: &str) -> String {
        let id = if self.used_ids.contains(base) {
            (1..)
                .map(|n| format!("{base}-{n}"))
                .find(|candidate| !self.used_ids.contains(candidate))
                .unwrap_or_else(|| base.to_owned())
        } else {
            base.to_owned()
        };
        self.used_ids.insert(id.clone());
        id
    }

    /// Append text to both heading buffers.
    pub fn push_text(&mut self, text: &str) {
        self.text.push_str(text);
        self.html.push_str(&escape_html(text));
    }

    /// Append plain text that has no HTML counterpart.
    pub fn push_plain(&mut self, text: &str) {
        self.text.push_str(text);
    }

    pub fn push_html(&mut self, html: &str) {
        self.html.push_str(html);
    }
}

/// Convert heading text to an anchor slug.
///
/// Lowercases, keeps `[a-z0-9-]`, turns whitespace runs into single hyphens,
/// drops everything else and trims hyphens. Returns [`FALLBACK_SLUG`] when
/// nothing is left.
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut kept = String::with_capacity(text.len());
    for c in text.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            kept.push(c);
        } else if c.is_whitespace() {
            kept.push(' ');
        }
    }

    let slug = kept.split_whitespace().collect::<Vec<_>>().join("-");
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        FALLBACK_SLUG.to_owned()
    } else {
        slug.to_owned()
    }
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  Spaces  "), "spaces");
        assert_eq!(slugify("Multiple   Spaces"), "multiple-spaces");
        assert_eq!(slugify("kebab-case"), "kebab-case");
        assert_eq!(slugify("snake_case"), "snakecase");
        assert_eq!(slugify("-Leading and trailing-"), "leading-and-trailing");
        assert_eq!(slugify("Tabs\tand\nnewlines"), "tabs-and-newlines");
    }

    #[test]
    fn test_slugify_fallback() {
        assert_eq!(slugify("!!!"), FALLBACK_SLUG);
        assert_eq!(slugify(""), FALLBACK_SLUG);
        assert_eq!(slugify("日本語"), FALLBACK_SLUG);
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it's");
    }

    #[test]
    fn test_code_block_state() {
        let mut state = CodeBlockState::default();
        assert!(!state.is_active());

        state.start(Some("rust".to_owned()));
        assert!(state.is_active());

        state.push_str("fn main() {}");
        let (lang, content) = state.end();
        assert_eq!(lang, Some("rust".to_owned()));
        assert_eq!(content, "fn main() {}");
        assert!(!state.is_active());
    }

    #[test]
    fn test_table_state_alignment_classes() {
        let mut state = TableState::default();
        state.start(vec![Alignment::Left, Alignment::Center, Alignment::None]);

        state.start_head();
        assert!(state.is_in_head());
        assert_eq!(state.current_alignment_class(), r#" class="align-left""#);

        state.next_cell();
        assert_eq!(state.current_alignment_class(), r#" class="align-center""#);

        state.next_cell();
        assert_eq!(state.current_alignment_class(), "");

        state.end_head();
        assert!(!state.is_in_head());
    }

    #[test]
    fn test_image_state_nested() {
        let mut state = ImageState::default();
        state.start();
        state.push_str("outer ");
        state.start();
        state.push_str("inner");
        assert_eq!(state.end(), None);
        assert!(state.is_active());
        assert_eq!(state.end(), Some("outer inner".to_owned()));
        assert!(!state.is_active());
    }

    #[test]
    fn test_heading_ids_are_deduplicated() {
        let mut state = HeadingState::default();
        let mut next_id = |text: &str| {
            state.start_heading(2);
            state.push_text(text);
            state.complete_heading().map(|(_, id, _)| id)
        };

        assert_eq!(next_id("Test").as_deref(), Some("test"));
        assert_eq!(next_id("Test").as_deref(), Some("test-1"));
        assert_eq!(next_id("Test").as_deref(), Some("test-2"));
        // An explicit "test-1" heading takes the next free suffix.
        assert_eq!(next_id("Test 1").as_deref(), Some("test-1-1"));
    }

    #[test]
    fn test_reserved_ids_are_skipped() {
        let mut state = HeadingState::default();
        state.reserve("intro");
        state.start_heading(1);
        state.push_text("Intro");

        let (_, id, _) = state.complete_heading().unwrap();
        assert_eq!(id, "intro-1");
    }

    #[test]
    fn test_heading_html_keeps_markup() {
        let mut state = HeadingState::default();
        state.start_heading(1);
        state.push_text("A < B ");
        state.push_html("<code>");
        state.push_text("x");
        state.push_html("</code>");

        let (level, id, html) = state.complete_heading().unwrap();
        assert_eq!(level, 1);
        assert_eq!(id, "a-b-x");
        assert_eq!(html, "A &lt; B <code>x</code>");
    }
}
