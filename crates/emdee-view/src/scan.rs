//! Streaming scan of sanitized HTML into segments.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::PERMALINK_CLASS;
use crate::heading::Heading;

/// Elements that never have an end tag in serialized HTML.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Error scanning HTML.
#[derive(Debug, thiserror::Error)]
#[error("HTML scan error at byte {position}: {source}")]
pub struct ViewError {
    /// Byte offset where scanning stopped.
    pub position: usize,
    #[source]
    source: quick_xml::Error,
}

/// One piece of the realized document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    /// Tag, comment or declaration, kept verbatim.
    Markup(String),
    /// Decoded text content of one text node.
    Text(String),
}

/// Borrowed text node with its segment index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextNode<'a> {
    /// Index into [`DocumentView::segments`].
    pub index: usize,
    /// Decoded text.
    pub text: &'a str,
}

/// Ordered markup/text segments of a rendered document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DocumentView {
    segments: Vec<Segment>,
    headings: Vec<Heading>,
}

impl DocumentView {
    /// Scan `html` into a view.
    ///
    /// Mismatched end tags are tolerated; unclosed elements are closed at the
    /// end of input.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError`] if the markup is too malformed to tokenize.
    pub fn parse(html: &str) -> Result<Self, ViewError> {
        let mut reader = Reader::from_str(html);
        let config = reader.config_mut();
        config.trim_text(false);
        config.check_end_names = false;
        config.allow_unmatched_ends = true;

        let mut builder = Builder::default();
        loop {
            let start = offset(&reader);
            let event = reader.read_event().map_err(|source| ViewError {
                position: offset(&reader),
                source,
            })?;
            let raw = html.get(start..offset(&reader)).unwrap_or_default();

            match event {
                Event::Start(e) => builder.open(&tag_name(e.name().as_ref()), &e, raw),
                Event::Empty(_) => builder.markup(raw),
                Event::End(e) => builder.close(&tag_name(e.name().as_ref()), raw),
                Event::Text(e) => {
                    let text = reader.decoder().decode(&e).map_or_else(
                        |_| String::from_utf8_lossy(&e).into_owned(),
                        Cow::into_owned,
                    );
                    builder.text(&text);
                }
                Event::GeneralRef(e) => {
                    let name = String::from_utf8_lossy(&e);
                    builder.text(&decode_entity(&name));
                }
                Event::CData(e) => builder.text(&String::from_utf8_lossy(&e)),
                Event::Eof => break,
                Event::Comment(_) | Event::Decl(_) | Event::PI(_) | Event::DocType(_) => {
                    builder.markup(raw);
                }
            }
        }

        Ok(builder.finish())
    }

    /// All segments in document order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Text nodes in document order.
    pub fn text_nodes(&self) -> impl Iterator<Item = TextNode<'_>> {
        self.segments
            .iter()
            .enumerate()
            .filter_map(|(index, segment)| match segment {
                Segment::Text(text) => Some(TextNode { index, text }),
                Segment::Markup(_) => None,
            })
    }

    /// Heading elements (h1-h6) carrying an `id`, in document order.
    pub fn headings(&self) -> &[Heading] {
        &self.headings
    }

    /// Concatenated text content.
    #[must_use]
    pub fn text_content(&self) -> String {
        self.text_nodes().map(|node| node.text).collect()
    }

    /// Re-serialize the view unchanged.
    #[must_use]
    pub fn to_html(&self) -> String {
        self.render_with(|_, text, out| out.push_str(&escape_text(text)))
    }

    /// Re-serialize the view, letting `text` write each text node.
    ///
    /// The callback receives the segment index, the decoded text and the
    /// output buffer; it is responsible for escaping.
    pub fn render_with<F>(&self, mut text: F) -> String
    where
        F: FnMut(usize, &str, &mut String),
    {
        let mut out = String::with_capacity(self.segments.len() * 16);
        for (index, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Markup(raw) => out.push_str(raw),
                Segment::Text(decoded) => text(index, decoded, &mut out),
            }
        }
        out
    }
}

/// Escape text content for re-serialization.
#[must_use]
pub fn escape_text(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Heading being captured.
struct Capture {
    level: u8,
    id: String,
    text: String,
    /// Stack depth of the heading element itself.
    depth: usize,
    /// Stack depth of the permalink anchor whose text is excluded.
    skip_depth: Option<usize>,
}

#[derive(Default)]
struct Builder {
    segments: Vec<Segment>,
    pending: String,
    stack: Vec<String>,
    headings: Vec<Heading>,
    capture: Option<Capture>,
}

impl Builder {
    fn markup(&mut self, raw: &str) {
        self.flush();
        self.segments.push(Segment::Markup(raw.to_owned()));
    }

    fn open(&mut self, name: &str, e: &BytesStart<'_>, raw: &str) {
        self.markup(raw);
        if VOID_ELEMENTS.contains(&name) {
            return;
        }
        self.stack.push(name.to_owned());
        let depth = self.stack.len();

        if let Some(capture) = &mut self.capture {
            if capture.skip_depth.is_none()
                && name == "a"
                && attribute(e, "class")
                    .is_some_and(|class| class.split_whitespace().any(|c| c == PERMALINK_CLASS))
            {
                capture.skip_depth = Some(depth);
            }
            return;
        }

        if let Some(level) = heading_level(name)
            && let Some(id) = attribute(e, "id").filter(|id| !id.is_empty())
        {
            self.capture = Some(Capture {
                level,
                id,
                text: String::new(),
                depth,
                skip_depth: None,
            });
        }
    }

    fn close(&mut self, name: &str, raw: &str) {
        self.markup(raw);
        if let Some(pos) = self.stack.iter().rposition(|open| open == name) {
            self.stack.truncate(pos);
        }
        self.settle_capture();
    }

    fn text(&mut self, text: &str) {
        self.pending.push_str(text);
        if let Some(capture) = &mut self.capture
            && capture.skip_depth.is_none()
        {
            capture.text.push_str(text);
        }
    }

    fn flush(&mut self) {
        if !self.pending.is_empty() {
            self.segments
                .push(Segment::Text(std::mem::take(&mut self.pending)));
        }
    }

    fn settle_capture(&mut self) {
        let depth = self.stack.len();
        let Some(capture) = &mut self.capture else {
            return;
        };
        if capture.skip_depth.is_some_and(|skip| depth < skip) {
            capture.skip_depth = None;
        }
        if depth < capture.depth
            && let Some(capture) = self.capture.take()
        {
            self.headings.push(Heading {
                id: capture.id,
                text: capture.text.trim().to_owned(),
                level: capture.level,
            });
        }
    }

    fn finish(mut self) -> DocumentView {
        self.flush();
        self.stack.clear();
        self.settle_capture();
        DocumentView {
            segments: self.segments,
            headings: self.headings,
        }
    }
}

fn offset<R>(reader: &Reader<R>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

fn tag_name(name: &[u8]) -> String {
    String::from_utf8_lossy(name).to_ascii_lowercase()
}

fn heading_level(name: &str) -> Option<u8> {
    match name {
        "h1" => Some(1),
        "h2" => Some(2),
        "h3" => Some(3),
        "h4" => Some(4),
        "h5" => Some(5),
        "h6" => Some(6),
        _ => None,
    }
}

fn attribute(e: &BytesStart<'_>, key: &str) -> Option<String> {
    e.html_attributes()
        .flatten()
        .find(|attr| attr.key.as_ref().eq_ignore_ascii_case(key.as_bytes()))
        .map(|attr| {
            attr.unescape_value().map_or_else(
                |_| String::from_utf8_lossy(&attr.value).into_owned(),
                Cow::into_owned,
            )
        })
}

/// Decode an entity reference name (without `&` and `;`).
fn decode_entity(entity: &str) -> String {
    match entity {
        "lt" => "<".to_owned(),
        "gt" => ">".to_owned(),
        "amp" => "&".to_owned(),
        "apos" => "'".to_owned(),
        "quot" => "\"".to_owned(),
        "nbsp" => "\u{a0}".to_owned(),
        s if s.starts_with('#') => {
            let code = if s.starts_with("#x") || s.starts_with("#X") {
                u32::from_str_radix(&s[2..], 16).ok()
            } else {
                s[1..].parse::<u32>().ok()
            };
            code.and_then(char::from_u32)
                .map_or_else(|| format!("&{entity};"), |c| c.to_string())
        }
        _ => format!("&{entity};"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_segments_keep_markup_verbatim() {
        let view = DocumentView::parse(r#"<p class="lead">Hello <em>world</em></p>"#).unwrap();
        assert_eq!(
            view.segments(),
            &[
                Segment::Markup(r#"<p class="lead">"#.to_owned()),
                Segment::Text("Hello ".to_owned()),
                Segment::Markup("<em>".to_owned()),
                Segment::Text("world".to_owned()),
                Segment::Markup("</em>".to_owned()),
                Segment::Markup("</p>".to_owned()),
            ]
        );
    }

    #[test]
    fn test_entities_are_decoded_into_one_text_node() {
        let view = DocumentView::parse("<p>a &amp; b &lt;c&gt;&nbsp;&#x27;d&#39;</p>").unwrap();
        let nodes: Vec<_> = view.text_nodes().map(|n| n.text).collect();
        assert_eq!(nodes, vec!["a & b <c>\u{a0}'d'"]);
    }

    #[test]
    fn test_round_trip_preserves_structure() {
        let html = r#"<p>x &lt; y</p><pre class="hljs-block"><code class="hljs">a &amp;&amp; b</code></pre>"#;
        let view = DocumentView::parse(html).unwrap();
        assert_eq!(view.to_html(), html);
    }

    #[test]
    fn test_void_elements_do_not_swallow_headings() {
        let html = r#"<p>line<br>next</p><ul><li><input disabled="" type="checkbox"> task</li></ul><h2 id="after">After</h2>"#;
        let view = DocumentView::parse(html).unwrap();
        assert_eq!(view.headings(), &[Heading::new("after", "After", 2)]);
    }

    #[test]
    fn test_heading_text_excludes_permalink() {
        let html = r##"<h1 id="c">C# <a class="header-anchor" href="#c" aria-hidden="true">#</a></h1>"##;
        let view = DocumentView::parse(html).unwrap();
        assert_eq!(view.headings(), &[Heading::new("c", "C#", 1)]);
    }

    #[test]
    fn test_heading_text_includes_inline_markup() {
        let html = r#"<h3 id="install-npm">Install <code>npm</code> <em>now</em></h3>"#;
        let view = DocumentView::parse(html).unwrap();
        assert_eq!(view.headings()[0].text, "Install npm now");
        assert_eq!(view.headings()[0].level, 3);
    }

    #[test]
    fn test_headings_without_id_are_skipped() {
        let view = DocumentView::parse("<h2>No id</h2><h2 id=\"\">Empty</h2><h5 id=\"deep\">Deep</h5>")
            .unwrap();
        assert_eq!(view.headings(), &[Heading::new("deep", "Deep", 5)]);
    }

    #[test]
    fn test_mismatched_end_tags_are_tolerated() {
        let view = DocumentView::parse("<div><p>open</div><h2 id=\"x\">X</h2>").unwrap();
        assert_eq!(view.headings().len(), 1);
        assert_eq!(view.text_content(), "openX");
    }

    #[test]
    fn test_unclosed_heading_is_closed_at_end() {
        let view = DocumentView::parse("<h4 id=\"tail\">Tail").unwrap();
        assert_eq!(view.headings(), &[Heading::new("tail", "Tail", 4)]);
    }

    #[test]
    fn test_render_with_custom_text_writer() {
        let view = DocumentView::parse("<p>ab</p>").unwrap();
        let html = view.render_with(|_, text, out| out.push_str(&text.to_uppercase()));
        assert_eq!(html, "<p>AB</p>");
    }

    #[test]
    fn test_empty_input() {
        let view = DocumentView::parse("").unwrap();
        assert!(view.segments().is_empty());
        assert!(view.headings().is_empty());
    }
}
