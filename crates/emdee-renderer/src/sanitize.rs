//! Allow-list sanitization of rendered HTML.

use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt::Write;
use std::sync::LazyLock;

use ammonia::Builder;
use regex::{Captures, Regex};

use crate::util::is_external_url;

/// URL schemes allowed in `href`/`src`, besides the asset resolver's.
pub const URL_SCHEMES: &[&str] = &["http", "https", "mailto", "tel", "sms", "callto", "ftp"];

/// Structural elements allowed on top of ammonia's defaults.
const EXTRA_TAGS: &[&str] = &[
    "div", "span", "input", "details", "summary", "kbd", "mark", "dl", "dt", "dd",
];

/// MathML presentation elements produced by the math typesetter.
const MATHML_TAGS: &[&str] = &[
    "math", "semantics", "annotation", "mrow", "mi", "mn", "mo", "ms", "mtext", "mspace",
    "msub", "msup", "msubsup", "munder", "mover", "munderover", "mfrac", "msqrt", "mroot",
    "mtable", "mtr", "mtd", "mstyle", "mpadded", "mphantom", "menclose", "merror",
    "mmultiscripts", "mprescripts", "none",
];

/// MathML presentation attributes.
const MATHML_ATTRIBUTES: &[&str] = &[
    "xmlns", "display", "mathvariant", "mathsize", "displaystyle", "scriptlevel", "stretchy",
    "symmetric", "largeop", "movablelimits", "accent", "accentunder", "fence", "separator",
    "form", "lspace", "rspace", "minsize", "maxsize", "width", "height", "depth", "voffset",
    "linethickness", "columnalign", "rowalign", "columnspacing", "rowspacing", "columnlines",
    "rowlines", "frame", "notation", "encoding", "mathcolor", "mathbackground",
];

/// MathML elements that may carry inline `style` for glyph sizing.
const MATH_STYLE_TAGS: &[&str] = &["mstyle", "mspace", "mpadded", "mo", "mrow", "mtable", "mtd"];

/// Substrings that make a `style` value a script vector.
const STYLE_VECTORS: &[&str] = &["expression(", "url(", "javascript:", "@import", "behavior"];

/// `rel` forced onto links that open a new browsing context.
const HARDENED_REL: &str = "noopener noreferrer";

/// Opening `<a>` tags as ammonia serializes them: double-quoted values
/// without a literal `"` inside.
static ANCHOR_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<a((?:\s+[^\s"'>/=]+(?:="[^"]*")?)*)>"#).unwrap());

static ANCHOR_ATTRIBUTE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"([^\s"'>/=]+)(?:="([^"]*)")?"#).unwrap());

/// Default-deny HTML sanitizer.
///
/// Built once per pipeline; `clean` can be called concurrently.
pub struct Sanitizer {
    builder: Builder<'static>,
}

impl Sanitizer {
    /// Sanitizer allowing the standard schemes plus `extra_scheme`.
    pub fn new(extra_scheme: Option<&'static str>) -> Self {
        let mut builder = Builder::default();
        builder
            .add_tags(EXTRA_TAGS)
            .add_tags(MATHML_TAGS)
            .add_generic_attributes(["id", "class", "title", "aria-hidden"])
            .add_tag_attributes("a", ["href", "target", "rel"])
            .add_tag_attributes("img", ["src", "alt"])
            .add_tag_attributes("input", ["type", "checked", "disabled"])
            .add_tag_attributes("details", ["open"])
            .link_rel(None)
            .url_schemes(URL_SCHEMES.iter().copied().chain(extra_scheme).collect::<HashSet<_>>())
            .attribute_filter(filter_attribute);
        for tag in MATHML_TAGS {
            builder.add_tag_attributes(tag, MATHML_ATTRIBUTES);
        }
        for tag in MATH_STYLE_TAGS {
            builder.add_tag_attributes(tag, ["style"]);
        }
        Self { builder }
    }

    /// Sanitize `html`.
    ///
    /// Links written as raw HTML are hardened like markdown ones: `http(s)`
    /// targets open in a new tab, and any link with a `target` gets
    /// `rel="noopener noreferrer"`.
    pub fn clean(&self, html: &str) -> String {
        harden_links(&self.builder.clean(html).to_string())
    }
}

impl Default for Sanitizer {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Sanitize with the default policy (no asset scheme).
pub fn sanitize(html: &str) -> String {
    Sanitizer::default().clean(html)
}

fn harden_links(html: &str) -> String {
    ANCHOR_TAG
        .replace_all(html, |caps: &Captures<'_>| {
            let source = caps.get(1).map_or("", |m| m.as_str());
            let mut attributes: Vec<(&str, Option<&str>)> = ANCHOR_ATTRIBUTE
                .captures_iter(source)
                .filter_map(|attr| Some((attr.get(1)?.as_str(), attr.get(2).map(|v| v.as_str()))))
                .collect();

            let external = attributes
                .iter()
                .any(|(name, value)| *name == "href" && value.is_some_and(is_external_url));
            let targeted = attributes.iter().any(|(name, _)| *name == "target");
            if !external && !targeted {
                return caps[0].to_owned();
            }
            if external {
                set_attribute(&mut attributes, "target", "_blank");
            }
            set_attribute(&mut attributes, "rel", HARDENED_REL);

            let mut tag = String::from("<a");
            for (name, value) in attributes {
                let _ = match value {
                    Some(value) => write!(tag, r#" {name}="{value}""#),
                    None => write!(tag, " {name}"),
                };
            }
            tag.push('>');
            tag
        })
        .into_owned()
}

/// Replace the value of `name` in place, or append it.
fn set_attribute<'a>(attributes: &mut Vec<(&'a str, Option<&'a str>)>, name: &'a str, value: &'a str) {
    match attributes.iter_mut().find(|(existing, _)| *existing == name) {
        Some(entry) => entry.1 = Some(value),
        None => attributes.push((name, Some(value))),
    }
}

/// Per-attribute filter run after the allow-lists.
///
/// Drops inline styles containing script vectors and restricts checkboxes.
fn filter_attribute<'u>(element: &str, attribute: &str, value: &'u str) -> Option<Cow<'u, str>> {
    match (element, attribute) {
        (_, "style") => {
            let lower = value.to_ascii_lowercase();
            if STYLE_VECTORS.iter().any(|vector| lower.contains(vector)) {
                None
            } else {
                Some(Cow::Borrowed(value))
            }
        }
        ("input", "type") => value
            .eq_ignore_ascii_case("checkbox")
            .then_some(Cow::Borrowed(value)),
        _ => Some(Cow::Borrowed(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_script_is_removed_with_content() {
        let out = sanitize("<p>hi</p><script>alert(1)</script>");
        assert_eq!(out, "<p>hi</p>");
    }

    #[test]
    fn test_event_handlers_are_dropped() {
        let out = sanitize(r#"<img src="a.png" onerror="alert(1)" alt="x">"#);
        assert!(!out.contains("onerror"));
        assert!(out.contains(r#"src="a.png""#));
    }

    #[test]
    fn test_dangerous_schemes_are_stripped() {
        for href in ["javascript:alert(1)", "JaVaScRiPt:alert(1)", "vbscript:x", "data:text/html,x"] {
            let out = sanitize(&format!(r#"<a href="{href}">x</a>"#));
            assert_eq!(out, "<a>x</a>", "{href}");
        }
    }

    #[test]
    fn test_allowed_schemes_pass() {
        for href in ["https://example.com", "mailto:a@b.c", "tel:+100", "sms:+100", "#frag", "rel/page.md"] {
            let out = sanitize(&format!(r#"<a href="{href}">x</a>"#));
            assert!(out.contains(&format!(r#"href="{href}""#)), "{out}");
        }
    }

    #[test]
    fn test_extra_scheme_is_allowed() {
        let src = "asset://localhost/%2Fa.png";
        let html = format!(r#"<img src="{src}">"#);

        assert!(!sanitize(&html).contains("asset:"));
        assert!(Sanitizer::new(Some("asset")).clean(&html).contains(src));
    }

    #[test]
    fn test_link_attributes_are_kept() {
        let html = r#"<a href="https://x.org" target="_blank" rel="noopener noreferrer">x</a>"#;
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_raw_links_are_hardened() {
        assert_eq!(
            sanitize(r#"<a href="https://evil.example" target="_blank">x</a>"#),
            r#"<a href="https://evil.example" target="_blank" rel="noopener noreferrer">x</a>"#
        );
        assert_eq!(
            sanitize(r#"<a href="http://x.org" title="t">x</a>"#),
            r#"<a href="http://x.org" title="t" target="_blank" rel="noopener noreferrer">x</a>"#
        );
        // A new tab on a local link still loses the opener.
        assert_eq!(
            sanitize(r#"<a href="page.md" target="_blank">x</a>"#),
            r#"<a href="page.md" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn test_local_links_untouched() {
        for html in [r##"<a href="#top">x</a>"##, r#"<a href="mailto:a@b.c">x</a>"#, "<a>x</a>", "<abbr>x</abbr>"] {
            assert_eq!(sanitize(html), html);
        }
    }

    #[test]
    fn test_heading_and_permalink_are_kept() {
        let html = r##"<h2 id="intro">Intro <a class="header-anchor" href="#intro" aria-hidden="true">#</a></h2>"##;
        assert_eq!(sanitize(html), html);
    }

    #[test]
    fn test_checkbox_is_kept() {
        let out = sanitize(r#"<li><input type="checkbox" checked="" disabled=""> done</li>"#);
        assert!(out.contains(r#"type="checkbox""#));
        assert!(out.contains("checked"));
        assert!(out.contains("disabled"));

        let out = sanitize(r#"<input type="password">"#);
        assert!(!out.contains("password"));
    }

    #[test]
    fn test_style_only_on_math_sizing_elements() {
        let out = sanitize(r#"<p style="color:red">x</p>"#);
        assert_eq!(out, "<p>x</p>");

        let out = sanitize(r#"<math><mstyle style="font-size:1.2em"><mi>x</mi></mstyle></math>"#);
        assert!(out.contains(r#"style="font-size:1.2em""#));

        let out = sanitize(r#"<math><mstyle style="background:url(x)"><mi>x</mi></mstyle></math>"#);
        assert!(!out.contains("style="));
    }

    #[test]
    fn test_sanitize_is_idempotent() {
        let inputs = [
            r#"<p onclick="x()">a <b>b</b> <script>c</script><a href="javascript:d">e</a></p>"#,
            r#"<div class="table-wrapper"><table><tr><td class="align-left">1</td></tr></table></div>"#,
            "<p>unclosed <em>tags <strong>here</p>",
            r#"<pre class="hljs-block"><code class="hljs language-rust"><span class="hl-source">fn</span></code></pre>"#,
            r#"<a href="https://x.org" rel="opener" target="_self">x</a>"#,
        ];
        for input in inputs {
            let once = sanitize(input);
            assert_eq!(sanitize(&once), once);
        }
    }
}
