//! Standalone HTML export of a rendered document.

use std::fmt::Write;
use std::path::Path;

use emdee_renderer::escape_html;

/// Title used when the document has no location.
pub const DEFAULT_TITLE: &str = "document";

/// Extensions removed from the file name to form the title.
const DOCUMENT_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Presentation of an exported document.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    /// Value of the root `data-theme` attribute.
    pub theme: String,
    /// Body font size in pixels.
    pub font_size: u16,
    pub title: String,
    /// CSS embedded in the document head.
    pub stylesheet: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            theme: "light".to_owned(),
            font_size: 16,
            title: DEFAULT_TITLE.to_owned(),
            stylesheet: String::new(),
        }
    }
}

impl ExportOptions {
    /// Options titled after the document at `path`.
    pub fn for_path(path: Option<&Path>) -> Self {
        Self {
            title: export_title(path),
            ..Self::default()
        }
    }
}

/// File stem without a markdown or text extension.
pub fn export_title(path: Option<&Path>) -> String {
    let Some(name) = path.and_then(Path::file_name) else {
        return DEFAULT_TITLE.to_owned();
    };
    let name = name.to_string_lossy();
    let stem = match name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty()
                && DOCUMENT_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext)) =>
        {
            stem
        }
        _ => name.as_ref(),
    };
    stem.to_owned()
}

/// Suggested file name of the export, `<title>.html`.
pub fn export_file_name(path: Option<&Path>) -> String {
    format!("{}.html", export_title(path))
}

/// Wrap sanitized `html` in a complete HTML5 document.
///
/// The content is embedded verbatim; it must already be sanitized.
pub fn standalone_document(html: &str, options: &ExportOptions) -> String {
    let mut out = String::with_capacity(html.len() + options.stylesheet.len() + 512);

    let _ = writeln!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"{}\">",
        escape_html(&options.theme)
    );
    out.push_str("<head>\n<meta charset=\"utf-8\">\n");
    out.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n");
    let _ = writeln!(out, "<title>{}</title>", escape_html(&options.title));
    out.push_str("<style>\n");
    if !options.stylesheet.is_empty() {
        out.push_str(&options.stylesheet.replace("</style", "<\\/style"));
        out.push('\n');
    }
    // Export overrides
    out.push_str("body { overflow: auto; background: var(--bg-content); }\n");
    out.push_str(".md-body { padding: 48px 64px 80px; }\n");
    out.push_str("</style>\n</head>\n<body>\n");

    let _ = writeln!(
        out,
        "<article class=\"md-body\" style=\"--md-font-size: {}px\">",
        options.font_size
    );
    out.push_str(html);
    out.push_str("\n</article>\n</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_export_title_strips_document_extensions() {
        assert_eq!(export_title(Some(Path::new("/a/guide.md"))), "guide");
        assert_eq!(export_title(Some(Path::new("notes.MARKDOWN"))), "notes");
        assert_eq!(export_title(Some(Path::new("todo.txt"))), "todo");
        assert_eq!(export_title(Some(Path::new("archive.tar.gz"))), "archive.tar.gz");
        assert_eq!(export_title(Some(Path::new("README"))), "README");
        assert_eq!(export_title(None), DEFAULT_TITLE);
    }

    #[test]
    fn test_export_file_name() {
        assert_eq!(export_file_name(Some(Path::new("/x/v1.2.md"))), "v1.2.html");
        assert_eq!(export_file_name(None), "document.html");
    }

    #[test]
    fn test_standalone_document() {
        let options = ExportOptions {
            theme: "dark".to_owned(),
            font_size: 18,
            title: "A <b> title".to_owned(),
            stylesheet: ".md-body { color: red; }".to_owned(),
        };
        let out = standalone_document("<h1 id=\"x\">X</h1>", &options);

        assert!(out.starts_with("<!DOCTYPE html>\n<html lang=\"en\" data-theme=\"dark\">"));
        assert!(out.contains("<title>A &lt;b&gt; title</title>"));
        assert!(out.contains(".md-body { color: red; }"));
        assert!(out.contains("style=\"--md-font-size: 18px\">\n<h1 id=\"x\">X</h1>\n</article>"));
        assert!(out.ends_with("</html>\n"));
    }

    #[test]
    fn test_stylesheet_cannot_close_style_element() {
        let options = ExportOptions {
            stylesheet: "</style><script>x</script>".to_owned(),
            ..ExportOptions::default()
        };
        let out = standalone_document("", &options);
        assert!(!out.contains("</style><script>"));
    }

    #[test]
    fn test_for_path() {
        let options = ExportOptions::for_path(Some(Path::new("/docs/intro.md")));
        assert_eq!(options.title, "intro");
        assert_eq!(options.font_size, 16);
    }
}
