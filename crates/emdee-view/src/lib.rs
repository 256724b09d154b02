//! Realized-structure view over sanitized document HTML.
//!
//! The presentation layer mounts the sanitized HTML produced by the renderer.
//! Table-of-contents extraction and in-document search both operate on that
//! realized structure rather than on the markdown source. [`DocumentView`]
//! is the host-independent stand-in for it: a streaming scan of the HTML into
//! an ordered list of markup and text segments, plus the heading elements
//! found along the way.
//!
//! # Example
//!
//! ```
//! use emdee_view::DocumentView;
//!
//! let view = DocumentView::parse(r##"<h2 id="intro">Intro <a class="header-anchor" href="#intro">#</a></h2><p>Body</p>"##)
//!     .unwrap();
//! assert_eq!(view.headings()[0].text, "Intro");
//! assert_eq!(view.text_nodes().count(), 3);
//! ```

mod heading;
mod scan;

pub use heading::Heading;
pub use scan::{DocumentView, Segment, TextNode, ViewError, escape_text};

/// Class carried by the generated permalink anchor inside each heading.
pub const PERMALINK_CLASS: &str = "header-anchor";
