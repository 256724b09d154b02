//! Table of contents for rendered documents.
//!
//! [`extract_headings`] reads the heading elements of sanitized HTML in
//! document order. [`TocTracker`] decides which of those headings is active
//! for a given scroll position. The tracker never touches a real layout
//! engine: the host reports geometry as `(id, top)` pairs in
//! [`ScrollGeometry`], which keeps the algorithm testable with synthetic
//! positions.
//!
//! # Example
//!
//! ```
//! use emdee_toc::{HeadingPosition, ScrollGeometry, TocTracker, TrackerConfig, extract_headings};
//!
//! let html = r##"<h1 id="a">A</h1><p>x</p><h2 id="b">B</h2>"##;
//! let mut tracker = TocTracker::new(TrackerConfig::default());
//! tracker.set_entries(extract_headings(html));
//! assert_eq!(tracker.active_id(), "a");
//!
//! let geometry = ScrollGeometry {
//!     viewport_top: 0.0,
//!     scroll_top: 400.0,
//!     scroll_height: 2000.0,
//!     client_height: 600.0,
//!     headings: vec![HeadingPosition::new("a", -400.0), HeadingPosition::new("b", 80.0)],
//! };
//! tracker.on_scroll(&geometry);
//! assert_eq!(tracker.active_id(), "b");
//! ```

mod extract;
mod tracker;

pub use emdee_view::{Heading, PERMALINK_CLASS};
pub use extract::{DEFAULT_MAX_LEVEL, extract_headings, extract_headings_up_to, headings_from_view};
pub use tracker::{
    HeadingPosition, ScrollGeometry, TocState, TocTracker, TrackerConfig, TrackerState,
    active_heading, scroll_target,
};
