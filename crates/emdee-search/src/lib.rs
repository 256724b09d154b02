//! Find-in-document over the realized text of a rendered document.
//!
//! A [`SearchSession`] owns the [`DocumentView`](emdee_view::DocumentView)
//! of the displayed document. Queries are matched literally and
//! case-insensitively inside individual text nodes; matches never span
//! element boundaries. [`SearchSession::highlighted_html`] re-emits the
//! document with `<mark>` elements around the matches.

mod session;

pub use session::{ACTIVE_MARK_CLASS, MARK_CLASS, MatchContext, SearchMatch, SearchSession};
