//! Reader session for a single displayed document.
//!
//! [`ReaderSession`] owns the current [`Document`], its render, the table of
//! contents tracker and the search state. Opening a document bumps a
//! generation counter, resets navigation state synchronously and returns the
//! [`Activation`]s the document may need. Completions are applied only while
//! the generation they were issued for is still current:
//!
//! ```no_run
//! # async fn run() -> Result<(), emdee_session::SessionError> {
//! use std::sync::Arc;
//!
//! use emdee_extensions::ExtensionLoader;
//! use emdee_renderer::{BuiltinExtensions, Pipeline};
//! use emdee_session::ReaderSession;
//!
//! let loader = Arc::new(ExtensionLoader::new(BuiltinExtensions));
//! let mut session = ReaderSession::new(Pipeline::default(), loader);
//!
//! for activation in session.open_path("notes.md")? {
//!     let completion = activation.run().await;
//!     session.apply(completion);
//! }
//! println!("{}", session.html());
//! # Ok(())
//! # }
//! ```

mod announce;
mod document;
mod error;
pub mod export;
mod session;
pub mod stats;

pub use announce::{Announcer, RecordingAnnouncer, SilentAnnouncer};
pub use document::{Document, UNTITLED};
pub use error::SessionError;
pub use export::{ExportOptions, standalone_document};
pub use session::{Activation, Completion, ReaderSession};
pub use stats::{ReadingStats, reading_stats};
