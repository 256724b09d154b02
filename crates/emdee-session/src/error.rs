//! Error types for the reader session.

use std::path::PathBuf;

/// Session errors.
///
/// A failed open leaves the current document and its render untouched.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Could not read file: {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
