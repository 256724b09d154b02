//! Immutable document handed to the session.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SessionError;

/// Name shown for documents without a location.
pub const UNTITLED: &str = "Untitled";

/// Raw markdown text and where it came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Document {
    raw_text: String,
    source_location: Option<PathBuf>,
}

impl Document {
    pub fn new(raw_text: impl Into<String>, source_location: Option<PathBuf>) -> Self {
        Self {
            raw_text: raw_text.into(),
            source_location,
        }
    }

    /// Read a document from disk.
    pub fn read(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let raw_text = fs::read_to_string(path).map_err(|source| SessionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), bytes = raw_text.len(), "Read document");
        Ok(Self::new(raw_text, Some(path.to_path_buf())))
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn source_location(&self) -> Option<&Path> {
        self.source_location.as_deref()
    }

    /// File name for announcements and titles.
    pub fn display_name(&self) -> String {
        self.source_location
            .as_deref()
            .and_then(Path::file_name)
            .map_or_else(|| UNTITLED.to_owned(), |name| name.to_string_lossy().into_owned())
    }
}
