//! Render memoization keyed by content hash.
//!
//! A render is fully determined by the raw text, the document location, the
//! capability snapshot and the asset resolver in use, so [`RenderKey`]
//! hashes exactly those.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::Arc;

use emdee_extensions::Capabilities;
use sha2::{Digest, Sha256};

use crate::pipeline::RenderResult;

/// Default number of memoized renders.
pub const DEFAULT_MEMO_ENTRIES: usize = 8;

/// Inputs that determine a render.
#[derive(Debug)]
pub struct RenderKey<'a> {
    pub raw_text: &'a str,
    pub source_location: Option<&'a Path>,
    pub capabilities: Capabilities,
    /// Scheme of the configured asset resolver, empty when none.
    pub resolver_scheme: &'a str,
}

impl RenderKey<'_> {
    /// Compute a content hash for this render key.
    ///
    /// # Hash Format
    ///
    /// SHA-256 of `"{capabilities}:{resolver}:{location}:{raw_text}"`, hex encoded.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let location = self
            .source_location
            .map(|path| path.to_string_lossy())
            .unwrap_or_default();
        let content = format!(
            "{}:{}:{}:{}",
            self.capabilities.bits(),
            self.resolver_scheme,
            location,
            self.raw_text
        );
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Bounded most-recently-used cache of render results.
pub struct RenderMemo {
    capacity: usize,
    /// Front is most recently used.
    entries: VecDeque<(String, Arc<RenderResult>)>,
}

impl RenderMemo {
    /// Create a memo holding at most `capacity` results (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Look up a result and mark it most recently used.
    pub fn get(&mut self, hash: &str) -> Option<Arc<RenderResult>> {
        let position = self.entries.iter().position(|(key, _)| key == hash)?;
        let entry = self.entries.remove(position)?;
        let result = Arc::clone(&entry.1);
        self.entries.push_front(entry);
        tracing::trace!(hash, "Render memo hit");
        Some(result)
    }

    /// Store a result, evicting the least recently used entry when full.
    pub fn insert(&mut self, hash: String, result: Arc<RenderResult>) {
        self.entries.retain(|(key, _)| *key != hash);
        if self.entries.len() == self.capacity
            && let Some((evicted, _)) = self.entries.pop_back()
        {
            tracing::debug!(hash = %evicted, "Render memo evicted entry");
        }
        self.entries.push_front((hash, result));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for RenderMemo {
    fn default() -> Self {
        Self::new(DEFAULT_MEMO_ENTRIES)
    }
}
