//! Path registry: the naming authority for mirrored pages
//!
//! Entries are created lazily by whichever comes first, fetching a page or
//! rewriting a link to it. A forward reference therefore resolves to the
//! same filename the page is saved under later.

use crate::url::page_filename;
use std::collections::HashMap;
use std::sync::Arc;
use url::Url;

/// Maps canonical URLs to local Markdown filenames
#[derive(Debug, Default)]
pub struct PathRegistry {
    entries: HashMap<String, Arc<str>>,
}

impl PathRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the filename for `url`, minting and recording it on first use
    ///
    /// Repeated calls hand out clones of the same shared string.
    pub fn path_for(&mut self, url: &Url) -> Arc<str> {
        if let Some(existing) = self.entries.get(url.as_str()) {
            return Arc::clone(existing);
        }

        let filename: Arc<str> = Arc::from(page_filename(url));
        tracing::trace!("Registered {} -> {}", url, filename);
        self.entries
            .insert(url.to_string(), Arc::clone(&filename));
        filename
    }

    /// Number of registered URLs
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
