// src/crawl/seen.rs

//! Deduplication set for admitted URLs.

use std::collections::HashSet;
use std::sync::Mutex;

use url::Url;

/// Concurrent set of every canonical URL ever admitted to the frontier.
///
/// Insertion is the linearization point that keeps a URL from being scheduled
/// twice. Entries are never removed, so memory grows with the distinct
/// in-domain URL count for the lifetime of the crawl.
#[derive(Default)]
pub struct SeenSet {
    inner: Mutex<HashSet<Url>>,
}

impl SeenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert if absent. Returns `true` exactly once per URL.
    pub fn try_mark(&self, url: &Url) -> bool {
        self.inner.lock().unwrap().insert(url.clone())
    }

    /// Number of distinct URLs ever marked.
    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
