use std::collections::HashSet;

use url::Url;

/// Canonical key used for dedup: trimmed, scheme and host lowercased,
/// fragment dropped. Strings that do not parse as URLs are only trimmed.
pub fn normalize_url_for_dedupe(raw: &str) -> String {
    let trimmed = raw.trim();
    match Url::parse(trimmed) {
        Ok(mut url) => {
            url.set_fragment(None);
            let mut normalized = url.to_string();
            if url.path() == "/" && url.query().is_none() && normalized.ends_with('/') {
                normalized.pop();
            }
            normalized
        }
        Err(_) => trimmed.to_string(),
    }
}

/// Set of URLs this process has crawled or knows were crawled before.
///
/// Grows monotonically; nothing is ever removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitedIndex {
    urls: HashSet<String>,
    loaded: bool,
}

impl VisitedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// One-time hydration from persisted crawl results. Returns how many
    /// distinct URLs were added.
    pub fn load<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.urls.len();
        for url in urls {
            self.urls.insert(normalize_url_for_dedupe(url.as_ref()));
        }
        self.loaded = true;
        self.urls.len() - before
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(&normalize_url_for_dedupe(url))
    }

    /// Returns false if the URL was already present.
    pub fn add(&mut self, url: &str) -> bool {
        self.urls.insert(normalize_url_for_dedupe(url))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// URLs this worker pushed into the frontier and has not seen claimed back.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingSet {
    urls: HashSet<String>,
}

impl PendingSet {
    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(&normalize_url_for_dedupe(url))
    }

    pub fn insert(&mut self, url: &str) -> bool {
        self.urls.insert(normalize_url_for_dedupe(url))
    }

    pub fn remove(&mut self, url: &str) -> bool {
        self.urls.remove(&normalize_url_for_dedupe(url))
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

/// Per-worker dedup bookkeeping: what was crawled and what is queued locally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    visited: VisitedIndex,
    pending: PendingSet,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hydrate<I, S>(&mut self, urls: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.visited.load(urls)
    }

    pub fn visited(&self) -> &VisitedIndex {
        &self.visited
    }

    pub fn pending(&self) -> &PendingSet {
        &self.pending
    }

    pub fn is_visited(&self, url: &str) -> bool {
        self.visited.contains(url)
    }

    /// Records a crawl. The URL stops being locally pending.
    pub fn mark_visited(&mut self, url: &str) -> bool {
        self.pending.remove(url);
        self.visited.add(url)
    }

    /// Reserves `url` for enqueueing. Returns false when it was already
    /// visited or is already queued by this worker, in which case the caller
    /// must not enqueue it.
    pub fn reserve(&mut self, url: &str) -> bool {
        if self.visited.contains(url) {
            return false;
        }
        self.pending.insert(url)
    }

    /// Undoes a reservation whose enqueue failed.
    pub fn unreserve(&mut self, url: &str) {
        self.pending.remove(url);
    }

    /// A task for `url` left the frontier.
    pub fn claimed(&mut self, url: &str) {
        self.pending.remove(url);
    }
}
