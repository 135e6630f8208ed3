use std::collections::HashMap;

/// Bookmarks referenced or written during one generation run.
///
/// A bookmark is *registered* when content links to it and *available* once
/// its target class has been written into this document. Only available
/// bookmarks become hyperlinks.
#[derive(Debug, Default)]
pub struct BookmarkRegistry {
    bookmarks: HashMap<String, bool>,
}

impl BookmarkRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Note a link to `id`. Does not change availability.
    pub fn register(&mut self, id: &str) {
        self.bookmarks.entry(id.to_owned()).or_insert(false);
    }

    /// Mark `id` as written into the document.
    pub fn mark_available(&mut self, id: &str) {
        self.bookmarks.insert(id.to_owned(), true);
    }

    #[must_use]
    pub fn is_available(&self, id: &str) -> bool {
        self.bookmarks.get(id).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn is_registered(&self, id: &str) -> bool {
        self.bookmarks.contains_key(id)
    }

    /// Number of known bookmarks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bookmarks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bookmarks.is_empty()
    }

    /// Number of available bookmarks.
    #[must_use]
    pub fn available(&self) -> usize {
        self.bookmarks.values().filter(|&&a| a).count()
    }

    pub fn clear(&mut self) {
        self.bookmarks.clear();
    }
}
