use std::sync::Arc;

use crate::domain::Category;
use crate::sources::rss_feed::RssFeedSource;
use crate::sources::traits::ReleaseSource;
use crate::sources::winbox::WinboxSource;

/// Release feeds polled every cycle, each with the category it implies
pub const RELEASE_FEEDS: &[(&str, &str, Category)] = &[
    (
        "https://cdn.mikrotik.com/routeros/latest-long-term.rss",
        "RouterOS long-term",
        Category::LongTerm,
    ),
    (
        "https://cdn.mikrotik.com/routeros/latest-stable.rss",
        "RouterOS stable",
        Category::Stable,
    ),
    (
        "https://cdn.mikrotik.com/routeros/latest-testing.rss",
        "RouterOS testing",
        Category::Testing,
    ),
    (
        "https://cdn.mikrotik.com/routeros/latest-development.rss",
        "RouterOS development",
        Category::Development,
    ),
];

/// Page scraped for the current WinBox version
pub const DOWNLOAD_PAGE_URL: &str = "https://mikrotik.com/download";

pub struct SourceRegistry {
    sources: Vec<Arc<dyn ReleaseSource>>,
}

impl SourceRegistry {
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// The fixed set of vendor sources
    pub fn new() -> Self {
        let mut registry = Self::empty();

        for (url, name, category) in RELEASE_FEEDS {
            registry.register(Arc::new(RssFeedSource::new(*url, *name, Some(*category))));
        }
        registry.register(Arc::new(WinboxSource::new(DOWNLOAD_PAGE_URL)));

        registry
    }

    pub fn register(&mut self, source: Arc<dyn ReleaseSource>) {
        self.sources.push(source);
    }

    /// Sources in polling order
    pub fn sources(&self) -> &[Arc<dyn ReleaseSource>] {
        &self.sources
    }

    pub fn find(&self, key: &str) -> Option<&dyn ReleaseSource> {
        self.sources
            .iter()
            .find(|s| s.key() == key)
            .map(|s| s.as_ref())
    }

    /// Category implied by a source key, if the source has one
    pub fn default_category(&self, key: &str) -> Option<Category> {
        self.find(key).and_then(|s| s.default_category())
    }
}

impl Default for SourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::winbox::WINBOX_SOURCE_KEY;

    #[test]
    fn test_builtin_sources() {
        let registry = SourceRegistry::new();

        assert_eq!(registry.sources().len(), RELEASE_FEEDS.len() + 1);
        assert_eq!(registry.sources()[0].key(), RELEASE_FEEDS[0].0);
        assert_eq!(
            registry.sources().last().map(|s| s.key()),
            Some(WINBOX_SOURCE_KEY)
        );
    }

    #[test]
    fn test_each_feed_has_its_category() {
        let registry = SourceRegistry::new();

        for (url, _, category) in RELEASE_FEEDS {
            assert_eq!(registry.default_category(url), Some(*category));
        }
        assert_eq!(registry.default_category(WINBOX_SOURCE_KEY), None);
        assert_eq!(registry.default_category("https://unknown.example/feed"), None);
    }

    #[test]
    fn test_feed_keys_unique() {
        let mut seen = std::collections::HashSet::new();
        for (url, _, _) in RELEASE_FEEDS {
            assert!(seen.insert(url), "Duplicate feed found: {}", url);
        }
    }
}
