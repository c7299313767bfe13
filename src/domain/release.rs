use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    LongTerm,
    Stable,
    Testing,
    Development,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::LongTerm,
        Category::Stable,
        Category::Testing,
        Category::Development,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Category::LongTerm => "Long-term",
            Category::Stable => "Stable",
            Category::Testing => "Testing",
            Category::Development => "Development",
        }
    }

    /// Bracketed tag the vendor puts in release titles
    pub fn tag(&self) -> &'static str {
        match self {
            Category::LongTerm => "[long-term]",
            Category::Stable => "[stable]",
            Category::Testing => "[testing]",
            Category::Development => "[development]",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::LongTerm => "#2ECC71",
            Category::Stable => "#3498DB",
            Category::Testing => "#E74C3C",
            Category::Development => "#9B59B6",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A release announcement parsed from a feed item or scraped page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub title: String,
    pub link: String,
    /// Epoch milliseconds
    pub published_at: i64,
    pub category: Option<Category>,
    pub raw_description: String,
    pub source_key: String,
}

impl ReleaseRecord {
    pub fn new(source_key: impl Into<String>, title: impl Into<String>, published_at: i64) -> Self {
        Self {
            title: title.into(),
            link: String::new(),
            published_at,
            category: None,
            raw_description: String::new(),
            source_key: source_key.into(),
        }
    }

    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.link = link.into();
        self
    }

    pub fn with_category(mut self, category: Option<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.raw_description = description.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_and_tags() {
        assert_eq!(Category::LongTerm.label(), "Long-term");
        assert_eq!(Category::LongTerm.tag(), "[long-term]");
        assert_eq!(Category::Testing.color(), "#E74C3C");
        assert_eq!(Category::Development.to_string(), "Development");
    }

    #[test]
    fn test_record_builder() {
        let record = ReleaseRecord::new("stable", "RouterOS 7.1", 1_000)
            .with_link("https://mikrotik.com/download")
            .with_category(Some(Category::Stable))
            .with_description("<p>fixes</p>");

        assert_eq!(record.source_key, "stable");
        assert_eq!(record.published_at, 1_000);
        assert_eq!(record.category, Some(Category::Stable));
        assert_eq!(record.raw_description, "<p>fixes</p>");
    }
}
