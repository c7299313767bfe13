use chrono::{DateTime, Utc};
use webhook::{Embed, EmbedFooter, WebhookError};

use super::Category;

/// Color used when a release has no known category
pub const NEUTRAL_COLOR: &str = "#95A5A6";

/// A notification ready for delivery; built once per detected release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub title: String,
    pub color: String,
    pub description: String,
    pub link: String,
    pub timestamp: DateTime<Utc>,
    pub category: Option<Category>,
}

impl OutboundMessage {
    /// One-line rendering used for logs and dry runs
    pub fn format(&self) -> String {
        let mut line = match self.category {
            Some(category) => format!("[{}] {}", category.label(), self.title),
            None => self.title.clone(),
        };

        if !self.link.is_empty() {
            line.push(' ');
            line.push_str(&self.link);
        }

        line
    }

    pub fn to_embed(&self) -> Result<Embed, WebhookError> {
        Ok(Embed {
            title: self.title.clone(),
            description: self.description.clone(),
            url: (!self.link.is_empty()).then(|| self.link.clone()),
            color: webhook::parse_color(&self.color)?,
            timestamp: Some(self.timestamp.to_rfc3339()),
            footer: self.category.map(|c| EmbedFooter {
                text: c.label().to_string(),
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn message(category: Option<Category>, link: &str) -> OutboundMessage {
        OutboundMessage {
            title: "RouterOS 7.2 [testing]".to_string(),
            color: category.map(|c| c.color()).unwrap_or(NEUTRAL_COLOR).to_string(),
            description: "What's new in 7.2".to_string(),
            link: link.to_string(),
            timestamp: Utc.with_ymd_and_hms(2022, 3, 1, 12, 0, 0).unwrap(),
            category,
        }
    }

    #[test]
    fn test_format_with_category_and_link() {
        let msg = message(Some(Category::Testing), "https://mikrotik.com/download");
        assert_eq!(
            msg.format(),
            "[Testing] RouterOS 7.2 [testing] https://mikrotik.com/download"
        );
    }

    #[test]
    fn test_format_without_category_or_link() {
        let msg = message(None, "");
        assert_eq!(msg.format(), "RouterOS 7.2 [testing]");
    }

    #[test]
    fn test_to_embed() {
        let embed = message(Some(Category::Testing), "https://mikrotik.com/download")
            .to_embed()
            .unwrap();

        assert_eq!(embed.color, 0xE74C3C);
        assert_eq!(embed.url.as_deref(), Some("https://mikrotik.com/download"));
        assert_eq!(embed.footer.unwrap().text, "Testing");
        assert_eq!(embed.timestamp.as_deref(), Some("2022-03-01T12:00:00+00:00"));
    }

    #[test]
    fn test_to_embed_neutral() {
        let embed = message(None, "").to_embed().unwrap();
        assert_eq!(embed.color, 0x95A5A6);
        assert!(embed.url.is_none());
        assert!(embed.footer.is_none());
    }
}
