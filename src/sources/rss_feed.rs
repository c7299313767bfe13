use async_trait::async_trait;
use feed_rs::parser;
use tracing::warn;

use crate::domain::{Category, ReleaseRecord, WatermarkState};
use crate::errors::{BotError, BotResult};
use crate::services::detector::detect;
use crate::services::formatter::resolve_category;
use crate::sources::http::Fetcher;
use crate::sources::traits::{ReleaseSource, SourceUpdate, WatermarkAdvance};

/// A release feed with a single implied category
pub struct RssFeedSource {
    url: String,
    name: String,
    category: Option<Category>,
}

impl RssFeedSource {
    pub fn new(url: impl Into<String>, name: impl Into<String>, category: Option<Category>) -> Self {
        Self {
            url: url.into(),
            name: name.into(),
            category,
        }
    }

    /// Parse releases from raw feed bytes
    ///
    /// Entries without a usable date cannot be compared against a watermark
    /// and are skipped.
    pub fn parse_records(&self, bytes: &[u8]) -> BotResult<Vec<ReleaseRecord>> {
        let parsed = parser::parse(bytes).map_err(|e| BotError::FeedParse(e.to_string()))?;

        let records = parsed
            .entries
            .into_iter()
            .filter_map(|entry| {
                let title = entry
                    .title
                    .map(|t| t.content.trim().to_string())
                    .unwrap_or_else(|| "Untitled".to_string());

                let Some(published) = entry.published.or(entry.updated) else {
                    warn!(source = %self.url, title = %title, "skipping entry without a valid date");
                    return None;
                };

                let link = entry
                    .links
                    .into_iter()
                    .next()
                    .map(|l| l.href)
                    .unwrap_or_default();

                let description = entry
                    .summary
                    .map(|s| s.content)
                    .or_else(|| entry.content.and_then(|c| c.body))
                    .unwrap_or_default();

                let category = resolve_category(&title, self.category);

                Some(
                    ReleaseRecord::new(self.url.clone(), title, published.timestamp_millis())
                        .with_link(link)
                        .with_category(category)
                        .with_description(description),
                )
            })
            .collect();

        Ok(records)
    }
}

#[async_trait]
impl ReleaseSource for RssFeedSource {
    fn key(&self) -> &str {
        &self.url
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn default_category(&self) -> Option<Category> {
        self.category
    }

    async fn poll(&self, fetcher: &dyn Fetcher, state: &WatermarkState) -> BotResult<SourceUpdate> {
        let body = fetcher.fetch_text(&self.url).await?;
        let records = self.parse_records(body.as_bytes())?;

        let detection = detect(&self.url, records, state.timestamp(&self.url));

        Ok(SourceUpdate {
            source_key: self.url.clone(),
            fresh: detection.fresh,
            advance: WatermarkAdvance::Timestamp(detection.watermark),
        })
    }
}
