use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use scraper::Html;

use crate::domain::{Category, ReleaseRecord, WatermarkState};
use crate::errors::{BotError, BotResult};
use crate::sources::http::Fetcher;
use crate::sources::traits::{ReleaseSource, SourceUpdate, WatermarkAdvance};

pub const WINBOX_SOURCE_KEY: &str = "winbox";

fn version_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"WinBox\s+([0-9][0-9A-Za-z.\-]*)\s+\(64-bit\)").expect("static regex")
    })
}

/// Extract the current WinBox version from the download page
pub fn extract_version(page: &str) -> BotResult<String> {
    let document = Html::parse_document(page);
    // Join text nodes with spaces so adjacent elements still match `\s+`
    let text = document.root_element().text().collect::<Vec<_>>().join(" ");

    version_pattern()
        .captures(&text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| {
            BotError::PatternNotFound("WinBox <version> (64-bit) on download page".to_string())
        })
}

/// Scrapes the download page; the version string is the watermark
pub struct WinboxSource {
    page_url: String,
}

impl WinboxSource {
    pub fn new(page_url: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
        }
    }

    fn release_record(&self, version: &str) -> ReleaseRecord {
        ReleaseRecord::new(
            WINBOX_SOURCE_KEY,
            format!("WinBox {}", version),
            Utc::now().timestamp_millis(),
        )
        .with_link(self.page_url.clone())
        .with_description(format!("WinBox {} is available for download.", version))
    }
}

#[async_trait]
impl ReleaseSource for WinboxSource {
    fn key(&self) -> &str {
        WINBOX_SOURCE_KEY
    }

    fn name(&self) -> &str {
        "WinBox"
    }

    fn default_category(&self) -> Option<Category> {
        None
    }

    async fn poll(&self, fetcher: &dyn Fetcher, state: &WatermarkState) -> BotResult<SourceUpdate> {
        let page = fetcher.fetch_text(&self.page_url).await?;
        let version = extract_version(&page)?;

        // Version strings have no ordering; any change is announced
        if version == state.last_seen_version {
            return Ok(SourceUpdate {
                source_key: WINBOX_SOURCE_KEY.to_string(),
                fresh: Vec::new(),
                advance: WatermarkAdvance::Unchanged,
            });
        }

        Ok(SourceUpdate {
            source_key: WINBOX_SOURCE_KEY.to_string(),
            fresh: vec![self.release_record(&version)],
            advance: WatermarkAdvance::Version(version),
        })
    }
}
