use async_trait::async_trait;

use crate::domain::{Category, ReleaseRecord, WatermarkState};
use crate::errors::BotResult;
use crate::sources::http::Fetcher;

/// How a successful poll moves the source's watermark
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatermarkAdvance {
    Timestamp(i64),
    Version(String),
    Unchanged,
}

/// Result of polling one source for one cycle
#[derive(Debug, Clone)]
pub struct SourceUpdate {
    pub source_key: String,
    /// Newly detected releases, in the order the source listed them
    pub fresh: Vec<ReleaseRecord>,
    pub advance: WatermarkAdvance,
}

impl SourceUpdate {
    pub fn apply(&self, state: &mut WatermarkState) {
        match &self.advance {
            WatermarkAdvance::Timestamp(ts) => state.advance_timestamp(&self.source_key, *ts),
            WatermarkAdvance::Version(version) => state.last_seen_version = version.clone(),
            WatermarkAdvance::Unchanged => {}
        }
    }
}

#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Key under which the watermark is stored
    fn key(&self) -> &str;

    /// Human readable name
    fn name(&self) -> &str;

    /// Category implied by the source when a title carries no tag
    fn default_category(&self) -> Option<Category>;

    /// Fetch, parse and compare against the watermark
    async fn poll(&self, fetcher: &dyn Fetcher, state: &WatermarkState) -> BotResult<SourceUpdate>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_timestamp_never_lowers() {
        let mut state = WatermarkState::default();
        state.advance_timestamp("stable", 500);

        SourceUpdate {
            source_key: "stable".to_string(),
            fresh: Vec::new(),
            advance: WatermarkAdvance::Timestamp(100),
        }
        .apply(&mut state);

        assert_eq!(state.timestamp("stable"), 500);
    }

    #[test]
    fn test_apply_version() {
        let mut state = WatermarkState::default();

        SourceUpdate {
            source_key: "winbox".to_string(),
            fresh: Vec::new(),
            advance: WatermarkAdvance::Version("4.0".to_string()),
        }
        .apply(&mut state);

        assert_eq!(state.last_seen_version, "4.0");
        assert!(state.last_seen_timestamp.is_empty());
    }
}
