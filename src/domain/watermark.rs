use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// What has already been announced, per source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WatermarkState {
    pub last_seen_timestamp: BTreeMap<String, i64>,
    pub last_seen_version: String,
}

impl WatermarkState {
    /// Watermark for a feed source, zero when never seen
    pub fn timestamp(&self, source_key: &str) -> i64 {
        self.last_seen_timestamp
            .get(source_key)
            .copied()
            .unwrap_or(0)
    }

    /// Raise the watermark for a source; lower values are ignored
    pub fn advance_timestamp(&mut self, source_key: &str, value: i64) {
        if value > self.timestamp(source_key) {
            self.last_seen_timestamp
                .insert(source_key.to_string(), value);
        }
    }
}
