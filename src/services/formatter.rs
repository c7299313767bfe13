//! Turns detected releases into outbound messages.
//!
//! The delivery surface caps embed descriptions, so descriptions are bounded
//! here by line count and by length. Truncation only ever degrades the text.

use std::sync::OnceLock;

use chrono::{TimeZone, Utc};
use regex::Regex;
use scraper::Html;

use crate::domain::{Category, OutboundMessage, ReleaseRecord, NEUTRAL_COLOR};

pub const MAX_DESCRIPTION_LINES: usize = 8;
pub const MAX_DESCRIPTION_CHARS: usize = 2048;
pub const TRUNCATION_MARKER: &str = "...";

fn line_break_tags() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<br\s*/?>|</(?:p|div|li|tr|h[1-6]|ul|ol|pre|blockquote)\s*>")
            .expect("static regex")
    })
}

/// Convert HTML to plain text, keeping line breaks
pub fn strip_markup(html: &str) -> String {
    let with_breaks = line_break_tags().replace_all(html, "\n");
    let fragment = Html::parse_fragment(&with_breaks);
    fragment.root_element().text().collect()
}

/// Strip markup and bound the description to what an embed can carry
pub fn format_description(raw: &str) -> String {
    let text = strip_markup(raw).replace("\r\n", "\n").replace('\r', "\n");

    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    let mut kept: Vec<String> = lines
        .iter()
        .take(MAX_DESCRIPTION_LINES)
        .map(|line| line.to_string())
        .collect();
    if lines.len() > MAX_DESCRIPTION_LINES {
        if let Some(last) = kept.last_mut() {
            last.push_str(TRUNCATION_MARKER);
        }
    }

    let joined = kept.join("\n");
    if joined.chars().count() <= MAX_DESCRIPTION_CHARS {
        return joined;
    }

    let keep = MAX_DESCRIPTION_CHARS - TRUNCATION_MARKER.chars().count();
    let mut truncated: String = joined.chars().take(keep).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Category from an explicit title tag, else the source's default
pub fn resolve_category(title: &str, source_default: Option<Category>) -> Option<Category> {
    Category::ALL
        .into_iter()
        .find(|category| title.contains(category.tag()))
        .or(source_default)
}

pub fn build_message(record: &ReleaseRecord) -> OutboundMessage {
    let timestamp = Utc
        .timestamp_millis_opt(record.published_at)
        .single()
        .unwrap_or_else(Utc::now);

    OutboundMessage {
        title: record.title.clone(),
        color: record
            .category
            .map(|c| c.color())
            .unwrap_or(NEUTRAL_COLOR)
            .to_string(),
        description: format_description(&record.raw_description),
        link: record.link.clone(),
        timestamp,
        category: record.category,
    }
}
