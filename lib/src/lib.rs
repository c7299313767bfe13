//! Chat webhook bindings for Rust
//! Posts embed messages to a Discord-compatible webhook endpoint

use std::time::Duration;

use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use thiserror::Error;

/// Longest wait honored for a 429 `Retry-After` header
const MAX_RETRY_AFTER: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum WebhookError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Webhook returned status {0}")]
    Status(u16),
    #[error("Rate limited by webhook")]
    RateLimited,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Invalid color: {0}")]
    InvalidColor(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedFooter {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Embed {
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub color: u32,
    /// RFC 3339 timestamp shown by the client next to the footer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub footer: Option<EmbedFooter>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WebhookPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub embeds: Vec<Embed>,
}

impl WebhookPayload {
    pub fn embed(embed: Embed) -> Self {
        Self {
            embeds: vec![embed],
            ..Self::default()
        }
    }
}

/// Parse a `#RRGGBB` (or bare `RRGGBB`) color into the integer form embeds use
pub fn parse_color(hex: &str) -> Result<u32, WebhookError> {
    let digits = hex.trim().trim_start_matches('#');
    if digits.len() != 6 {
        return Err(WebhookError::InvalidColor(hex.to_string()));
    }
    u32::from_str_radix(digits, 16).map_err(|_| WebhookError::InvalidColor(hex.to_string()))
}

pub struct WebhookClient {
    url: String,
    client: Client,
    max_attempts: u8,
}

impl WebhookClient {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, WebhookError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            url: url.to_string(),
            client,
            max_attempts: 3,
        })
    }

    /// Execute the webhook with the given payload
    ///
    /// Transport errors and 5xx responses are retried with exponential backoff.
    /// A 429 waits for the advertised `Retry-After` before the next attempt.
    pub async fn execute(&self, payload: &WebhookPayload) -> Result<(), WebhookError> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            let last = attempt >= self.max_attempts;

            let response = match self.client.post(&self.url).json(payload).send().await {
                Ok(response) => response,
                Err(_) if !last => {
                    tokio::time::sleep(backoff(attempt)).await;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let status = response.status();
            if status.is_success() {
                return Ok(());
            }

            match status {
                StatusCode::PAYLOAD_TOO_LARGE => return Err(WebhookError::PayloadTooLarge),
                StatusCode::TOO_MANY_REQUESTS if !last => {
                    let wait = retry_after(&response).unwrap_or_else(|| backoff(attempt));
                    tokio::time::sleep(wait).await;
                }
                StatusCode::TOO_MANY_REQUESTS => return Err(WebhookError::RateLimited),
                s if s.is_server_error() && !last => {
                    tokio::time::sleep(backoff(attempt)).await;
                }
                s => return Err(WebhookError::Status(s.as_u16())),
            }
        }
    }
}

fn backoff(attempt: u8) -> Duration {
    Duration::from_millis(500u64 << (attempt.saturating_sub(1)).min(6))
}

fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    let secs: f64 = response
        .headers()
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()?;
    if !secs.is_finite() || secs < 0.0 {
        return None;
    }
    Some(Duration::from_secs_f64(secs).min(MAX_RETRY_AFTER))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("#E74C3C").unwrap(), 0xE74C3C);
        assert_eq!(parse_color("3498db").unwrap(), 0x3498DB);
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#GGGGGG").is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        assert_eq!(backoff(1), Duration::from_millis(500));
        assert_eq!(backoff(2), Duration::from_millis(1000));
        assert_eq!(backoff(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_payload_skips_empty_fields() {
        let payload = WebhookPayload::embed(Embed {
            title: "RouterOS 7.2".to_string(),
            description: "What's new".to_string(),
            url: None,
            color: 0xE74C3C,
            timestamp: None,
            footer: Some(EmbedFooter {
                text: "Testing".to_string(),
            }),
        });

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("content").is_none());
        assert_eq!(json["embeds"][0]["color"], 0xE74C3C);
        assert_eq!(json["embeds"][0]["footer"]["text"], "Testing");
        assert!(json["embeds"][0].get("url").is_none());
    }
}
