use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::errors::{BotError, BotResult};

const USER_AGENT: &str = concat!("releasebot/", env!("CARGO_PKG_VERSION"));

/// Retrieves the body of a page or feed
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> BotResult<String>;
}

pub struct HttpFetcher {
    client: Client,
    max_attempts: u8,
    base_backoff: Duration,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> BotResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            max_attempts: 3,
            base_backoff: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_attempts: u8, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    fn backoff(&self, attempt: u8) -> Duration {
        self.base_backoff * 2u32.pow(u32::from(attempt.saturating_sub(1)))
    }

    async fn fetch_once(&self, url: &str) -> BotResult<String> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(BotError::FetchStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}

/// Failures worth another attempt: timeouts, connection problems, 5xx and 429
fn is_transient(err: &BotError) -> bool {
    match err {
        BotError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
        BotError::FetchStatus { status, .. } => {
            *status == StatusCode::TOO_MANY_REQUESTS.as_u16() || *status >= 500
        }
        _ => false,
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> BotResult<String> {
        let mut attempt: u8 = 0;
        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt < self.max_attempts && is_transient(&e) => {
                    let wait = self.backoff(attempt);
                    debug!(url, attempt, error = %e, "fetch failed, retrying in {:?}", wait);
                    tokio::time::sleep(wait).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles() {
        let fetcher = HttpFetcher::new(Duration::from_secs(1))
            .unwrap()
            .with_retries(3, Duration::from_millis(100));

        assert_eq!(fetcher.backoff(1), Duration::from_millis(100));
        assert_eq!(fetcher.backoff(2), Duration::from_millis(200));
        assert_eq!(fetcher.backoff(3), Duration::from_millis(400));
    }

    #[test]
    fn test_transient_statuses() {
        let status = |status| BotError::FetchStatus {
            url: "https://example.com".to_string(),
            status,
        };

        assert!(is_transient(&status(503)));
        assert!(is_transient(&status(429)));
        assert!(!is_transient(&status(404)));
        assert!(!is_transient(&BotError::FeedParse("bad".to_string())));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let fetcher = HttpFetcher::new(Duration::from_millis(500))
            .unwrap()
            .with_retries(2, Duration::from_millis(10));

        // Port 9 on localhost is not expected to be listening
        let result = fetcher.fetch_text("http://127.0.0.1:9/feed.rss").await;
        assert!(matches!(result, Err(BotError::Http(_))));
    }

    #[tokio::test]
    async fn test_silent_server_times_out() {
        // Accepts connections but never answers
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/feed.rss", listener.local_addr().unwrap());

        let fetcher = HttpFetcher::new(Duration::from_millis(100))
            .unwrap()
            .with_retries(1, Duration::from_millis(1));

        let result = fetcher.fetch_text(&url).await;
        assert!(matches!(result, Err(BotError::Http(ref e)) if e.is_timeout()));
        drop(listener);
    }
}
