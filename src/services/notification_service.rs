use async_trait::async_trait;
use webhook::{WebhookClient, WebhookPayload};

use crate::config::Config;
use crate::domain::OutboundMessage;
use crate::errors::BotResult;

/// Delivers one formatted message to the chat channel
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> BotResult<()>;
}

pub struct WebhookNotifier {
    client: WebhookClient,
    username: Option<String>,
}

impl WebhookNotifier {
    pub fn new(config: &Config) -> BotResult<Self> {
        let client = WebhookClient::new(&config.webhook_url, config.request_timeout)?;

        Ok(Self {
            client,
            username: None,
        })
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    fn payload(&self, message: &OutboundMessage) -> BotResult<WebhookPayload> {
        let mut payload = WebhookPayload::embed(message.to_embed()?);
        payload.username = self.username.clone();
        Ok(payload)
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &OutboundMessage) -> BotResult<()> {
        let payload = self.payload(message)?;
        self.client.execute(&payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Category;
    use crate::errors::BotError;
    use chrono::Utc;
    use std::path::PathBuf;
    use std::time::Duration;

    fn config(url: &str) -> Config {
        Config {
            webhook_url: url.to_string(),
            request_timeout: Duration::from_millis(500),
            poll_interval: Duration::from_secs(60),
            state_path: PathBuf::from("state.json"),
            debug: false,
            once: true,
        }
    }

    fn message(color: &str) -> OutboundMessage {
        OutboundMessage {
            title: "RouterOS 7.2 [testing]".to_string(),
            color: color.to_string(),
            description: "*) bgp - improved".to_string(),
            link: "https://mikrotik.com/download".to_string(),
            timestamp: Utc::now(),
            category: Some(Category::Testing),
        }
    }

    #[test]
    fn test_payload_carries_username_and_embed() {
        let notifier = WebhookNotifier::new(&config("https://example.com/hook"))
            .unwrap()
            .with_username("RouterOS releases");

        let payload = notifier.payload(&message("#E74C3C")).unwrap();
        assert_eq!(payload.username.as_deref(), Some("RouterOS releases"));
        assert_eq!(payload.embeds.len(), 1);
        assert_eq!(payload.embeds[0].color, 0xE74C3C);
    }

    #[tokio::test]
    async fn test_bad_color_is_delivery_error() {
        let notifier = WebhookNotifier::new(&config("https://example.com/hook")).unwrap();

        let result = notifier.send(&message("red")).await;
        assert!(matches!(result, Err(BotError::Delivery(_))));
    }
}
