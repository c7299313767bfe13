use thiserror::Error;

#[derive(Error, Debug)]
pub enum BotError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    FetchStatus { url: String, status: u16 },

    // Parsing errors
    #[error("Feed parsing failed: {0}")]
    FeedParse(String),

    #[error("Pattern not found: {0}")]
    PatternNotFound(String),

    // Storage errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to persist state: {0}")]
    Persist(String),

    // Notification errors
    #[error("Delivery failed: {0}")]
    Delivery(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<webhook::WebhookError> for BotError {
    fn from(err: webhook::WebhookError) -> Self {
        BotError::Delivery(err.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;
