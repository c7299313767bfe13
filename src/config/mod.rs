use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::errors::{BotError, BotResult};

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub webhook_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    pub state_path: PathBuf,
    pub debug: bool,
    pub once: bool,
}

impl Config {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    pub fn from_env() -> BotResult<Self> {
        let exe_dir = Self::exe_dir();

        // Try to load .env from executable's directory first
        if let Some(ref dir) = exe_dir {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        let default_state = exe_dir
            .map(|d| d.join("state.json"))
            .unwrap_or_else(|| PathBuf::from("./state.json"));

        Self::from_lookup(|key| std::env::var(key).ok(), default_state)
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F, default_state: PathBuf) -> BotResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let webhook_url = lookup("WEBHOOK_URL")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| BotError::MissingEnvVar("WEBHOOK_URL".to_string()))?;

        let parsed = Url::parse(&webhook_url).map_err(|e| BotError::InvalidUrl(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BotError::Config(format!(
                "WEBHOOK_URL must be http or https, got {}",
                parsed.scheme()
            )));
        }

        // Unset or non-integer values fall back to the default
        let timeout_ms = lookup("REQUEST_TIMEOUT_MS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);

        let interval_secs = lookup("POLL_INTERVAL_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .unwrap_or(DEFAULT_POLL_INTERVAL_SECS);

        let state_path = lookup("STATE_PATH")
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(default_state);

        Ok(Self {
            webhook_url,
            request_timeout: Duration::from_millis(timeout_ms),
            poll_interval: Duration::from_secs(interval_secs),
            state_path,
            debug: lookup("DEBUG").is_some_and(|v| is_truthy(&v)),
            once: lookup("ONCE").is_some_and(|v| is_truthy(&v)),
        })
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
