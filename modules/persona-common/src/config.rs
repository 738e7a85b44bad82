use std::env;
use std::path::PathBuf;

use tracing::info;

use crate::error::ConfigError;

pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";
pub const DEFAULT_RETRY_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_OUTPUT_FILE: &str = "final_actors.json";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Model
    pub gemini_api_key: Option<String>,
    pub model: String,
    /// Cheaper model used when re-driving defective entries.
    pub retry_model: String,

    // Rendering
    pub browserless_url: String,
    pub browserless_token: Option<String>,
    pub settle_ms: u64,

    // Extraction
    /// Substring a profile image URL must contain to be accepted.
    pub image_host: String,

    // Persistence
    /// Default collection path; `--file` overrides it per command.
    pub output_file: PathBuf,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// A missing `GEMINI_API_KEY` is not an error here; model calls fail with
    /// an authentication error instead.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str, default: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };

        let settle_raw = var("PERSONA_SETTLE_MS", "5000");
        let settle_ms = settle_raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key: "PERSONA_SETTLE_MS",
            expected: "a number of milliseconds",
            value: settle_raw.clone(),
        })?;

        Ok(Self {
            gemini_api_key: lookup("GEMINI_API_KEY").filter(|v| !v.trim().is_empty()),
            model: var("PERSONA_MODEL", DEFAULT_MODEL),
            retry_model: var("PERSONA_RETRY_MODEL", DEFAULT_RETRY_MODEL),
            browserless_url: var("BROWSERLESS_URL", "http://localhost:3000"),
            browserless_token: lookup("BROWSERLESS_TOKEN").filter(|v| !v.trim().is_empty()),
            settle_ms,
            image_host: var("PERSONA_IMAGE_HOST", "namu"),
            output_file: PathBuf::from(var("PERSONA_OUTPUT_FILE", DEFAULT_OUTPUT_FILE)),
        })
    }

    /// Log the effective settings without secrets.
    pub fn log_redacted(&self) {
        info!(
            model = self.model.as_str(),
            retry_model = self.retry_model.as_str(),
            browserless_url = self.browserless_url.as_str(),
            browserless_token = if self.browserless_token.is_some() { "set" } else { "unset" },
            gemini_api_key = if self.gemini_api_key.is_some() { "set" } else { "unset" },
            settle_ms = self.settle_ms,
            image_host = self.image_host.as_str(),
            "Configuration loaded"
        );
    }
}
