pub mod error;

pub use error::{BrowserlessError, Result};

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

/// Desktop Chrome user agent; some wikis serve a bot wall to headless defaults.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// How long Browserless may spend navigating before giving up.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(60);

/// Options for a single `/content` render.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Extra time to let client-side scripts hydrate after `domcontentloaded`.
    pub settle: Duration,
    pub user_agent: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(5),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GotoOptions {
    wait_until: &'static str,
    timeout: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ContentRequest<'a> {
    url: &'a str,
    user_agent: &'a str,
    goto_options: GotoOptions,
    wait_for_timeout: u64,
}

pub struct BrowserlessClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl BrowserlessClient {
    pub fn new(base_url: &str, token: Option<&str>) -> Result<Self> {
        // Navigation budget plus a generous settle allowance.
        let client = reqwest::Client::builder()
            .timeout(NAVIGATION_TIMEOUT + Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.map(String::from),
        })
    }

    /// Fetch fully-rendered HTML content for a URL via Browserless /content endpoint.
    pub async fn content(&self, url: &str, options: &RenderOptions) -> Result<String> {
        let mut endpoint = format!("{}/content", self.base_url);
        if let Some(ref token) = self.token {
            endpoint.push_str(&format!("?token={token}"));
        }

        let body = ContentRequest {
            url,
            user_agent: &options.user_agent,
            goto_options: GotoOptions {
                wait_until: "domcontentloaded",
                timeout: NAVIGATION_TIMEOUT.as_millis() as u64,
            },
            wait_for_timeout: options.settle.as_millis() as u64,
        };

        debug!(url, settle_ms = body.wait_for_timeout, "Browserless content request");

        let resp = self
            .client
            .post(&endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(BrowserlessError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(resp.text().await?)
    }
}
