mod client;
pub(crate) mod types;

use crate::error::{AiError, Result};

use client::GeminiClient;
use types::GenerateContentRequest;

pub const API_KEY_VAR: &str = "GEMINI_API_KEY";

// =============================================================================
// Gemini
// =============================================================================

/// Text-generation client for the Gemini `generateContent` API.
///
/// The credential is optional at construction time; a missing key surfaces as
/// [`AiError::MissingCredential`] on the first call instead.
#[derive(Clone)]
pub struct Gemini {
    api_key: Option<String>,
    base_url: Option<String>,
}

impl Gemini {
    pub fn new(api_key: Option<String>) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            base_url: None,
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    pub fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    fn client(&self) -> Result<GeminiClient> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(AiError::MissingCredential(API_KEY_VAR))?;
        let client = GeminiClient::new(api_key);
        Ok(match self.base_url {
            Some(ref url) => client.with_base_url(url),
            None => client,
        })
    }

    /// Send a single user prompt to `model` and return the answer text.
    pub async fn generate(&self, model: &str, prompt: &str) -> Result<String> {
        let client = self.client()?;

        let request = GenerateContentRequest::prompt(prompt);
        let response = client.generate_content(model, &request).await?;
        response
            .text()
            .ok_or_else(|| AiError::EmptyResponse(response.empty_reason()))
    }
}
