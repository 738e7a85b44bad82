// Model Gateway: one prompt in, one completion out.
//
// Retries are deliberately absent here; the reconciler re-drives whole
// records instead of individual calls.

use ai_client::{AiError, Gemini};
use async_trait::async_trait;
use persona_common::GatewayError;

#[async_trait]
pub trait ModelGateway: Send + Sync {
    async fn invoke(&self, prompt: &str, model: &str) -> Result<String, GatewayError>;
}

#[async_trait]
impl ModelGateway for Gemini {
    async fn invoke(&self, prompt: &str, model: &str) -> Result<String, GatewayError> {
        self.generate(model, prompt).await.map_err(gateway_error)
    }
}

fn gateway_error(err: AiError) -> GatewayError {
    match err {
        AiError::MissingCredential(_) => GatewayError::Authentication(err.to_string()),
        other => GatewayError::Generation(other.to_string()),
    }
}
