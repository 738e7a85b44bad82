// Field extractors.
//
// Each extractor renders one single-purpose prompt over a bounded slice of the
// page, sends it through the gateway, and decodes the answer. Extractors never
// see each other's output, so they can be re-run in any order.

mod emotional;
mod identity;
mod narrative;
mod personality;
mod profile_image;

pub use emotional::EmotionalSpectrumExtractor;
pub use identity::IdentityExtractor;
pub use narrative::NarrativeRoleExtractor;
pub use personality::PersonalityExtractor;
pub use profile_image::ProfileImageExtractor;

use ai_client::truncate_chars;
use persona_common::GatewayError;
use tracing::debug;

use crate::gateway::ModelGateway;

/// Characters of plain text shown to text-driven extractors.
pub const TEXT_LIMIT_CHARS: usize = 15_000;

/// Characters of raw markup shown to the profile image extractor.
pub const MARKUP_LIMIT_CHARS: usize = 8_000;

/// The parts of a fetched page an extractor may look at.
#[derive(Debug, Clone, Copy)]
pub struct PageSource<'a> {
    pub text: &'a str,
    pub markup: &'a str,
}

impl<'a> PageSource<'a> {
    pub fn new(text: &'a str, markup: &'a str) -> Self {
        Self { text, markup }
    }

    pub fn text_slice(&self) -> &'a str {
        truncate_chars(self.text, TEXT_LIMIT_CHARS)
    }

    pub fn markup_slice(&self) -> &'a str {
        truncate_chars(self.markup, MARKUP_LIMIT_CHARS)
    }
}

pub trait FieldExtractor: Send + Sync {
    type Output: Send;

    /// Short name for logs.
    const NAME: &'static str;

    fn render(&self, page: &PageSource<'_>) -> String;

    /// Decode a raw model answer. Never fails past this point; decode
    /// problems are part of `Output`.
    fn decode(&self, response: &str) -> Self::Output;
}

/// Render, invoke, decode.
pub async fn run_extractor<E: FieldExtractor>(
    extractor: &E,
    gateway: &dyn ModelGateway,
    page: &PageSource<'_>,
    model: &str,
) -> Result<E::Output, GatewayError> {
    let prompt = extractor.render(page);
    debug!(
        extractor = E::NAME,
        model,
        prompt_chars = prompt.chars().count(),
        "Running field extractor"
    );
    let response = gateway.invoke(&prompt, model).await?;
    Ok(extractor.decode(&response))
}
