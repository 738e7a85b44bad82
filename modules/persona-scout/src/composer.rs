use std::sync::Arc;

use persona_common::{
    ActorRecord, DecodeFailure, EmotionalReading, Filmography, PipelineError,
};
use tracing::{info, warn};

use crate::extractors::{
    run_extractor, EmotionalSpectrumExtractor, IdentityExtractor, NarrativeRoleExtractor,
    PageSource, PersonalityExtractor, ProfileImageExtractor, TEXT_LIMIT_CHARS,
};
use crate::fetcher::{DocumentFetcher, FetchedDocument};
use crate::gateway::ModelGateway;

/// Outcome of composing one page.
#[derive(Debug, Clone, PartialEq)]
pub enum Composition {
    Record(ActorRecord),
    /// The primary identity answer was not valid JSON; nothing else was asked.
    Undecodable(DecodeFailure),
}

impl Composition {
    pub fn record(&self) -> Option<&ActorRecord> {
        match self {
            Composition::Record(record) => Some(record),
            Composition::Undecodable(_) => None,
        }
    }
}

/// Runs every field extractor against one page and merges the answers.
pub struct Composer {
    fetcher: Arc<dyn DocumentFetcher>,
    gateway: Arc<dyn ModelGateway>,
    profile_image: ProfileImageExtractor,
}

impl Composer {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        gateway: Arc<dyn ModelGateway>,
        image_host: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            gateway,
            profile_image: ProfileImageExtractor::new(image_host),
        }
    }

    /// Fetch `url` and compose a record from it with `model`.
    pub async fn compose(&self, url: &str, model: &str) -> Result<Composition, PipelineError> {
        let document = self.fetcher.fetch(url).await?;
        self.compose_document(url, &document, model).await
    }

    /// Compose a record from an already fetched page.
    pub async fn compose_document(
        &self,
        url: &str,
        document: &FetchedDocument,
        model: &str,
    ) -> Result<Composition, PipelineError> {
        let text = ai_client::truncate_chars(&document.text, TEXT_LIMIT_CHARS);
        let page = PageSource::new(text, &document.markup);
        let gateway = self.gateway.as_ref();

        let identity = match run_extractor(&IdentityExtractor, gateway, &page, model).await? {
            Ok(identity) => identity,
            Err(failure) => {
                warn!(url, model, error = %failure, "Identity answer undecodable, skipping remaining extractors");
                return Ok(Composition::Undecodable(failure));
            }
        };

        let profile_image_url = run_extractor(&self.profile_image, gateway, &page, model).await?;
        let personality_spectrum =
            run_extractor(&PersonalityExtractor, gateway, &page, model).await?;

        let emotional_spectrum =
            match run_extractor(&EmotionalSpectrumExtractor, gateway, &page, model).await? {
                Ok(spectrum) => EmotionalReading::Scored(spectrum),
                Err(failure) => {
                    warn!(url, error = %failure, "Emotional spectrum undecodable");
                    EmotionalReading::Unreadable(failure)
                }
            };

        let filmography =
            match run_extractor(&NarrativeRoleExtractor, gateway, &page, model).await? {
                Ok(filmography) => filmography,
                Err(failure) => {
                    warn!(url, error = %failure, "Narrative roles undecodable");
                    Filmography::unavailable()
                }
            };

        info!(
            url,
            name = %identity.name,
            roles = filmography.narrative_roles.len(),
            "Composed actor record"
        );

        Ok(Composition::Record(ActorRecord {
            identity,
            profile_image_url,
            personality_spectrum,
            emotional_spectrum,
            narrative_roles: filmography.narrative_roles,
            recurring_pattern: filmography.recurring_pattern,
        }))
    }
}
