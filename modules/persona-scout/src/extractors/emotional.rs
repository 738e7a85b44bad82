use persona_common::{DecodeFailure, EmotionalSpectrum};

use super::{FieldExtractor, PageSource};
use crate::decode::decode_json;

/// Scores the actor's acting tone on five 1–10 axes.
pub struct EmotionalSpectrumExtractor;

impl FieldExtractor for EmotionalSpectrumExtractor {
    type Output = Result<EmotionalSpectrum, DecodeFailure>;
    const NAME: &'static str = "emotional_spectrum";

    fn render(&self, page: &PageSource<'_>) -> String {
        format!(
            r#"The following is the content of a wiki page about an actor.
Analyze this actor's "emotional spectrum" (the tonal range of their acting).

Score each of these five axes with an integer from 1 to 10 and explain each score:

1. cold_warm: cold (1) to warm (10)
2. active_passive: active (1) to passive (10)
3. intensity: subtle emotion (1) to intense emotion (10)
4. extrovert_introvert: extroverted (1) to introverted (10)
5. comic_level: serious (1) to comic (10)

Important:
- Respond with JSON only.
- Give every axis an integer score (1-10) and a description.
- Write descriptions in the same language as the page content.

{{
  "cold_warm": 5,
  "cold_warm_description": "explanation",
  "active_passive": 5,
  "active_passive_description": "explanation",
  "intensity": 5,
  "intensity_description": "explanation",
  "extrovert_introvert": 5,
  "extrovert_introvert_description": "explanation",
  "comic_level": 5,
  "comic_level_description": "explanation"
}}

Page content:
{content}
"#,
            content = page.text_slice()
        )
    }

    fn decode(&self, response: &str) -> Self::Output {
        decode_json(response)
    }
}
