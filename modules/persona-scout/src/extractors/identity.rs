use persona_common::{DecodeFailure, Identity};

use super::{FieldExtractor, PageSource};
use crate::decode::decode_json;

/// Primary extraction: name, demographics, voice and overall impression.
pub struct IdentityExtractor;

impl FieldExtractor for IdentityExtractor {
    type Output = Result<Identity, DecodeFailure>;
    const NAME: &'static str = "identity";

    fn render(&self, page: &PageSource<'_>) -> String {
        format!(
            r#"The following is the content of a wiki page about an actor.
Analyze it and extract the actor's outward image as JSON.

Extract:
1. Name
2. Age range (e.g. "early 30s", "mid 40s")
3. Gender
4. Height and build
5. Voice characteristics
6. Impression and atmosphere, as detailed as possible (appearance, mood, acting style, public image)

Important:
- Respond with JSON only, in exactly the shape below. No other text.
- Write every value in the same language as the page content.
- If a piece of information cannot be found, use the exact string "no information".
- Make the impression field as detailed as possible.

{{
  "name": "actor name",
  "age_range": "age range",
  "gender": "gender",
  "height_build": "height and build",
  "voice": "voice characteristics",
  "impression": "detailed overall impression and atmosphere"
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
