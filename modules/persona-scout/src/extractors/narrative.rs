use persona_common::{DecodeFailure, Filmography, MAX_NARRATIVE_ROLES};

use super::{FieldExtractor, PageSource};
use crate::decode::decode_json;

/// Pulls the filmography section apart into per-work narrative roles plus a
/// summary of the pattern that recurs across them.
pub struct NarrativeRoleExtractor;

impl FieldExtractor for NarrativeRoleExtractor {
    type Output = Result<Filmography, DecodeFailure>;
    const NAME: &'static str = "narrative_roles";

    fn render(&self, page: &PageSource<'_>) -> String {
        format!(
            r#"The following is the content of a wiki page about an actor.

Find the "appearances" or "filmography" section and extract the narrative role the actor played in each work.
Include works of every kind: stage plays, TV dramas, films, musicals and so on.

For each work extract:
1. work_title: title of the work (include the year if shown)
2. character_name: character or role name, exactly as on the page
3. role_type: one of lead, support, antagonist, helper, cameo (best guess)
4. character_description: who the character is (from the page or what is known about the work)
5. emotional_experiences: emotions the character goes through (array, e.g. anger, despair, love, anxiety, grief, guilt)

Finally, summarize in recurring_pattern the image or character pattern that repeats across the whole filmography.

Important:
- Respond with JSON only.
- Write every value in the same language as the page content.
- Extract the 5 to 7 most important works you can confirm on the page. If there are none, use an empty array.
- character_description and emotional_experiences may be inferred from the work and role.

{{
  "narrative_roles": [
    {{
      "work_title": "title",
      "character_name": "character",
      "role_type": "role type",
      "character_description": "character description",
      "emotional_experiences": ["emotion1", "emotion2"]
    }}
  ],
  "recurring_pattern": "summary of the recurring image pattern"
}}

Page content:
{content}
"#,
            content = page.text_slice()
        )
    }

    fn decode(&self, response: &str) -> Self::Output {
        let mut filmography: Filmography = decode_json(response)?;
        filmography.narrative_roles.truncate(MAX_NARRATIVE_ROLES);
        Ok(filmography)
    }
}
