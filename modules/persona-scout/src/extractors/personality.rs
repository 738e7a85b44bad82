use persona_common::Info;

use super::{FieldExtractor, PageSource};

/// Free-text narrative of the roles and acting range an actor is known for.
pub struct PersonalityExtractor;

impl FieldExtractor for PersonalityExtractor {
    type Output = Info;
    const NAME: &'static str = "personality";

    fn render(&self, page: &PageSource<'_>) -> String {
        format!(
            r#"The following is the content of a wiki page about an actor.
Analyze this actor's "personality spectrum".

Cover:
1. The character types they usually play (e.g. gloomy, cheerful, villainous)
2. Acting style and range (e.g. emotional, comic, charismatic)
3. Genres that suit them (e.g. drama, comedy, thriller)
4. Strengths and signature characters
5. Notable traits of their acting or how it is received

Important:
- Write in detail, in the same language as the page content.
- Write natural prose sentences.
- Respond with plain text, not JSON.
- If there is no information, answer with exactly "no information".

Page content:
{content}
"#,
            content = page.text_slice()
        )
    }

    fn decode(&self, response: &str) -> Info {
        Info::from_answer(response)
    }
}
