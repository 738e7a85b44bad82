use persona_common::Info;

use super::{FieldExtractor, PageSource};

/// Finds the representative profile photo URL in the raw markup.
///
/// A refusal is taken at its word; an answer that looks successful but is not
/// a URL on the expected image host is discarded.
pub struct ProfileImageExtractor {
    image_host: String,
}

impl ProfileImageExtractor {
    pub fn new(image_host: impl Into<String>) -> Self {
        Self {
            image_host: image_host.into(),
        }
    }
}

impl FieldExtractor for ProfileImageExtractor {
    type Output = Info;
    const NAME: &'static str = "profile_image";

    fn render(&self, page: &PageSource<'_>) -> String {
        format!(
            r#"Find the actor's representative profile image URL in the following HTML.

Conditions:
- Look for image URLs whose host contains "{host}".
- Pick the first profile photo that appears.
- Output the URL only, with no other text.
- If no such image exists, answer with exactly "no information".

HTML:
{markup}
"#,
            host = self.image_host,
            markup = page.markup_slice()
        )
    }

    fn decode(&self, response: &str) -> Info {
        let url = response.trim();
        if url.starts_with("http") && url.contains(self.image_host.as_str()) {
            Info::Known(url.to_string())
        } else {
            Info::NoInformation
        }
    }
}
