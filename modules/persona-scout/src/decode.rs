use ai_client::strip_code_blocks;
use persona_common::DecodeFailure;
use serde::de::DeserializeOwned;

/// Decode a model response as JSON of shape `T`.
///
/// Surrounding whitespace and one markdown code fence (with optional language
/// tag) are removed first. On failure the untouched response is kept in the
/// returned [`DecodeFailure`].
pub fn decode_json<T: DeserializeOwned>(response: &str) -> Result<T, DecodeFailure> {
    serde_json::from_str(strip_code_blocks(response))
        .map_err(|e| DecodeFailure::new(e, response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn fenced_json_decodes() {
        let value: Value = decode_json("```json\n{\"name\": \"Kim\"}\n```").unwrap();
        assert_eq!(value["name"], "Kim");
    }

    #[test]
    fn bare_json_with_padding_decodes() {
        let value: Value = decode_json("\n  {\"a\": [1, 2]}  \n").unwrap();
        assert_eq!(value["a"][1], 2);
    }

    #[test]
    fn failure_keeps_verbatim_response() {
        let response = "  Sorry, I could not read that page.  ";
        let failure = decode_json::<Value>(response).unwrap_err();
        assert_eq!(failure.raw_response, response);
        assert!(failure.error.starts_with("Failed to parse JSON"));
    }

    #[test]
    fn wrong_shape_is_a_failure() {
        #[derive(serde::Deserialize, Debug)]
        struct Named {
            #[allow(dead_code)]
            name: String,
        }
        assert!(decode_json::<Named>("[1, 2, 3]").is_err());
    }
}
