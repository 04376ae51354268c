//! Extraction of the structured reply from free provider text.

use super::{AiError, AiProvider, AiResponse};

/// Characters of raw text kept when a lenient provider replies without JSON.
pub const RAW_SUMMARY_LIMIT: usize = 500;

/// Returns the first balanced `{...}` span in `text`.
///
/// Braces inside JSON string literals are ignored, so a `}` inside a quoted
/// value does not close the object early.
#[must_use]
pub fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Turns a provider's raw reply into an [`AiResponse`].
///
/// `HuggingFace` degrades to a synthetic response built from the raw text when
/// no JSON object is present; every other provider fails.
pub fn parse_reply(provider: AiProvider, raw: &str) -> Result<AiResponse, AiError> {
    let Some(json) = first_json_object(raw) else {
        if provider.accepts_unstructured_replies() {
            return Ok(AiResponse {
                summary: raw.chars().take(RAW_SUMMARY_LIMIT).collect(),
                insights: vec!["Unable to parse structured insights".to_string()],
                recommendations: vec!["Unable to parse structured recommendations".to_string()],
            });
        }
        return Err(AiError::MalformedResponse {
            provider,
            reason: "reply contains no JSON object".to_string(),
        });
    };

    serde_json::from_str(json).map_err(|e| AiError::MalformedResponse {
        provider,
        reason: format!("invalid JSON: {e}"),
    })
}
