//! AI provider dispatcher.
//!
//! [`SummaryGenerator::generate`] resolves which provider to use for a user,
//! decrypts that user's stored key, sends one request through the matching
//! [`ProviderAdapter`] and normalises the reply into an [`AiResponse`]. Calls
//! are independent and stateless; there are no retries.

mod error;
pub mod parse;
pub mod providers;

pub use error::{AiError, AiErrorKind};
pub use providers::ProviderAdapter;

use crate::crypto::KeyCipher;
use crate::entities::user;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Instructions sent to every provider ahead of the caller's prompt.
pub const SYSTEM_PROMPT: &str = r#"You are a financial advisor AI assistant. Analyze spending data and provide:
1. A brief summary of spending patterns
2. Key insights (as a list)
3. Actionable recommendations to save money (as a list)

Respond in JSON format:
{
  "summary": "Brief summary here",
  "insights": ["insight 1", "insight 2"],
  "recommendations": ["recommendation 1", "recommendation 2"]
}"#;

/// External text-generation services a user can hold a key for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    /// `OpenAI`
    #[serde(rename = "openai")]
    OpenAi,
    /// Google Gemini
    Google,
    /// Anthropic
    Anthropic,
    /// `OpenRouter`
    #[serde(rename = "openrouter")]
    OpenRouter,
    /// `HuggingFace` inference
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl AiProvider {
    /// All providers, in settings-screen order.
    pub const ALL: [Self; 5] = [
        Self::OpenAi,
        Self::Google,
        Self::Anthropic,
        Self::OpenRouter,
        Self::HuggingFace,
    ];

    /// Provider used when neither the request nor the settings name one.
    pub const DEFAULT: Self = Self::OpenAi;

    /// Stable lowercase name, also the key slot name in `AiKeys`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Google => "google",
            Self::Anthropic => "anthropic",
            Self::OpenRouter => "openrouter",
            Self::HuggingFace => "huggingface",
        }
    }

    /// Whether a reply without JSON degrades to a raw-text summary instead of failing.
    #[must_use]
    pub const fn accepts_unstructured_replies(self) -> bool {
        matches!(self, Self::HuggingFace)
    }
}

impl fmt::Display for AiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AiProvider {
    type Err = AiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == s)
            .ok_or_else(|| AiError::UnsupportedProvider {
                name: s.to_string(),
            })
    }
}

/// Normalised provider reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AiResponse {
    /// Short narrative
    #[serde(default)]
    pub summary: String,
    /// Observations
    #[serde(default)]
    pub insights: Vec<String>,
    /// Suggested actions
    #[serde(default)]
    pub recommendations: Vec<String>,
}

/// Picks the provider for a call: explicit override, then the user's
/// preference, then [`AiProvider::DEFAULT`].
pub fn resolve_provider(
    settings: &user::UserSettings,
    provider_override: Option<AiProvider>,
) -> Result<AiProvider, AiError> {
    if let Some(provider) = provider_override {
        return Ok(provider);
    }
    match settings
        .preferred_ai_provider
        .as_deref()
        .filter(|name| !name.is_empty())
    {
        Some(name) => name.parse(),
        None => Ok(AiProvider::DEFAULT),
    }
}

/// Dispatches prompts to the user's chosen provider.
pub struct SummaryGenerator {
    cipher: KeyCipher,
    adapters: HashMap<AiProvider, Arc<dyn ProviderAdapter>>,
}

impl SummaryGenerator {
    /// Creates a generator with HTTP adapters for all five providers sharing one
    /// client.
    pub fn new(cipher: KeyCipher, request_timeout: Duration) -> crate::errors::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| crate::errors::Error::Config {
                message: format!("Failed to build HTTP client: {e}"),
            })?;

        let adapters = AiProvider::ALL
            .into_iter()
            .map(|provider| (provider, providers::http_adapter(provider, client.clone())))
            .collect();

        Ok(Self { cipher, adapters })
    }

    /// Creates a generator with no adapters; add them with
    /// [`SummaryGenerator::with_adapter`].
    #[must_use]
    pub fn empty(cipher: KeyCipher) -> Self {
        Self {
            cipher,
            adapters: HashMap::new(),
        }
    }

    /// Installs `adapter` for the provider it reports, replacing any existing one.
    #[must_use]
    pub fn with_adapter(mut self, adapter: Arc<dyn ProviderAdapter>) -> Self {
        self.adapters.insert(adapter.provider(), adapter);
        self
    }

    /// The cipher used for stored keys, shared with the settings routes.
    #[must_use]
    pub const fn cipher(&self) -> &KeyCipher {
        &self.cipher
    }

    /// Produces a structured summary for `prompt` on behalf of `user`.
    #[instrument(skip(self, user, prompt), fields(user_id = user.id))]
    pub async fn generate(
        &self,
        user: &user::Model,
        prompt: &str,
        provider_override: Option<AiProvider>,
    ) -> Result<AiResponse, AiError> {
        let provider = resolve_provider(&user.settings, provider_override)?;

        let encrypted = user
            .ai_keys
            .get(provider.as_str())
            .ok_or(AiError::MissingKey { provider })?;

        let api_key = match self.cipher.decrypt(encrypted) {
            Ok(key) if !key.is_empty() => key,
            Ok(_) => return Err(AiError::DecryptionFailed { provider }),
            Err(e) => {
                warn!(%provider, "Stored API key could not be decrypted: {}", e);
                return Err(AiError::DecryptionFailed { provider });
            }
        };

        let adapter = self
            .adapters
            .get(&provider)
            .ok_or_else(|| AiError::UnsupportedProvider {
                name: provider.to_string(),
            })?;

        debug!(%provider, "Dispatching summary prompt");
        let raw = adapter.submit(&api_key, SYSTEM_PROMPT, prompt).await?;
        parse::parse_reply(provider, &raw)
    }
}

impl fmt::Debug for SummaryGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryGenerator")
            .field("providers", &self.adapters.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{RecordingAdapter, sample_user, test_cipher};

    #[test]
    fn test_provider_names_round_trip() {
        for provider in AiProvider::ALL {
            assert_eq!(provider.as_str().parse::<AiProvider>().unwrap(), provider);
            let json = serde_json::to_string(&provider).unwrap();
            assert_eq!(json, format!("\"{}\"", provider.as_str()));
        }
        assert!(matches!(
            "cohere".parse::<AiProvider>(),
            Err(AiError::UnsupportedProvider { .. })
        ));
    }

    #[test]
    fn test_resolve_provider_precedence() {
        let mut settings = user::UserSettings {
            preferred_ai_provider: Some("anthropic".to_string()),
            ..Default::default()
        };
        assert_eq!(
            resolve_provider(&settings, Some(AiProvider::Google)).unwrap(),
            AiProvider::Google
        );
        assert_eq!(resolve_provider(&settings, None).unwrap(), AiProvider::Anthropic);

        settings.preferred_ai_provider = None;
        assert_eq!(resolve_provider(&settings, None).unwrap(), AiProvider::OpenAi);

        settings.preferred_ai_provider = Some(String::new());
        assert_eq!(resolve_provider(&settings, None).unwrap(), AiProvider::OpenAi);
    }

    #[tokio::test]
    async fn test_missing_key_never_calls_provider() {
        let adapter = RecordingAdapter::replying(AiProvider::OpenAi, "{\"summary\":\"x\"}");
        let generator = SummaryGenerator::empty(test_cipher()).with_adapter(adapter.clone());
        let user = sample_user();

        let result = generator.generate(&user, "prompt", None).await;

        assert_eq!(
            result,
            Err(AiError::MissingKey {
                provider: AiProvider::OpenAi
            })
        );
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_undecryptable_key_is_decryption_failure() {
        let adapter = RecordingAdapter::replying(AiProvider::Google, "{}");
        let generator = SummaryGenerator::empty(test_cipher()).with_adapter(adapter.clone());
        let mut user = sample_user();
        user.ai_keys.google = Some("00:deadbeef".to_string());

        let result = generator
            .generate(&user, "prompt", Some(AiProvider::Google))
            .await;

        assert_eq!(
            result,
            Err(AiError::DecryptionFailed {
                provider: AiProvider::Google
            })
        );
        assert_eq!(adapter.calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_decrypted_key_is_decryption_failure() {
        let cipher = test_cipher();
        let mut user = sample_user();
        user.ai_keys.openai = Some(cipher.encrypt("").unwrap());
        let generator = SummaryGenerator::empty(cipher);

        let result = generator.generate(&user, "prompt", None).await;
        assert!(matches!(result, Err(AiError::DecryptionFailed { .. })));
    }

    #[tokio::test]
    async fn test_generate_passes_decrypted_key_and_prompts() {
        let cipher = test_cipher();
        let mut user = sample_user();
        user.settings.preferred_ai_provider = Some("anthropic".to_string());
        user.ai_keys.anthropic = Some(cipher.encrypt("sk-ant-123").unwrap());

        let adapter = RecordingAdapter::replying(
            AiProvider::Anthropic,
            "Here it is {\"summary\":\"Fine\",\"insights\":[\"a\"],\"recommendations\":[\"b\"]}",
        );
        let generator = SummaryGenerator::empty(cipher).with_adapter(adapter.clone());

        let response = generator.generate(&user, "my prompt", None).await.unwrap();

        assert_eq!(response.summary, "Fine");
        assert_eq!(adapter.calls(), 1);
        let (key, system, prompt) = adapter.last_request().unwrap();
        assert_eq!(key, "sk-ant-123");
        assert_eq!(system, SYSTEM_PROMPT);
        assert_eq!(prompt, "my prompt");
    }

    #[tokio::test]
    async fn test_provider_errors_propagate_unchanged() {
        let cipher = test_cipher();
        let mut user = sample_user();
        user.ai_keys.openrouter = Some(cipher.encrypt("or-key").unwrap());
        let failure = AiError::ProviderError {
            provider: AiProvider::OpenRouter,
            status: Some(429),
            message: "rate limited".to_string(),
        };
        let adapter = RecordingAdapter::failing(AiProvider::OpenRouter, failure.clone());
        let generator = SummaryGenerator::empty(cipher).with_adapter(adapter.clone());

        let result = generator
            .generate(&user, "prompt", Some(AiProvider::OpenRouter))
            .await;

        assert_eq!(result, Err(failure));
        assert_eq!(adapter.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_preferred_provider_is_unsupported() {
        let mut user = sample_user();
        user.settings.preferred_ai_provider = Some("cohere".to_string());
        let generator = SummaryGenerator::empty(test_cipher());

        let result = generator.generate(&user, "prompt", None).await;
        assert!(matches!(result, Err(AiError::UnsupportedProvider { .. })));
    }
}
