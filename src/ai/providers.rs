//! HTTP adapters for the five supported providers.
//!
//! Every adapter implements [`ProviderAdapter::submit`]: send the shared system
//! prompt plus the caller's prompt, return the provider's raw reply text. JSON
//! extraction happens once, in the dispatcher.

use super::{AiError, AiProvider};
use async_trait::async_trait;
use serde_json::{Value, json};

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const OPENAI_MODEL: &str = "gpt-4o-mini";

const GOOGLE_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/gemini-1.5-flash:generateContent";

const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_MODEL: &str = "claude-3-haiku-20240307";
const ANTHROPIC_VERSION: &str = "2023-06-01";

const OPENROUTER_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";

const HUGGINGFACE_URL: &str =
    "https://api-inference.huggingface.co/models/microsoft/Phi-3-mini-4k-instruct";

const MAX_TOKENS: u32 = 1024;

/// One provider backend.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Which provider this adapter talks to.
    fn provider(&self) -> AiProvider;

    /// Sends one completion request and returns the reply text.
    async fn submit(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AiError>;
}

/// Builds the HTTP adapter for `provider` on a shared client.
#[must_use]
pub fn http_adapter(
    provider: AiProvider,
    client: reqwest::Client,
) -> std::sync::Arc<dyn ProviderAdapter> {
    match provider {
        AiProvider::OpenAi => std::sync::Arc::new(OpenAiAdapter { client }),
        AiProvider::Google => std::sync::Arc::new(GoogleAdapter { client }),
        AiProvider::Anthropic => std::sync::Arc::new(AnthropicAdapter { client }),
        AiProvider::OpenRouter => std::sync::Arc::new(OpenRouterAdapter { client }),
        AiProvider::HuggingFace => std::sync::Arc::new(HuggingFaceAdapter { client }),
    }
}

/// Sends `request`, maps failures to [`AiError::ProviderError`] and decodes JSON.
async fn send_json(
    provider: AiProvider,
    request: reqwest::RequestBuilder,
) -> Result<Value, AiError> {
    let resp = request.send().await.map_err(|e| AiError::ProviderError {
        provider,
        status: None,
        message: format!("request failed: {e}"),
    })?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        tracing::warn!(%provider, status = status.as_u16(), "Provider returned an error status");
        return Err(AiError::ProviderError {
            provider,
            status: Some(status.as_u16()),
            message: format!("HTTP {status}: {text}"),
        });
    }

    resp.json().await.map_err(|e| AiError::ProviderError {
        provider,
        status: Some(status.as_u16()),
        message: format!("failed to decode response body: {e}"),
    })
}

fn text_at(provider: AiProvider, body: &Value, pointer: &str) -> Result<String, AiError> {
    body.pointer(pointer)
        .and_then(Value::as_str)
        .filter(|text| !text.is_empty())
        .map(ToString::to_string)
        .ok_or_else(|| AiError::ProviderError {
            provider,
            status: None,
            message: format!("No response from {provider}"),
        })
}

fn chat_messages(system_prompt: &str, user_prompt: &str) -> Value {
    json!([
        { "role": "system", "content": system_prompt },
        { "role": "user", "content": user_prompt },
    ])
}

/// `OpenAI` chat completions in JSON mode.
pub struct OpenAiAdapter {
    client: reqwest::Client,
}

#[async_trait]
impl ProviderAdapter for OpenAiAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::OpenAi
    }

    async fn submit(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AiError> {
        let body = json!({
            "model": OPENAI_MODEL,
            "messages": chat_messages(system_prompt, user_prompt),
            "response_format": { "type": "json_object" },
        });
        let request = self.client.post(OPENAI_URL).bearer_auth(api_key).json(&body);
        let reply = send_json(self.provider(), request).await?;
        text_at(self.provider(), &reply, "/choices/0/message/content")
    }
}

/// Google Gemini `generateContent`. Gemini has no system role here, so the
/// prompts are concatenated.
pub struct GoogleAdapter {
    client: reqwest::Client,
}

#[async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::Google
    }

    async fn submit(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AiError> {
        let body = json!({
            "contents": [
                { "parts": [ { "text": format!("{system_prompt}\n\n{user_prompt}") } ] }
            ],
        });
        let request = self
            .client
            .post(GOOGLE_URL)
            .query(&[("key", api_key)])
            .json(&body);
        let reply = send_json(self.provider(), request).await?;
        text_at(self.provider(), &reply, "/candidates/0/content/parts/0/text")
    }
}

/// Anthropic messages API.
pub struct AnthropicAdapter {
    client: reqwest::Client,
}

#[async_trait]
impl ProviderAdapter for AnthropicAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::Anthropic
    }

    async fn submit(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AiError> {
        let body = json!({
            "model": ANTHROPIC_MODEL,
            "max_tokens": MAX_TOKENS,
            "system": system_prompt,
            "messages": [ { "role": "user", "content": user_prompt } ],
        });
        let request = self
            .client
            .post(ANTHROPIC_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);
        let reply = send_json(self.provider(), request).await?;

        if reply.pointer("/content/0/type").and_then(Value::as_str) != Some("text") {
            return Err(AiError::ProviderError {
                provider: self.provider(),
                status: None,
                message: "No text response from anthropic".to_string(),
            });
        }
        text_at(self.provider(), &reply, "/content/0/text")
    }
}

/// `OpenRouter`, an `OpenAI`-compatible gateway.
pub struct OpenRouterAdapter {
    client: reqwest::Client,
}

#[async_trait]
impl ProviderAdapter for OpenRouterAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::OpenRouter
    }

    async fn submit(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AiError> {
        let body = json!({
            "model": OPENROUTER_MODEL,
            "messages": chat_messages(system_prompt, user_prompt),
        });
        let request = self
            .client
            .post(OPENROUTER_URL)
            .bearer_auth(api_key)
            .json(&body);
        let reply = send_json(self.provider(), request).await?;
        text_at(self.provider(), &reply, "/choices/0/message/content")
    }
}

/// `HuggingFace` text-generation inference.
pub struct HuggingFaceAdapter {
    client: reqwest::Client,
}

#[async_trait]
impl ProviderAdapter for HuggingFaceAdapter {
    fn provider(&self) -> AiProvider {
        AiProvider::HuggingFace
    }

    async fn submit(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, AiError> {
        let body = json!({
            "inputs": format!("{system_prompt}\n\nUser: {user_prompt}\n\nAssistant:"),
            "parameters": {
                "max_new_tokens": MAX_TOKENS,
                "return_full_text": false,
            },
        });
        let request = self
            .client
            .post(HUGGINGFACE_URL)
            .bearer_auth(api_key)
            .json(&body);
        let reply = send_json(self.provider(), request).await?;

        // The endpoint answers with either a list or a single object.
        let pointer = if reply.is_array() {
            "/0/generated_text"
        } else {
            "/generated_text"
        };
        text_at(self.provider(), &reply, pointer)
    }
}
