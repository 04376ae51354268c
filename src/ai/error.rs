//! Errors from the AI provider dispatcher.

use super::AiProvider;
use thiserror::Error;

/// Failure of a single `generate` call. Nothing is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AiError {
    /// The user has no stored key for the provider. No request was sent.
    #[error("No API key found for provider: {provider}")]
    MissingKey {
        /// Provider that was resolved for the call
        provider: AiProvider,
    },

    /// The stored key could not be decrypted or decrypted to nothing.
    #[error("Failed to decrypt API key for provider: {provider}")]
    DecryptionFailed {
        /// Provider whose key was unreadable
        provider: AiProvider,
    },

    /// The preferred provider stored in settings is not one we know.
    #[error("Unsupported AI provider: {name}")]
    UnsupportedProvider {
        /// Name as stored
        name: String,
    },

    /// The reply contained no decodable JSON object.
    #[error("No JSON response from {provider}: {reason}")]
    MalformedResponse {
        /// Provider that replied
        provider: AiProvider,
        /// What was wrong with the reply
        reason: String,
    },

    /// HTTP, transport or rate-limit failure reported by the provider.
    #[error("{provider} request failed: {message}")]
    ProviderError {
        /// Provider that failed
        provider: AiProvider,
        /// HTTP status, `None` for transport failures
        status: Option<u16>,
        /// Provider or transport message
        message: String,
    },
}

/// Coarse classification used to pick user-facing guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiErrorKind {
    /// Key missing, unreadable, or provider not supported
    Credentials,
    /// Provider answered HTTP 429
    RateLimited,
    /// Reply was not structured as requested
    MalformedResponse,
    /// Anything else the provider or network did
    Unavailable,
}

impl AiError {
    /// HTTP status the provider uses for rate limiting.
    pub const RATE_LIMIT_STATUS: u16 = 429;

    /// Classifies the error without looking at message text.
    #[must_use]
    pub const fn kind(&self) -> AiErrorKind {
        match self {
            Self::MissingKey { .. }
            | Self::DecryptionFailed { .. }
            | Self::UnsupportedProvider { .. } => AiErrorKind::Credentials,
            Self::MalformedResponse { .. } => AiErrorKind::MalformedResponse,
            Self::ProviderError {
                status: Some(Self::RATE_LIMIT_STATUS),
                ..
            } => AiErrorKind::RateLimited,
            Self::ProviderError { .. } => AiErrorKind::Unavailable,
        }
    }
}
