//! Unified error types and result handling.

use crate::ai::AiError;
use thiserror::Error;

/// Every failure the service can surface.
///
/// Dispatcher failures are wrapped in [`Error::Ai`] so they can travel through
/// `?`, but the summary pipeline normally catches them before they reach the
/// HTTP layer and turns them into a fallback summary.
#[derive(Debug, Error)]
pub enum Error {
    /// No authenticated identity accompanied the request.
    #[error("Unauthorized")]
    Unauthenticated,

    /// The authenticated identity has no user record.
    #[error("User not found: {email}")]
    UserNotFound {
        /// E-mail address of the missing user
        email: String,
    },

    /// Folder does not exist or belongs to someone else.
    #[error("Folder not found: {id}")]
    FolderNotFound {
        /// Requested folder id
        id: i64,
    },

    /// Page does not exist or belongs to someone else.
    #[error("Page not found: {id}")]
    PageNotFound {
        /// Requested page id
        id: i64,
    },

    /// The page has no slot with this index.
    #[error("Day {day_index} not found on page {page_id}")]
    DayNotFound {
        /// Page that was searched
        page_id: i64,
        /// Requested day slot
        day_index: u8,
    },

    /// Entry id is not present in the requested day.
    #[error("Entry not found: {id}")]
    EntryNotFound {
        /// Requested entry id
        id: String,
    },

    /// A request was missing required fields or carried invalid values.
    #[error("Validation error: {message}")]
    Validation {
        /// Human readable reason
        message: String,
    },

    /// Entry or budget amount that is negative, NaN or infinite.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected amount
        amount: f64,
    },

    /// Configuration could not be loaded or is incomplete.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the problem
        message: String,
    },

    /// Encrypting or decrypting a stored credential failed.
    #[error("Encryption error: {message}")]
    Crypto {
        /// Description of the problem
        message: String,
    },

    /// Outbound mail could not be built or delivered.
    #[error("Mail delivery error: {message}")]
    Mail {
        /// Description of the problem
        message: String,
    },

    /// AI dispatcher failure.
    #[error(transparent)]
    Ai(#[from] AiError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error (binding sockets, reading config files).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
