//! Route handlers, one module per resource.

/// Weekly e-mail trigger
pub mod cron;
/// Page entries
pub mod entry;
/// Folder tree
pub mod folder;
/// Pages
pub mod page;
/// AI summaries
pub mod summary;
/// Sign-in and profile
pub mod user;

use crate::errors::{Error, Result};
use axum::{
    Json, async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::{Serialize, de::DeserializeOwned};

/// JSON body that may be omitted entirely.
///
/// An empty body yields `T::default()`. Anything else must decode as `T` or the
/// request is rejected with a validation error.
#[derive(Debug)]
pub struct OptionalJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for OptionalJson<T>
where
    T: DeserializeOwned + Default,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| Error::validation(format!("Failed to read request body: {e}")))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(T::default()));
        }
        serde_json::from_slice(&bytes)
            .map(Self)
            .map_err(|e| Error::validation(format!("Invalid JSON body: {e}")))
    }
}

/// Body returned by delete routes.
#[derive(Debug, Serialize)]
pub struct Deleted {
    /// Always true
    pub success: bool,
}

pub(crate) const fn deleted() -> Json<Deleted> {
    Json(Deleted { success: true })
}

#[cfg(test)]
mod tests;
