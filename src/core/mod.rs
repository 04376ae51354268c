//! Core business logic, independent of the HTTP layer.
//!
//! Functions take a `DatabaseConnection` and plain arguments and return
//! [`crate::errors::Result`], so they can be driven from route handlers, the
//! scheduler or tests alike.

pub mod budget;
pub mod entry;
pub mod folder;
pub mod page;
pub mod prompt;
pub mod summary;
pub mod user;
pub mod weekly_report;

use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer};

/// Rejects amounts that are negative, NaN or infinite.
pub(crate) fn validate_amount(amount: f64) -> Result<()> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(Error::InvalidAmount { amount })
    }
}

/// Deserializes a field that can be absent (`None`), `null` (`Some(None)`) or
/// set (`Some(Some(v))`). Use with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(
    deserializer: D,
) -> std::result::Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
