//! Expense entries inside a page's day slots.
//!
//! Entries live in the page's `days` document, so every operation loads the
//! page, edits the slot in memory and writes the page back.

use super::{page::{get_page, save_days}, validate_amount};
use crate::{
    entities::page,
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use uuid::Uuid;

/// Title given to entries created without one.
pub const DEFAULT_ENTRY_TITLE: &str = "New Entry";

/// Request body for a new entry. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    /// Label
    pub title: Option<String>,
    /// Amount, 0 when absent
    pub amount: Option<f64>,
    /// Note
    pub description: Option<String>,
    /// Category
    pub category: Option<String>,
    /// Tags
    pub tags: Option<Vec<String>>,
}

/// Partial update of an entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryUpdate {
    /// Label
    pub title: Option<String>,
    /// Amount
    pub amount: Option<f64>,
    /// Note
    pub description: Option<String>,
    /// Category
    pub category: Option<String>,
    /// Tags
    pub tags: Option<Vec<String>>,
}

/// Checks a day index from a URL. Entry routes accept slots 1..=7 only.
pub fn parse_day_index(raw: i64) -> Result<u8> {
    u8::try_from(raw)
        .ok()
        .filter(|day| (1..=page::DAYS_PER_PAGE).contains(day))
        .ok_or_else(|| Error::validation(format!("Invalid day index: {raw}")))
}

fn day_mut(days: &mut page::Days, page_id: i64, day_index: u8) -> Result<&mut page::Day> {
    days.get_mut(day_index)
        .ok_or(Error::DayNotFound { page_id, day_index })
}

/// Appends an entry to a day and returns it with the updated page.
pub async fn add_entry(
    db: &DatabaseConnection,
    user_id: i64,
    page_id: i64,
    day_index: u8,
    new_entry: NewEntry,
) -> Result<(page::Entry, page::Model)> {
    let amount = new_entry.amount.unwrap_or(0.0);
    validate_amount(amount)?;

    let page = get_page(db, user_id, page_id).await?;
    let mut days = page.days.clone();

    let entry = page::Entry {
        id: Uuid::new_v4().to_string(),
        title: new_entry
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENTRY_TITLE.to_string()),
        amount,
        description: new_entry.description.unwrap_or_default(),
        category: new_entry.category.unwrap_or_default(),
        tags: new_entry.tags.unwrap_or_default(),
        created_at: Utc::now(),
    };
    day_mut(&mut days, page_id, day_index)?.entries.push(entry.clone());

    let page = save_days(db, page, days).await?;
    Ok((entry, page))
}

/// Applies `update` to one entry and returns the updated page.
pub async fn update_entry(
    db: &DatabaseConnection,
    user_id: i64,
    page_id: i64,
    day_index: u8,
    entry_id: &str,
    update: EntryUpdate,
) -> Result<page::Model> {
    if let Some(amount) = update.amount {
        validate_amount(amount)?;
    }

    let page = get_page(db, user_id, page_id).await?;
    let mut days = page.days.clone();
    let entry = day_mut(&mut days, page_id, day_index)?
        .entries
        .iter_mut()
        .find(|e| e.id == entry_id)
        .ok_or_else(|| Error::EntryNotFound {
            id: entry_id.to_string(),
        })?;

    if let Some(title) = update.title {
        entry.title = title;
    }
    if let Some(amount) = update.amount {
        entry.amount = amount;
    }
    if let Some(description) = update.description {
        entry.description = description;
    }
    if let Some(category) = update.category {
        entry.category = category;
    }
    if let Some(tags) = update.tags {
        entry.tags = tags;
    }

    save_days(db, page, days).await
}

/// Removes one entry and returns the updated page.
pub async fn delete_entry(
    db: &DatabaseConnection,
    user_id: i64,
    page_id: i64,
    day_index: u8,
    entry_id: &str,
) -> Result<page::Model> {
    let page = get_page(db, user_id, page_id).await?;
    let mut days = page.days.clone();
    let day = day_mut(&mut days, page_id, day_index)?;

    let before = day.entries.len();
    day.entries.retain(|e| e.id != entry_id);
    if day.entries.len() == before {
        return Err(Error::EntryNotFound {
            id: entry_id.to_string(),
        });
    }

    save_days(db, page, days).await
}
