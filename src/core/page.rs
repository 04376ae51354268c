//! Page operations.
//!
//! A page always holds exactly seven day slots. Entry-level edits live in
//! [`super::entry`]; this module handles the page record itself and bulk
//! replacement of its days.

use super::{double_option, validate_amount};
use crate::{
    entities::{Page, page},
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;

/// Title given to pages created without one.
pub const DEFAULT_PAGE_TITLE: &str = "Untitled Page";
/// Icon given to pages created without one.
pub const DEFAULT_PAGE_ICON: &str = "📄";

/// Which pages a listing returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FolderFilter {
    /// Every page
    #[default]
    Any,
    /// Pages outside any folder
    Root,
    /// Pages directly inside one folder
    Folder(i64),
}

impl FolderFilter {
    /// Parses the `folderId` query value: absent or empty means any, `null`
    /// means root, anything else must be a folder id.
    pub fn from_query(value: Option<&str>) -> Result<Self> {
        match value.map(str::trim) {
            None | Some("") => Ok(Self::Any),
            Some("null") => Ok(Self::Root),
            Some(raw) => raw
                .parse()
                .map(Self::Folder)
                .map_err(|_| Error::validation(format!("Invalid folderId: {raw}"))),
        }
    }
}

/// Request body for creating a page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPage {
    /// Page title
    pub title: Option<String>,
    /// Emoji icon
    pub icon: Option<String>,
    /// Containing folder, root when absent
    pub folder_id: Option<i64>,
}

/// Partial update of a page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageUpdate {
    /// New title
    pub title: Option<String>,
    /// New icon
    pub icon: Option<String>,
    /// `Some(None)` moves the page to the root
    #[serde(default, deserialize_with = "double_option")]
    pub folder_id: Option<Option<i64>>,
    /// New position among siblings
    pub order: Option<i32>,
    /// Replacement for all seven slots
    pub days: Option<page::Days>,
}

/// Pages of a user matching `filter`, by position.
pub async fn list_pages(
    db: &DatabaseConnection,
    user_id: i64,
    filter: FolderFilter,
) -> Result<Vec<page::Model>> {
    let mut query = Page::find().filter(page::Column::UserId.eq(user_id));
    query = match filter {
        FolderFilter::Any => query,
        FolderFilter::Root => query.filter(page::Column::FolderId.is_null()),
        FolderFilter::Folder(id) => query.filter(page::Column::FolderId.eq(id)),
    };
    query
        .order_by_asc(page::Column::SortOrder)
        .order_by_asc(page::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// One page owned by `user_id`.
pub async fn get_page(db: &DatabaseConnection, user_id: i64, page_id: i64) -> Result<page::Model> {
    Page::find_by_id(page_id)
        .filter(page::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or(Error::PageNotFound { id: page_id })
}

/// Creates a page with seven empty days at the end of its folder.
pub async fn create_page(
    db: &DatabaseConnection,
    user_id: i64,
    new_page: NewPage,
) -> Result<page::Model> {
    if let Some(folder_id) = new_page.folder_id {
        super::folder::get_folder(db, user_id, folder_id).await?;
    }

    let folder_filter = match new_page.folder_id {
        Some(id) => page::Column::FolderId.eq(id),
        None => page::Column::FolderId.is_null(),
    };
    let last = Page::find()
        .filter(page::Column::UserId.eq(user_id))
        .filter(folder_filter)
        .order_by_desc(page::Column::SortOrder)
        .one(db)
        .await?;

    let non_blank = |value: Option<String>, default: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };
    let now = Utc::now();

    let page = page::ActiveModel {
        user_id: Set(user_id),
        folder_id: Set(new_page.folder_id),
        title: Set(non_blank(new_page.title, DEFAULT_PAGE_TITLE)),
        icon: Set(non_blank(new_page.icon, DEFAULT_PAGE_ICON)),
        days: Set(page::Days::empty_week()),
        sort_order: Set(last.map_or(0, |p| p.sort_order + 1)),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    page.insert(db).await.map_err(Into::into)
}

/// Checks a bulk day replacement: seven slots numbered 1..=7 once each, and
/// valid amounts on every entry. Returns the slots sorted by index.
pub fn validate_days(mut days: page::Days) -> Result<page::Days> {
    days.0.sort_by_key(|day| day.day_index);
    let indices: Vec<u8> = days.iter().map(|day| day.day_index).collect();
    let expected: Vec<u8> = (1..=page::DAYS_PER_PAGE).collect();
    if indices != expected {
        return Err(Error::validation(format!(
            "days must contain each dayIndex 1..=7 exactly once, got {indices:?}"
        )));
    }
    for entry in days.iter().flat_map(|day| day.entries.iter()) {
        validate_amount(entry.amount)?;
    }
    Ok(days)
}

/// Stores new days for `page` and bumps its `updated_at`.
pub async fn save_days(
    db: &DatabaseConnection,
    page: page::Model,
    days: page::Days,
) -> Result<page::Model> {
    let mut active_model: page::ActiveModel = page.into();
    active_model.days = Set(days);
    active_model.updated_at = Set(Utc::now());
    active_model.update(db).await.map_err(Into::into)
}

/// Applies `update` to a page.
pub async fn update_page(
    db: &DatabaseConnection,
    user_id: i64,
    page_id: i64,
    update: PageUpdate,
) -> Result<page::Model> {
    let existing = get_page(db, user_id, page_id).await?;
    let mut active_model: page::ActiveModel = existing.into();

    if let Some(title) = update.title {
        active_model.title = Set(title);
    }
    if let Some(icon) = update.icon {
        active_model.icon = Set(icon);
    }
    if let Some(folder_id) = update.folder_id {
        if let Some(id) = folder_id {
            super::folder::get_folder(db, user_id, id).await?;
        }
        active_model.folder_id = Set(folder_id);
    }
    if let Some(order) = update.order {
        active_model.sort_order = Set(order);
    }
    if let Some(days) = update.days {
        active_model.days = Set(validate_days(days)?);
    }
    active_model.updated_at = Set(Utc::now());

    active_model.update(db).await.map_err(Into::into)
}

/// Deletes one page.
pub async fn delete_page(db: &DatabaseConnection, user_id: i64, page_id: i64) -> Result<()> {
    let result = Page::delete_many()
        .filter(page::Column::Id.eq(page_id))
        .filter(page::Column::UserId.eq(user_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::PageNotFound { id: page_id });
    }
    Ok(())
}
