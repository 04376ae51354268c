//! Page entity - a unit of tracking with exactly seven day slots.
//!
//! Days and their entries are owned by the page and stored as a JSON document
//! in the `days` column. Slots are 1-based (1 = Monday .. 7 = Sunday).

use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Number of day slots on every page.
pub const DAYS_PER_PAGE: u8 = 7;

/// Page database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "pages")]
pub struct Model {
    /// Unique identifier for the page
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Containing folder, `None` for pages at the root
    pub folder_id: Option<i64>,
    /// Page title
    pub title: String,
    /// Emoji icon shown in the sidebar
    pub icon: String,
    /// The seven day slots
    pub days: Days,
    /// Position among sibling pages
    #[serde(rename = "order")]
    pub sort_order: i32,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Bumped on every mutation, including entry edits
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Page and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each page belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// Each page may sit in one folder
    #[sea_orm(
        belongs_to = "super::folder::Entity",
        from = "Column::FolderId",
        to = "super::folder::Column::Id"
    )]
    Folder,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::folder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Folder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The day slots of a page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct Days(pub Vec<Day>);

impl Days {
    /// Seven empty slots, indexed 1..=7.
    #[must_use]
    pub fn empty_week() -> Self {
        Self(
            (1..=DAYS_PER_PAGE)
                .map(|day_index| Day {
                    day_index,
                    entries: Vec::new(),
                })
                .collect(),
        )
    }

    /// Looks up a slot by its 1-based index.
    #[must_use]
    pub fn get(&self, day_index: u8) -> Option<&Day> {
        self.0.iter().find(|day| day.day_index == day_index)
    }

    /// Mutable lookup by 1-based index.
    pub fn get_mut(&mut self, day_index: u8) -> Option<&mut Day> {
        self.0.iter_mut().find(|day| day.day_index == day_index)
    }

    /// Iterates over the slots in stored order.
    pub fn iter(&self) -> std::slice::Iter<'_, Day> {
        self.0.iter()
    }
}

impl Default for Days {
    fn default() -> Self {
        Self::empty_week()
    }
}

/// One of the seven ordered slots of a page.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Day {
    /// Slot number, 1..=7
    pub day_index: u8,
    /// Entries in display order
    #[serde(default)]
    pub entries: Vec<Entry>,
}

/// A single expense record.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Stable identifier inside the page document
    #[serde(rename = "_id")]
    pub id: String,
    /// Short label
    pub title: String,
    /// Amount spent, currency-agnostic
    pub amount: f64,
    /// Free text note
    #[serde(default)]
    pub description: String,
    /// Category name, empty when uncategorised
    #[serde(default)]
    pub category: String,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// When the entry was added
    pub created_at: DateTime<Utc>,
}
