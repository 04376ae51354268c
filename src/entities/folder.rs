//! Folder entity - a node in the per-user folder tree.
//!
//! Folders reference their parent through `parent_folder_id`; root folders
//! have no parent.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Folder database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "folders")]
pub struct Model {
    /// Unique identifier for the folder
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Folder name
    pub name: String,
    /// Parent folder, `None` at the root
    pub parent_folder_id: Option<i64>,
    /// Position among siblings
    #[serde(rename = "order")]
    pub sort_order: i32,
    /// Sidebar expansion state
    pub is_expanded: bool,
    /// Creation time
    pub created_at: DateTimeUtc,
    /// Last modification
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Folder and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each folder belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One folder contains many pages
    #[sea_orm(has_many = "super::page::Entity")]
    Pages,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pages.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
