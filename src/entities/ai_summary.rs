//! AI summary entity - one stored summary per `(user_id, date, kind)`.
//!
//! Uniqueness of the tuple is maintained by the upsert in
//! `core::summary::upsert_summary`, not by a declared constraint.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// AI summary database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ai_summaries")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// ISO date key: today for daily, week-start Sunday for weekly
    pub date: String,
    /// `"daily"` or `"weekly"`
    pub kind: String,
    /// Summary text
    pub summary: String,
    /// Total spending in the summarised scope
    pub total_spent: f64,
    /// Insight bullet points
    pub insights: StringList,
    /// Recommendation bullet points
    pub recommendations: StringList,
    /// True when the row holds a template fallback rather than AI output
    pub degraded: bool,
    /// First write
    pub created_at: DateTimeUtc,
    /// Latest upsert
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `AiSummary` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each summary belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// JSON array of strings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);
