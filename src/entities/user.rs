//! User entity - the root aggregate every folder, page and summary belongs to.
//!
//! Budget settings and encrypted provider keys are nested documents stored as
//! JSON columns on the user row.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Currency symbol used when a user has not picked one.
pub const DEFAULT_CURRENCY: &str = "₹";

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Sign-in e-mail, unique per user
    #[sea_orm(unique)]
    pub email: String,
    /// Avatar URL supplied by the identity provider
    pub image: Option<String>,
    /// Budget settings snapshot
    pub settings: UserSettings,
    /// Encrypted provider credentials
    pub ai_keys: AiKeys,
    /// Opt-in flag for the weekly e-mail report
    pub weekly_reports_enabled: bool,
    /// Whether the onboarding flow has been finished
    pub onboarding_completed: bool,
    /// When the user first signed in
    pub created_at: DateTimeUtc,
    /// Last modification
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many folders
    #[sea_orm(has_many = "super::folder::Entity")]
    Folders,
    /// One user has many pages
    #[sea_orm(has_many = "super::page::Entity")]
    Pages,
    /// One user has many stored summaries
    #[sea_orm(has_many = "super::ai_summary::Entity")]
    Summaries,
}

impl Related<super::folder::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Folders.def()
    }
}

impl Related<super::page::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pages.def()
    }
}

impl Related<super::ai_summary::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Summaries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Budget settings, read by value into every calculation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    /// Nominal monthly budget before fixed expenses
    #[serde(default)]
    pub monthly_budget: f64,
    /// Recurring monthly costs, in the order the user entered them
    #[serde(default)]
    pub fixed_expenses: Vec<FixedExpense>,
    /// Provider name used when a request does not pick one
    #[serde(default, rename = "preferredAIProvider")]
    pub preferred_ai_provider: Option<String>,
    /// Currency symbol prefixed to every amount
    #[serde(default)]
    pub currency: Option<String>,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            monthly_budget: 0.0,
            fixed_expenses: Vec::new(),
            preferred_ai_provider: Some("openai".to_string()),
            currency: Some(DEFAULT_CURRENCY.to_string()),
        }
    }
}

impl UserSettings {
    /// Currency symbol, falling back to [`DEFAULT_CURRENCY`].
    #[must_use]
    pub fn currency_symbol(&self) -> &str {
        self.currency
            .as_deref()
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CURRENCY)
    }
}

/// A recurring monthly cost subtracted from the budget.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixedExpense {
    /// What the expense is for (e.g. "Rent")
    pub title: String,
    /// Monthly amount
    #[serde(default)]
    pub amount: f64,
    /// Free text note
    #[serde(default)]
    pub description: Option<String>,
    /// Optional category to compare against entries
    #[serde(default)]
    pub category: Option<String>,
    /// Optional tags
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Encrypted API keys, one optional slot per provider.
///
/// An absent or empty slot means the provider is not configured.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(default)]
pub struct AiKeys {
    /// `OpenAI` key
    pub openai: Option<String>,
    /// Google Gemini key
    pub google: Option<String>,
    /// Anthropic key
    pub anthropic: Option<String>,
    /// `OpenRouter` key
    pub openrouter: Option<String>,
    /// `HuggingFace` inference key
    pub huggingface: Option<String>,
}

impl AiKeys {
    /// Returns the stored value for `provider` if present and non-empty.
    #[must_use]
    pub fn get(&self, provider: &str) -> Option<&str> {
        let slot = match provider {
            "openai" => &self.openai,
            "google" => &self.google,
            "anthropic" => &self.anthropic,
            "openrouter" => &self.openrouter,
            "huggingface" => &self.huggingface,
            _ => return None,
        };
        slot.as_deref().filter(|value| !value.is_empty())
    }

    /// Stores `value` in the slot for `provider`. Unknown names are ignored and
    /// reported back as `false`.
    pub fn set(&mut self, provider: &str, value: String) -> bool {
        let slot = match provider {
            "openai" => &mut self.openai,
            "google" => &mut self.google,
            "anthropic" => &mut self.anthropic,
            "openrouter" => &mut self.openrouter,
            "huggingface" => &mut self.huggingface,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}
