//! User accounts, settings and stored provider keys.

use super::validate_amount;
use crate::{
    ai::AiProvider,
    crypto::KeyCipher,
    entities::{User, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

/// Identity asserted by the upstream authentication layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Verified e-mail address
    pub email: String,
    /// Display name, if the provider sent one
    pub name: Option<String>,
    /// Avatar URL, if the provider sent one
    pub image: Option<String>,
}

/// User as returned over HTTP. Never carries the stored keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    /// User id
    pub id: i64,
    /// Display name
    pub name: String,
    /// E-mail
    pub email: String,
    /// Avatar URL
    pub image: Option<String>,
    /// Budget settings
    pub settings: user::UserSettings,
    /// Weekly e-mail opt-in
    pub weekly_reports_enabled: bool,
    /// Onboarding state
    pub onboarding_completed: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for UserView {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            email: model.email,
            image: model.image,
            settings: model.settings,
            weekly_reports_enabled: model.weekly_reports_enabled,
            onboarding_completed: model.onboarding_completed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Partial update of a user. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New display name, ignored when blank
    pub name: Option<String>,
    /// Full replacement of the settings document
    pub settings: Option<user::UserSettings>,
    /// Onboarding flag
    pub onboarding_completed: Option<bool>,
    /// Weekly e-mail opt-in
    pub weekly_reports_enabled: Option<bool>,
    /// Plaintext keys by provider name; an empty string clears the slot
    pub ai_keys: Option<BTreeMap<String, String>>,
}

/// Which providers have a key stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AiKeyStatus {
    /// `OpenAI`
    pub openai: bool,
    /// Google
    pub google: bool,
    /// Anthropic
    pub anthropic: bool,
    /// `OpenRouter`
    pub openrouter: bool,
    /// `HuggingFace`
    pub huggingface: bool,
}

/// Looks a user up by e-mail.
pub async fn get_user_by_email(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    User::find()
        .filter(user::Column::Email.eq(email))
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            email: email.to_string(),
        })
}

/// Returns the user for `identity`, creating it with default settings on the
/// first sign-in.
pub async fn sign_in(db: &DatabaseConnection, identity: &Identity) -> Result<user::Model> {
    if identity.email.trim().is_empty() {
        return Err(Error::Unauthenticated);
    }

    if let Some(existing) = User::find()
        .filter(user::Column::Email.eq(identity.email.as_str()))
        .one(db)
        .await?
    {
        return Ok(existing);
    }

    let now = Utc::now();
    let new_user = user::ActiveModel {
        name: Set(identity.name.clone().unwrap_or_default()),
        email: Set(identity.email.clone()),
        image: Set(identity.image.clone()),
        settings: Set(user::UserSettings::default()),
        ai_keys: Set(user::AiKeys::default()),
        weekly_reports_enabled: Set(false),
        onboarding_completed: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = new_user.insert(db).await?;
    info!(user_id = created.id, "Created user on first sign-in");
    Ok(created)
}

fn validate_settings(settings: &user::UserSettings) -> Result<()> {
    validate_amount(settings.monthly_budget)?;
    for expense in &settings.fixed_expenses {
        if expense.title.trim().is_empty() {
            return Err(Error::validation("Fixed expense title cannot be empty"));
        }
        validate_amount(expense.amount)?;
    }
    if let Some(provider) = settings
        .preferred_ai_provider
        .as_deref()
        .filter(|p| !p.is_empty())
    {
        provider
            .parse::<AiProvider>()
            .map_err(|e| Error::validation(e.to_string()))?;
    }
    Ok(())
}

/// Applies `update` to the user. Non-empty keys are encrypted with `cipher`
/// before they are stored.
pub async fn update_user(
    db: &DatabaseConnection,
    cipher: &KeyCipher,
    user: user::Model,
    update: UserUpdate,
) -> Result<user::Model> {
    let mut ai_keys = user.ai_keys.clone();
    let mut active_model: user::ActiveModel = user.into();

    if let Some(name) = update.name.filter(|n| !n.trim().is_empty()) {
        active_model.name = Set(name.trim().to_string());
    }
    if let Some(settings) = update.settings {
        validate_settings(&settings)?;
        active_model.settings = Set(settings);
    }
    if let Some(done) = update.onboarding_completed {
        active_model.onboarding_completed = Set(done);
    }
    if let Some(enabled) = update.weekly_reports_enabled {
        active_model.weekly_reports_enabled = Set(enabled);
    }
    if let Some(keys) = update.ai_keys {
        for (provider, key) in keys {
            let stored = if key.trim().is_empty() {
                String::new()
            } else {
                cipher.encrypt(key.trim())?
            };
            if !ai_keys.set(&provider, stored) {
                return Err(Error::validation(format!("Unknown AI provider: {provider}")));
            }
        }
        active_model.ai_keys = Set(ai_keys);
    }
    active_model.updated_at = Set(Utc::now());

    active_model.update(db).await.map_err(Into::into)
}

/// Presence of each provider key, without revealing values.
#[must_use]
pub fn ai_key_status(user: &user::Model) -> AiKeyStatus {
    let has = |provider: AiProvider| user.ai_keys.get(provider.as_str()).is_some();
    AiKeyStatus {
        openai: has(AiProvider::OpenAi),
        google: has(AiProvider::Google),
        anthropic: has(AiProvider::Anthropic),
        openrouter: has(AiProvider::OpenRouter),
        huggingface: has(AiProvider::HuggingFace),
    }
}

/// Users who opted in to the weekly e-mail, by id.
pub async fn get_weekly_report_recipients(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    use sea_orm::QueryOrder;

    User::find()
        .filter(user::Column::WeeklyReportsEnabled.eq(true))
        .order_by_asc(user::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
