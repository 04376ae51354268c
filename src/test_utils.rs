//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases,
//! creating test entities with sensible defaults, and fakes for the AI and
//! mail seams.
#![allow(clippy::unwrap_used)]

use crate::{
    ai::{AiError, AiProvider, ProviderAdapter, SummaryGenerator},
    api::AppState,
    config::settings::AppConfig,
    core::{
        folder::{self, NewFolder},
        page::{self as page_ops, NewPage},
        user::{self as user_ops, Identity},
    },
    crypto::KeyCipher,
    entities::{folder as folder_entity, page, user},
    errors::{Error, Result},
    mail::{MailTransport, OutgoingMail},
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::DatabaseConnection;
use std::sync::{Arc, Mutex};

/// Fixed 256-bit key used by every test cipher.
pub const TEST_KEY_HEX: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Cipher over [`TEST_KEY_HEX`].
pub fn test_cipher() -> KeyCipher {
    KeyCipher::from_hex(TEST_KEY_HEX).unwrap()
}

/// Proxy identity with only an e-mail.
pub fn identity(email: &str) -> Identity {
    Identity {
        email: email.to_string(),
        name: None,
        image: None,
    }
}

/// Signs a user in, creating it with default settings.
pub async fn create_test_user(db: &DatabaseConnection, email: &str) -> Result<user::Model> {
    user_ops::sign_in(db, &identity(email)).await
}

/// An unsaved user model.
///
/// # Defaults
/// * `id`: 1
/// * `email`: "sample@example.com"
/// * `settings`: defaults (provider `openai`, currency `₹`)
/// * `ai_keys`: none
pub fn sample_user() -> user::Model {
    let now = Utc::now();
    user::Model {
        id: 1,
        name: "Sample".to_string(),
        email: "sample@example.com".to_string(),
        image: None,
        settings: user::UserSettings::default(),
        ai_keys: user::AiKeys::default(),
        weekly_reports_enabled: false,
        onboarding_completed: false,
        created_at: now,
        updated_at: now,
    }
}

/// Default settings with a monthly budget and no fixed expenses.
pub fn settings_with_budget(monthly_budget: f64) -> user::UserSettings {
    user::UserSettings {
        monthly_budget,
        ..Default::default()
    }
}

/// A fixed expense with only a title and amount.
pub fn fixed_expense(title: &str, amount: f64) -> user::FixedExpense {
    user::FixedExpense {
        title: title.to_string(),
        amount,
        description: None,
        category: None,
        tags: Vec::new(),
    }
}

/// An entry with a fresh id and no description or tags.
pub fn entry(title: &str, amount: f64, category: &str) -> page::Entry {
    page::Entry {
        id: uuid::Uuid::new_v4().to_string(),
        title: title.to_string(),
        amount,
        description: String::new(),
        category: category.to_string(),
        tags: Vec::new(),
        created_at: Utc::now(),
    }
}

/// Creates a folder through the normal create path.
pub async fn create_test_folder(
    db: &DatabaseConnection,
    user_id: i64,
    name: &str,
    parent_folder_id: Option<i64>,
) -> Result<folder_entity::Model> {
    folder::create_folder(
        db,
        user_id,
        NewFolder {
            name: Some(name.to_string()),
            parent_folder_id,
        },
    )
    .await
}

/// Creates a root page and places each `(day_index, entry)` in its slot.
pub async fn create_test_page_with_entries(
    db: &DatabaseConnection,
    user_id: i64,
    entries: Vec<(u8, page::Entry)>,
) -> Result<page::Model> {
    let created = page_ops::create_page(db, user_id, NewPage::default()).await?;
    let mut days = created.days.clone();
    for (day_index, entry) in entries {
        days.get_mut(day_index).unwrap().entries.push(entry);
    }
    page_ops::save_days(db, created, days).await
}

/// Provider adapter that records requests and returns a canned outcome.
pub struct RecordingAdapter {
    provider: AiProvider,
    outcome: std::result::Result<String, AiError>,
    requests: Mutex<Vec<(String, String, String)>>,
}

impl RecordingAdapter {
    /// Adapter answering every request with `reply`.
    pub fn replying(provider: AiProvider, reply: &str) -> Arc<Self> {
        Arc::new(Self {
            provider,
            outcome: Ok(reply.to_string()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Adapter failing every request with `error`.
    pub fn failing(provider: AiProvider, error: AiError) -> Arc<Self> {
        Arc::new(Self {
            provider,
            outcome: Err(error),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Number of requests received.
    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// `(api_key, system_prompt, user_prompt)` of the latest request.
    pub fn last_request(&self) -> Option<(String, String, String)> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ProviderAdapter for RecordingAdapter {
    fn provider(&self) -> AiProvider {
        self.provider
    }

    async fn submit(
        &self,
        api_key: &str,
        system_prompt: &str,
        user_prompt: &str,
    ) -> std::result::Result<String, AiError> {
        self.requests.lock().unwrap().push((
            api_key.to_string(),
            system_prompt.to_string(),
            user_prompt.to_string(),
        ));
        self.outcome.clone()
    }
}

/// Mail transport that keeps sent messages in memory.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingMail>>,
    fail_for: Option<String>,
}

impl RecordingMailer {
    /// Mailer that accepts everything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mailer that rejects messages addressed to `address`.
    pub fn failing_for(address: &str) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            fail_for: Some(address.to_string()),
        }
    }

    /// Messages accepted so far.
    pub fn sent(&self) -> Vec<OutgoingMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, mail: &OutgoingMail) -> Result<()> {
        if self.fail_for.as_deref() == Some(mail.to.as_str()) {
            return Err(Error::Mail {
                message: format!("mailbox unavailable: {}", mail.to),
            });
        }
        self.sent.lock().unwrap().push(mail.clone());
        Ok(())
    }
}

/// Application state over `db` with no AI adapters installed.
pub fn test_state(
    db: DatabaseConnection,
    mailer: Arc<dyn MailTransport>,
    cron_secret: Option<&str>,
) -> AppState {
    let config = AppConfig {
        cron_secret: cron_secret.map(ToString::to_string),
        ..Default::default()
    };
    AppState {
        db,
        generator: Arc::new(SummaryGenerator::empty(test_cipher())),
        mailer,
        config: Arc::new(config),
    }
}
