//! Application settings loaded from `config.toml` and the environment.
//!
//! The TOML file is optional and every field has a default. Secrets never live
//! in the file: the encryption key, cron secret and mail password are read from
//! the environment (usually populated from `.env` by `dotenvy`).

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP server options
    pub server: ServerConfig,
    /// AI dispatch options
    pub ai: AiConfig,
    /// Outbound mail options
    pub mail: MailConfig,
    /// Weekly report options
    pub reports: ReportsConfig,
    /// Database URL, taken from `DATABASE_URL`
    #[serde(skip)]
    pub database_url: String,
    /// Hex master key for provider credentials, taken from `ENCRYPTION_KEY`
    #[serde(skip)]
    pub encryption_key: Option<String>,
    /// Bearer secret for the cron trigger, taken from `CRON_SECRET`
    #[serde(skip)]
    pub cron_secret: Option<String>,
}

/// HTTP server options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Socket address to listen on
    pub bind_addr: String,
    /// Browser origins allowed by CORS; empty disables the CORS layer
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

/// AI dispatch options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Timeout applied to every provider request
    pub request_timeout_secs: u64,
    /// Store template fallbacks as `degraded` summaries instead of only returning them
    pub persist_fallbacks: bool,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 60,
            persist_fallbacks: false,
        }
    }
}

/// SMTP options. Mail is disabled unless host, user and password are all set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MailConfig {
    /// SMTP relay host
    pub host: Option<String>,
    /// SMTP port, 465 means implicit TLS, anything else STARTTLS
    pub port: u16,
    /// SMTP user, also used as the sender address
    pub user: Option<String>,
    /// SMTP password, only ever read from `MAIL_PASSWORD`
    #[serde(skip)]
    pub password: Option<String>,
    /// Display name of the sender
    pub from_name: String,
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: 587,
            user: None,
            password: None,
            from_name: "Budget Tracker".to_string(),
        }
    }
}

impl MailConfig {
    /// True when enough is configured to open an SMTP connection.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.host.is_some() && self.user.is_some() && self.password.is_some()
    }
}

/// Weekly report options.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportsConfig {
    /// Five-field cron expression (UTC) for the in-process weekly run, e.g. `0 8 * * Mon`
    pub weekly_schedule: Option<String>,
}

/// Parses configuration from a TOML string without touching the environment.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads configuration from `path` (missing file = defaults) and applies
/// environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    let mut config = if path_ref.exists() {
        tracing::debug!("Loading configuration from {:?}", path_ref);
        let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
            message: format!("Failed to read config file {path_ref:?}: {e}"),
        })?;
        parse_config(&contents)?
    } else {
        tracing::info!("No {:?} found, using default configuration", path_ref);
        AppConfig::default()
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    Ok(config)
}

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<AppConfig> {
    load_config("config.toml")
}

/// Applies environment values on top of file values. `lookup` is injected so the
/// precedence rules can be tested without mutating the process environment.
pub fn apply_env_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    config.database_url = non_empty("DATABASE_URL")
        .unwrap_or_else(|| super::database::DEFAULT_DATABASE_URL.to_string());
    config.encryption_key = non_empty("ENCRYPTION_KEY");
    config.cron_secret = non_empty("CRON_SECRET");

    if let Some(addr) = non_empty("BIND_ADDR") {
        config.server.bind_addr = addr;
    }
    if let Some(host) = non_empty("MAIL_HOST") {
        config.mail.host = Some(host);
    }
    if let Some(port) = non_empty("MAIL_PORT") {
        config.mail.port = port.trim().parse().map_err(|e| Error::Config {
            message: format!("MAIL_PORT must be a port number: {e}"),
        })?;
    }
    if let Some(user) = non_empty("MAIL_USER") {
        config.mail.user = Some(user);
    }
    config.mail.password = non_empty("MAIL_PASSWORD");

    Ok(())
}
