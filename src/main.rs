#![allow(clippy::result_large_err)]

use budget_pages::{
    ai::SummaryGenerator,
    api::{self, AppState},
    config::{self, database},
    crypto::KeyCipher,
    errors::{Error, Result},
    mail, scheduler,
};
use dotenvy::dotenv;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file, non-fatal since variables can be set externally
    dotenv().ok();

    // 3. Load the application configuration
    let app_config = config::load_default_config()
        .inspect_err(|e| error!("Failed to load configuration: {}", e))?;

    // 4. The master key is mandatory: stored provider keys are useless without it
    let cipher = app_config
        .encryption_key
        .as_deref()
        .ok_or_else(|| Error::Config {
            message: "ENCRYPTION_KEY must be set".to_string(),
        })
        .and_then(KeyCipher::from_hex)
        .inspect_err(|e| error!("{}", e))?;

    // 5. Initialize database
    if app_config.database_url == database::DEFAULT_DATABASE_URL {
        std::fs::create_dir_all("data")?;
    }
    let db = database::create_connection(&app_config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 6. AI dispatcher and mailer
    let generator = SummaryGenerator::new(
        cipher,
        Duration::from_secs(app_config.ai.request_timeout_secs),
    )?;
    let mailer = mail::build_mailer(&app_config.mail)?;

    if app_config.cron_secret.is_none() {
        warn!("CRON_SECRET not set; /api/cron/weekly-email will refuse every call");
    }

    let state = AppState {
        db,
        generator: Arc::new(generator),
        mailer,
        config: Arc::new(app_config),
    };

    // 7. Optional in-process weekly schedule
    if let Some(expr) = state.config.reports.weekly_schedule.as_deref() {
        let schedule = scheduler::parse_schedule(expr)?;
        info!("Weekly report schedule enabled: {}", expr);
        tokio::spawn(scheduler::run_weekly_schedule(schedule, state.clone()));
    }

    // 8. Serve until Ctrl-C
    api::serve(state, shutdown_signal()).await
}
