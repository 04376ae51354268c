use crate::{
    api::{AppState, auth::verify_cron_secret},
    core::weekly_report::{WeeklyReportResults, run_weekly_reports},
    errors::Result,
};
use axum::{Json, extract::State, http::HeaderMap};
use chrono::Utc;
use serde::Serialize;

/// Body returned by the cron trigger.
#[derive(Debug, Serialize)]
pub struct CronResponse {
    /// Fixed status line
    pub message: &'static str,
    /// Per-run counters
    pub results: WeeklyReportResults,
}

/// `GET /api/cron/weekly-email`
pub async fn weekly_email(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<CronResponse>> {
    verify_cron_secret(&headers, state.config.cron_secret.as_deref())?;

    let results =
        run_weekly_reports(&state.db, &state.generator, state.mailer.as_ref(), Utc::now()).await?;
    Ok(Json(CronResponse {
        message: "Weekly emails processed",
        results,
    }))
}
