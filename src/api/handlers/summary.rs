use super::OptionalJson;
use crate::{
    ai::AiProvider,
    api::{AppState, auth::AuthUser},
    core::{
        budget::SummaryKind,
        summary::{self, DailyRequest, SummaryView},
    },
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::Utc;
use serde::Deserialize;

/// Body of `POST /api/ai/summary/daily`. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummaryBody {
    /// Provider override
    pub provider: Option<String>,
    /// Restrict the summary to one page
    pub page_id: Option<i64>,
    /// Day slot on that page, 0..=7 with 0 meaning 7
    pub day_index: Option<i64>,
}

/// Body of `POST /api/ai/summary/weekly`.
#[derive(Debug, Default, Deserialize)]
pub struct WeeklySummaryBody {
    /// Provider override
    pub provider: Option<String>,
}

/// Query string of the listing routes.
#[derive(Debug, Default, Deserialize)]
pub struct SummaryListQuery {
    /// Maximum number of rows
    pub limit: Option<u64>,
}

fn parse_provider(raw: Option<String>) -> Result<Option<AiProvider>> {
    raw.filter(|name| !name.trim().is_empty())
        .map(|name| {
            name.trim()
                .parse::<AiProvider>()
                .map_err(|e| Error::validation(e.to_string()))
        })
        .transpose()
}

/// `POST /api/ai/summary/daily`
pub async fn generate_daily(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    OptionalJson(body): OptionalJson<DailySummaryBody>,
) -> Result<Json<SummaryView>> {
    let day_index = body
        .day_index
        .map(|day| {
            u8::try_from(day).map_err(|_| {
                Error::validation(format!("dayIndex must be between 0 and 7, got {day}"))
            })
        })
        .transpose()?;
    let request = DailyRequest {
        provider: parse_provider(body.provider)?,
        page_id: body.page_id,
        day_index,
    };

    let today = Utc::now().date_naive();
    summary::generate_daily_summary(state.summary_context(), &user, request, today)
        .await
        .map(Json)
}

/// `POST /api/ai/summary/weekly`
pub async fn generate_weekly(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    OptionalJson(body): OptionalJson<WeeklySummaryBody>,
) -> Result<Json<SummaryView>> {
    let provider = parse_provider(body.provider)?;

    let today = Utc::now().date_naive();
    summary::generate_weekly_summary(state.summary_context(), &user, provider, today)
        .await
        .map(Json)
}

async fn list(
    state: &AppState,
    user_id: i64,
    kind: SummaryKind,
    limit: Option<u64>,
) -> Result<Json<Vec<SummaryView>>> {
    let limit = limit.unwrap_or_else(|| kind.default_list_limit());
    let rows = summary::list_summaries(&state.db, user_id, kind, limit).await?;
    Ok(Json(rows.into_iter().map(SummaryView::from).collect()))
}

/// `GET /api/ai/summary/daily?limit=N`, newest first, default 7
pub async fn list_daily(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<SummaryListQuery>,
) -> Result<Json<Vec<SummaryView>>> {
    list(&state, user.id, SummaryKind::Daily, query.limit).await
}

/// `GET /api/ai/summary/weekly?limit=N`, newest first, default 4
pub async fn list_weekly(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(query): Query<SummaryListQuery>,
) -> Result<Json<Vec<SummaryView>>> {
    list(&state, user.id, SummaryKind::Weekly, query.limit).await
}
