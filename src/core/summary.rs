//! Daily and weekly AI summaries.
//!
//! Each pipeline loads the pages in scope, builds a prompt, asks the
//! dispatcher for a structured reply and upserts it under
//! `(user_id, date, kind)`. When the dispatcher fails, a template summary is
//! built from the budget numbers instead and returned with `degraded = true`;
//! it is only stored when `persist_fallbacks` is set.

use super::budget::{
    BudgetFigures, SpendingBreakdown, SummaryKind, comparison_day_indices, money,
};
use super::prompt;
use crate::{
    ai::{AiErrorKind, AiProvider, AiResponse, SummaryGenerator},
    entities::{AiSummary, Page, ai_summary, page, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use sea_orm::{QueryOrder, QuerySelect, Set, prelude::*};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Which pages a summary reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageScope {
    /// Every page the user owns, regardless of age
    AllPages,
    /// Pages whose `updated_at` is at or after the instant
    UpdatedSince(DateTime<Utc>),
}

/// Loads the user's pages for `scope`, in sidebar order.
pub async fn load_pages(
    db: &DatabaseConnection,
    user_id: i64,
    scope: PageScope,
) -> Result<Vec<page::Model>> {
    let mut query = Page::find().filter(page::Column::UserId.eq(user_id));
    if let PageScope::UpdatedSince(since) = scope {
        query = query.filter(page::Column::UpdatedAt.gte(since));
    }
    query
        .order_by_asc(page::Column::SortOrder)
        .order_by_asc(page::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Summary as returned over HTTP, stored or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryView {
    /// Row id, `None` when the summary was not stored
    pub id: Option<i64>,
    /// Owning user
    pub user_id: i64,
    /// ISO date key
    pub date: String,
    /// `daily` or `weekly`
    #[serde(rename = "type")]
    pub kind: SummaryKind,
    /// Narrative text
    pub summary: String,
    /// Total spending in scope
    pub total_spent: f64,
    /// Insight bullets
    pub insights: Vec<String>,
    /// Recommendation bullets
    pub recommendations: Vec<String>,
    /// True for template fallbacks
    pub degraded: bool,
    /// First write, when stored
    pub created_at: Option<DateTime<Utc>>,
    /// Last write, when stored
    pub updated_at: Option<DateTime<Utc>>,
}

impl SummaryView {
    fn unsaved(
        user_id: i64,
        date: NaiveDate,
        kind: SummaryKind,
        total_spent: f64,
        response: AiResponse,
        degraded: bool,
    ) -> Self {
        Self {
            id: None,
            user_id,
            date: iso_date(date),
            kind,
            summary: response.summary,
            total_spent,
            insights: response.insights,
            recommendations: response.recommendations,
            degraded,
            created_at: None,
            updated_at: None,
        }
    }
}

impl From<ai_summary::Model> for SummaryView {
    fn from(model: ai_summary::Model) -> Self {
        let kind = if model.kind == SummaryKind::Weekly.as_str() {
            SummaryKind::Weekly
        } else {
            SummaryKind::Daily
        };
        Self {
            id: Some(model.id),
            user_id: model.user_id,
            date: model.date,
            kind,
            summary: model.summary,
            total_spent: model.total_spent,
            insights: model.insights.0,
            recommendations: model.recommendations.0,
            degraded: model.degraded,
            created_at: Some(model.created_at),
            updated_at: Some(model.updated_at),
        }
    }
}

/// Options for the daily summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DailyRequest {
    /// Provider override
    pub provider: Option<AiProvider>,
    /// Restrict to one page; requires `day_index`
    pub page_id: Option<i64>,
    /// Slot on that page, `0` is accepted for slot 7
    pub day_index: Option<u8>,
}

/// Settings shared by both pipelines.
#[derive(Debug, Clone, Copy)]
pub struct SummaryContext<'a> {
    /// Database
    pub db: &'a DatabaseConnection,
    /// AI dispatcher
    pub generator: &'a SummaryGenerator,
    /// Store fallbacks as degraded rows
    pub persist_fallbacks: bool,
}

fn iso_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Start of the week containing `today`: the most recent Sunday, or `today`
/// itself on a Sunday.
#[must_use]
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(i64::from(today.weekday().num_days_from_sunday()))
}

/// Inserts or replaces the summary stored under `(user_id, date, kind)`.
pub async fn upsert_summary<C>(
    db: &C,
    user_id: i64,
    date: &str,
    kind: SummaryKind,
    total_spent: f64,
    response: &AiResponse,
    degraded: bool,
) -> Result<ai_summary::Model>
where
    C: ConnectionTrait,
{
    let now = Utc::now();
    let existing = AiSummary::find()
        .filter(ai_summary::Column::UserId.eq(user_id))
        .filter(ai_summary::Column::Date.eq(date))
        .filter(ai_summary::Column::Kind.eq(kind.as_str()))
        .one(db)
        .await?;

    let is_new = existing.is_none();
    let mut active_model: ai_summary::ActiveModel = match existing {
        Some(row) => row.into(),
        None => ai_summary::ActiveModel {
            user_id: Set(user_id),
            date: Set(date.to_string()),
            kind: Set(kind.as_str().to_string()),
            created_at: Set(now),
            ..Default::default()
        },
    };
    active_model.summary = Set(response.summary.clone());
    active_model.total_spent = Set(total_spent);
    active_model.insights = Set(ai_summary::StringList(response.insights.clone()));
    active_model.recommendations = Set(ai_summary::StringList(response.recommendations.clone()));
    active_model.degraded = Set(degraded);
    active_model.updated_at = Set(now);

    let row = if is_new {
        active_model.insert(db).await?
    } else {
        active_model.update(db).await?
    };
    Ok(row)
}

/// Most recent `limit` summaries of `kind`, newest date first.
pub async fn list_summaries(
    db: &DatabaseConnection,
    user_id: i64,
    kind: SummaryKind,
    limit: u64,
) -> Result<Vec<ai_summary::Model>> {
    AiSummary::find()
        .filter(ai_summary::Column::UserId.eq(user_id))
        .filter(ai_summary::Column::Kind.eq(kind.as_str()))
        .order_by_desc(ai_summary::Column::Date)
        .limit(limit)
        .all(db)
        .await
        .map_err(Into::into)
}

/// First fallback recommendation, chosen by what went wrong.
#[must_use]
pub const fn fallback_guidance(kind: AiErrorKind) -> &'static str {
    match kind {
        AiErrorKind::RateLimited => {
            "⚠️ AI rate limit reached. Wait a few minutes or try a different provider"
        }
        AiErrorKind::Credentials => {
            "Set up your AI API key in Settings > AI Keys for detailed insights"
        }
        AiErrorKind::MalformedResponse | AiErrorKind::Unavailable => {
            "AI service unavailable. Try again later or use a different provider"
        }
    }
}

/// Template daily summary built from the numbers alone.
#[must_use]
pub fn daily_fallback(
    settings: &user::UserSettings,
    breakdown: &SpendingBreakdown,
    error_kind: AiErrorKind,
) -> AiResponse {
    let currency = settings.currency_symbol();
    let figures = BudgetFigures::from_settings(settings);
    let total = money(currency, breakdown.total_spent);
    let verdict = if figures.is_over_budget(breakdown.total_spent, SummaryKind::Daily) {
        "⚠️ This is above your daily average budget!"
    } else {
        "You're within your daily budget."
    };

    AiResponse {
        summary: format!("You spent {total} today. {verdict}"),
        insights: vec![
            format!("Total spending: {total}"),
            format!(
                "Top category: {}",
                breakdown.top_category().map_or("N/A", |(name, _)| name)
            ),
        ],
        recommendations: vec![
            fallback_guidance(error_kind).to_string(),
            "Track your spending consistently for better analysis".to_string(),
        ],
    }
}

/// Template weekly summary built from the numbers alone.
#[must_use]
pub fn weekly_fallback(
    settings: &user::UserSettings,
    breakdown: &SpendingBreakdown,
    error_kind: AiErrorKind,
) -> AiResponse {
    let currency = settings.currency_symbol();
    let figures = BudgetFigures::from_settings(settings);
    let total = money(currency, breakdown.total_spent);
    let over = figures.is_over_budget(breakdown.total_spent, SummaryKind::Weekly);
    let verdict = if over {
        "⚠️ You've exceeded your weekly budget!"
    } else {
        "You're within your weekly budget."
    };

    AiResponse {
        summary: format!("Weekly total: {total}. {verdict}"),
        insights: vec![
            format!("Total weekly spending: {total}"),
            format!("Monthly budget: {}", money(currency, figures.monthly_budget)),
            format!("Fixed expenses: {}", money(currency, figures.fixed_expenses_total)),
            format!(
                "Available budget: {}/month",
                money(currency, figures.available_monthly_budget)
            ),
            format!("Weekly budget target: {}", money(currency, figures.weekly_budget)),
            format!(
                "Highest spending day: Day {}",
                breakdown
                    .top_day()
                    .map_or_else(|| "N/A".to_string(), |(day, _)| day.to_string())
            ),
            format!(
                "Top category: {}",
                breakdown.top_category().map_or("N/A", |(name, _)| name)
            ),
        ],
        recommendations: vec![
            fallback_guidance(error_kind).to_string(),
            if over {
                "Consider reducing discretionary spending next week"
            } else {
                "Keep up the good budgeting!"
            }
            .to_string(),
        ],
    }
}

/// Payload returned when the week has no entries at all.
#[must_use]
pub fn no_data_response() -> AiResponse {
    AiResponse {
        summary: "No spending data available for this week. Start tracking your expenses!"
            .to_string(),
        insights: vec!["No transactions recorded this week".to_string()],
        recommendations: vec![
            "Start adding your daily expenses to track your spending".to_string(),
        ],
    }
}

/// Dispatches `prompt`, then stores the reply, or builds and optionally stores
/// the fallback.
#[allow(clippy::too_many_arguments)]
async fn dispatch_and_store<F>(
    ctx: SummaryContext<'_>,
    user: &user::Model,
    date: NaiveDate,
    kind: SummaryKind,
    breakdown: &SpendingBreakdown,
    prompt: &str,
    provider: Option<AiProvider>,
    fallback: F,
) -> Result<SummaryView>
where
    F: FnOnce(AiErrorKind) -> AiResponse,
{
    let date_key = iso_date(date);
    let total = breakdown.total_spent;

    match ctx.generator.generate(user, prompt, provider).await {
        Ok(response) => {
            let row =
                upsert_summary(ctx.db, user.id, &date_key, kind, total, &response, false).await?;
            info!(user_id = user.id, %kind, date = %date_key, "Stored AI summary");
            Ok(row.into())
        }
        Err(e) => {
            warn!(
                user_id = user.id,
                %kind,
                kind_of_error = ?e.kind(),
                "AI generation failed, using fallback: {}",
                e
            );
            let response = fallback(e.kind());
            if ctx.persist_fallbacks {
                let row =
                    upsert_summary(ctx.db, user.id, &date_key, kind, total, &response, true)
                        .await?;
                Ok(row.into())
            } else {
                Ok(SummaryView::unsaved(user.id, date, kind, total, response, true))
            }
        }
    }
}

/// Generates (or falls back for) the daily summary dated `today`.
///
/// Without a page the scope is every page. With `page_id` and `day_index`
/// the scope is that slot, and the prompt compares it with the two slots
/// before it.
#[instrument(skip(ctx, user), fields(user_id = user.id))]
pub async fn generate_daily_summary(
    ctx: SummaryContext<'_>,
    user: &user::Model,
    request: DailyRequest,
    today: NaiveDate,
) -> Result<SummaryView> {
    let settings = &user.settings;

    let (breakdown, prompt) = match (request.page_id, request.day_index) {
        (Some(_), None) => {
            return Err(Error::validation("dayIndex is required when pageId is given"));
        }
        (Some(page_id), Some(day_index)) => {
            let slot = match day_index {
                0 => 7,
                1..=7 => day_index,
                other => {
                    return Err(Error::validation(format!(
                        "dayIndex must be between 0 and 7, got {other}"
                    )));
                }
            };
            let page = super::page::get_page(ctx.db, user.id, page_id).await?;
            let current = page.days.get(slot).ok_or(Error::DayNotFound {
                page_id,
                day_index: slot,
            })?;

            let breakdown = SpendingBreakdown::from_days(std::iter::once(current));
            let days: Vec<(u8, SpendingBreakdown)> = comparison_day_indices(slot)
                .into_iter()
                .map(|index| (index, SpendingBreakdown::from_days(page.days.get(index))))
                .collect();
            let prompt = prompt::daily_comparison_prompt(settings, &page.title, &days);
            (breakdown, prompt)
        }
        (None, _) => {
            let pages = load_pages(ctx.db, user.id, PageScope::AllPages).await?;
            let breakdown = SpendingBreakdown::from_pages(&pages);
            let prompt = prompt::daily_prompt(settings, &breakdown);
            (breakdown, prompt)
        }
    };

    dispatch_and_store(
        ctx,
        user,
        today,
        SummaryKind::Daily,
        &breakdown,
        &prompt,
        request.provider,
        |kind| daily_fallback(settings, &breakdown, kind),
    )
    .await
}

/// Generates (or falls back for) the weekly summary of the week containing
/// `today`, over every page.
///
/// An empty scope returns the no-data payload without calling the dispatcher
/// or storing anything.
#[instrument(skip(ctx, user), fields(user_id = user.id))]
pub async fn generate_weekly_summary(
    ctx: SummaryContext<'_>,
    user: &user::Model,
    provider: Option<AiProvider>,
    today: NaiveDate,
) -> Result<SummaryView> {
    let date = week_start(today);
    let pages = load_pages(ctx.db, user.id, PageScope::AllPages).await?;
    let breakdown = SpendingBreakdown::from_pages(&pages);

    if breakdown.is_empty() {
        return Ok(SummaryView::unsaved(
            user.id,
            date,
            SummaryKind::Weekly,
            0.0,
            no_data_response(),
            false,
        ));
    }

    let prompt = prompt::weekly_prompt(&user.settings, &breakdown);
    dispatch_and_store(
        ctx,
        user,
        date,
        SummaryKind::Weekly,
        &breakdown,
        &prompt,
        provider,
        |kind| weekly_fallback(&user.settings, &breakdown, kind),
    )
    .await
}
