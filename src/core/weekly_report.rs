//! The weekly report e-mail job.
//!
//! Every user with weekly reports enabled gets one e-mail covering the pages
//! they touched in the last seven days. Users are processed one at a time and
//! a failure for one user is recorded without stopping the run.

use super::{
    budget::{BudgetFigures, SpendingBreakdown, money},
    prompt,
    summary::{PageScope, load_pages},
    user::get_weekly_report_recipients,
};
use crate::{
    ai::{AiResponse, SummaryGenerator},
    entities::user,
    errors::Result,
    mail::{MailTransport, WeeklyEmailData, weekly_report_mail},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

/// Length of the report window.
pub const REPORT_WINDOW_DAYS: i64 = 7;

/// Outcome of one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WeeklyReportResults {
    /// Users considered
    pub total: usize,
    /// E-mails sent
    pub success: usize,
    /// Users whose report failed
    pub failed: usize,
    /// One `Failed for <email>: <reason>` line per failure
    pub errors: Vec<String>,
}

/// Lays out an AI reply as the e-mail's analysis block.
#[must_use]
pub fn format_analysis(response: &AiResponse) -> String {
    let mut analysis = String::new();
    if !response.summary.is_empty() {
        analysis.push_str(&response.summary);
        analysis.push_str("\n\n");
    }
    if !response.insights.is_empty() {
        analysis.push_str("Key Insights:\n");
        for insight in &response.insights {
            analysis.push_str(&format!("• {insight}\n"));
        }
        analysis.push('\n');
    }
    if !response.recommendations.is_empty() {
        analysis.push_str("Recommendations:\n");
        for recommendation in &response.recommendations {
            analysis.push_str(&format!("• {recommendation}\n"));
        }
    }
    analysis.trim().to_string()
}

/// Analysis used when the AI call fails.
#[must_use]
pub fn fallback_analysis(settings: &user::UserSettings, breakdown: &SpendingBreakdown) -> String {
    let currency = settings.currency_symbol();
    let figures = BudgetFigures::from_settings(settings);
    let over = breakdown.total_spent - figures.weekly_budget > 0.0;

    let top_category = breakdown
        .categories_by_amount()
        .first()
        .map_or("N/A", |(name, _)| *name)
        .to_string();
    let closing = if over {
        "• ⚠️ Warning: You're currently overspending. Consider reducing discretionary expenses."
    } else {
        "• ✓ Great job staying within budget! Keep it up."
    };

    format!(
        "• You spent {total} this week ({over_under} budget).\n\
         • Your top spending category was {top_category}.\n\
         • To stay on track next week, aim to spend around {daily} per day.\n\
         {closing}",
        total = money(currency, breakdown.total_spent),
        over_under = if over { "over" } else { "under" },
        daily = money(currency, figures.weekly_budget / 7.0),
    )
}

/// Builds and sends the report for one user.
async fn send_report(
    db: &DatabaseConnection,
    generator: &SummaryGenerator,
    mailer: &dyn MailTransport,
    user: &user::Model,
    since: DateTime<Utc>,
) -> Result<()> {
    let pages = load_pages(db, user.id, PageScope::UpdatedSince(since)).await?;
    let breakdown = SpendingBreakdown::from_pages(&pages);
    let settings = &user.settings;
    let figures = BudgetFigures::from_settings(settings);

    let prompt = prompt::weekly_email_prompt(&user.name, settings, &breakdown);
    let ai_analysis = match generator.generate(user, &prompt, None).await {
        Ok(response) => format_analysis(&response),
        Err(e) => {
            warn!(user_id = user.id, "AI analysis failed, using fallback: {}", e);
            fallback_analysis(settings, &breakdown)
        }
    };

    let difference = breakdown.total_spent - figures.weekly_budget;
    let data = WeeklyEmailData {
        user_name: user.name.clone(),
        currency: settings.currency_symbol().to_string(),
        monthly_budget: figures.monthly_budget,
        fixed_expenses_total: figures.fixed_expenses_total,
        real_monthly_budget: figures.available_monthly_budget,
        weekly_budget: figures.weekly_budget,
        week_total: breakdown.total_spent,
        difference,
        is_over_budget: difference > 0.0,
        ai_analysis,
    };

    mailer.send(&weekly_report_mail(&user.email, &data)).await
}

/// Sends the weekly report to every opted-in user, covering pages updated in
/// the seven days before `now`.
#[instrument(skip(db, generator, mailer))]
pub async fn run_weekly_reports(
    db: &DatabaseConnection,
    generator: &SummaryGenerator,
    mailer: &dyn MailTransport,
    now: DateTime<Utc>,
) -> Result<WeeklyReportResults> {
    let recipients = get_weekly_report_recipients(db).await?;
    let since = now - Duration::days(REPORT_WINDOW_DAYS);
    info!("Processing weekly emails for {} users", recipients.len());

    let mut results = WeeklyReportResults {
        total: recipients.len(),
        ..Default::default()
    };

    for user in &recipients {
        match send_report(db, generator, mailer, user, since).await {
            Ok(()) => {
                results.success += 1;
                info!(user_id = user.id, "Sent weekly email");
            }
            Err(e) => {
                results.failed += 1;
                let message = format!("Failed for {}: {e}", user.email);
                error!("{}", message);
                results.errors.push(message);
            }
        }
    }

    Ok(results)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::ai::AiProvider;
    use crate::entities::page;
    use crate::test_utils::{
        RecordingAdapter, RecordingMailer, create_test_page_with_entries, create_test_user, entry,
        fixed_expense, settings_with_budget, setup_test_db, test_cipher,
    };
    use sea_orm::{ActiveModelTrait, Set};

    fn settings() -> user::UserSettings {
        let mut settings = settings_with_budget(2800.0);
        settings.fixed_expenses.push(fixed_expense("Rent", 800.0));
        settings
    }

    async fn opted_in(db: &DatabaseConnection, email: &str, with_key: bool) -> Result<user::Model> {
        let user = create_test_user(db, email).await?;
        let mut active: user::ActiveModel = user.clone().into();
        active.name = Set("Sam".to_string());
        active.weekly_reports_enabled = Set(true);
        active.settings = Set(settings());
        if with_key {
            let mut keys = user.ai_keys.clone();
            keys.openai = Some(test_cipher().encrypt("sk-test")?);
            active.ai_keys = Set(keys);
        }
        active.update(db).await.map_err(Into::into)
    }

    fn generator(adapter: std::sync::Arc<RecordingAdapter>) -> SummaryGenerator {
        SummaryGenerator::empty(test_cipher()).with_adapter(adapter)
    }

    #[test]
    fn test_format_analysis_sections() {
        let response = AiResponse {
            summary: "Good week".to_string(),
            insights: vec!["Food leads".to_string()],
            recommendations: vec!["Cook more".to_string(), "Walk".to_string()],
        };
        assert_eq!(
            format_analysis(&response),
            "Good week\n\nKey Insights:\n• Food leads\n\nRecommendations:\n• Cook more\n• Walk"
        );

        let only_summary = AiResponse {
            summary: "Quiet".to_string(),
            ..Default::default()
        };
        assert_eq!(format_analysis(&only_summary), "Quiet");
    }

    #[test]
    fn test_fallback_analysis_mentions_budget_pace() {
        let settings = settings();
        let mut days = page::Days::empty_week();
        days.0[0].entries.push(entry("Dinner", 600.0, "Food"));
        let breakdown = SpendingBreakdown::from_days(days.iter());

        let text = fallback_analysis(&settings, &breakdown);

        assert!(text.starts_with("• You spent ₹600.00 this week (over budget)."));
        assert!(text.contains("• Your top spending category was Food."));
        assert!(text.contains("aim to spend around ₹71.43 per day."));
        assert!(text.ends_with("Consider reducing discretionary expenses."));
    }

    #[tokio::test]
    async fn test_run_sends_to_opted_in_users_only() -> Result<()> {
        let db = setup_test_db().await?;
        let user = opted_in(&db, "weekly@example.com", true).await?;
        create_test_user(&db, "quiet@example.com").await?;
        create_test_page_with_entries(&db, user.id, vec![(1, entry("Groceries", 120.0, "Food"))])
            .await?;

        let adapter = RecordingAdapter::replying(
            AiProvider::OpenAi,
            r#"{"summary":"Steady","insights":["Food only"],"recommendations":["Keep going"]}"#,
        );
        let mailer = RecordingMailer::new();

        let ai = generator(adapter.clone());
        let results = run_weekly_reports(&db, &ai, &mailer, Utc::now()).await?;

        assert_eq!(
            results,
            WeeklyReportResults {
                total: 1,
                success: 1,
                failed: 0,
                errors: vec![],
            }
        );
        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "weekly@example.com");
        assert!(sent[0].text.contains("You Spent This Week: ₹120.00"));
        assert!(sent[0].text.contains("Steady\n\nKey Insights:\n• Food only"));
        let (_, _, prompt) = adapter.last_request().unwrap();
        assert!(prompt.contains("User: Sam"));
        Ok(())
    }

    #[tokio::test]
    async fn test_ai_failure_uses_fallback_text() -> Result<()> {
        let db = setup_test_db().await?;
        let user = opted_in(&db, "nokey@example.com", false).await?;
        create_test_page_with_entries(&db, user.id, vec![(2, entry("Books", 40.0, "Learning"))])
            .await?;
        let adapter = RecordingAdapter::replying(AiProvider::OpenAi, "{}");
        let mailer = RecordingMailer::new();

        let ai = generator(adapter.clone());
        let results = run_weekly_reports(&db, &ai, &mailer, Utc::now()).await?;

        assert_eq!(results.success, 1);
        assert_eq!(adapter.calls(), 0);
        let sent = mailer.sent();
        assert!(sent[0].text.contains("• Your top spending category was Learning."));
        assert!(sent[0].text.contains("✓ Great job staying within budget!"));
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_pages_are_outside_the_window() -> Result<()> {
        let db = setup_test_db().await?;
        let user = opted_in(&db, "stale@example.com", false).await?;
        create_test_page_with_entries(&db, user.id, vec![(3, entry("Old", 999.0, "Misc"))]).await?;
        let mailer = RecordingMailer::new();
        let later = Utc::now() + Duration::days(30);

        let results = run_weekly_reports(
            &db,
            &generator(RecordingAdapter::replying(AiProvider::OpenAi, "{}")),
            &mailer,
            later,
        )
        .await?;

        assert_eq!(results.success, 1);
        assert!(mailer.sent()[0].text.contains("You Spent This Week: ₹0.00"));
        Ok(())
    }

    #[tokio::test]
    async fn test_send_failure_is_counted_and_run_continues() -> Result<()> {
        let db = setup_test_db().await?;
        opted_in(&db, "bounce@example.com", false).await?;
        opted_in(&db, "ok@example.com", false).await?;
        let mailer = RecordingMailer::failing_for("bounce@example.com");

        let results = run_weekly_reports(
            &db,
            &generator(RecordingAdapter::replying(AiProvider::OpenAi, "{}")),
            &mailer,
            Utc::now(),
        )
        .await?;

        assert_eq!(results.total, 2);
        assert_eq!(results.success, 1);
        assert_eq!(results.failed, 1);
        assert!(results.errors[0].starts_with("Failed for bounce@example.com: "));
        assert_eq!(mailer.sent().len(), 1);
        assert_eq!(mailer.sent()[0].to, "ok@example.com");
        Ok(())
    }
}
