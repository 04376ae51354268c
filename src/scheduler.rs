//! In-process trigger for the weekly report.
//!
//! Deployments with an external cron call `GET /api/cron/weekly-email`
//! instead; both paths run [`run_weekly_reports`].

use crate::{
    api::AppState,
    core::weekly_report::run_weekly_reports,
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use cron::Schedule;
use std::time::Duration;
use tracing::{error, info};

const WEEKDAY_NAMES: [&str; 8] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

/// Rewrites numeric weekdays (0 or 7 = Sunday .. 6 = Saturday) as names. The
/// cron crate numbers weekdays from 1 = Sunday, so numbers are never passed
/// through. Step values after `/` are left alone.
fn weekday_field_to_names(field: &str) -> String {
    let name = |token: &str| match token.parse::<usize>() {
        Ok(day) if day < WEEKDAY_NAMES.len() => WEEKDAY_NAMES[day].to_string(),
        _ => token.to_string(),
    };

    field
        .split(',')
        .map(|item| {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };
            let range = range.split('-').map(name).collect::<Vec<_>>().join("-");
            match step {
                Some(step) => format!("{range}/{step}"),
                None => range,
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

/// Parses a five-field cron expression (minute hour day month weekday, UTC).
/// Weekdays may be names or the usual numbers, 0 or 7 for Sunday.
pub fn parse_schedule(expr: &str) -> Result<Schedule> {
    let fields: Vec<&str> = expr.split_whitespace().collect();
    let [minute, hour, day, month, weekday] = fields.as_slice() else {
        return Err(Error::Config {
            message: format!(
                "Invalid cron expression '{expr}': expected 5 fields, got {}",
                fields.len()
            ),
        });
    };

    // The cron crate wants a leading seconds field
    let full_expr = format!(
        "0 {minute} {hour} {day} {month} {}",
        weekday_field_to_names(weekday)
    );

    full_expr.parse::<Schedule>().map_err(|e| Error::Config {
        message: format!("Invalid cron expression '{expr}': {e}"),
    })
}

/// First scheduled instant strictly after `after`.
pub fn next_run_after(schedule: &Schedule, after: DateTime<Utc>) -> Result<DateTime<Utc>> {
    schedule.after(&after).next().ok_or_else(|| Error::Config {
        message: "No upcoming scheduled time".to_string(),
    })
}

/// Sleeps until each scheduled instant and runs the weekly report. Runs until
/// the schedule is exhausted.
pub async fn run_weekly_schedule(schedule: Schedule, state: AppState) {
    loop {
        let now = Utc::now();
        let next = match next_run_after(&schedule, now) {
            Ok(next) => next,
            Err(e) => {
                error!("Weekly report scheduler stopping: {}", e);
                return;
            }
        };
        info!(next_run = %next, "Weekly report scheduled");

        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tokio::time::sleep(wait).await;

        let run = run_weekly_reports(
            &state.db,
            &state.generator,
            state.mailer.as_ref(),
            Utc::now(),
        );
        match run.await {
            Ok(results) => info!(
                total = results.total,
                success = results.success,
                failed = results.failed,
                "Weekly emails processed"
            ),
            Err(e) => error!("Weekly report run failed: {}", e),
        }
    }
}
