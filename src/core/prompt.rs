//! Prompt text sent to the AI dispatcher.
//!
//! Prompts are deterministic: the same settings and breakdown always produce
//! the same text.

use super::budget::{BudgetFigures, SpendingBreakdown, day_name, money};
use crate::entities::user::UserSettings;

/// Entries listed under "Recent Entries" in the daily prompt.
const RECENT_ENTRY_LIMIT: usize = 10;

fn category_lines(currency: &str, breakdown: &SpendingBreakdown) -> String {
    breakdown
        .by_category
        .iter()
        .map(|(category, amount)| format!("- {category}: {}", money(currency, *amount)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn fixed_expense_summary(settings: &UserSettings) -> String {
    let currency = settings.currency_symbol();
    settings
        .fixed_expenses
        .iter()
        .map(|e| format!("{}: {currency}{}", e.title, e.amount))
        .collect::<Vec<_>>()
        .join(", ")
}

fn fixed_expense_detail(settings: &UserSettings) -> String {
    if settings.fixed_expenses.is_empty() {
        return "No fixed budgets set".to_string();
    }
    let currency = settings.currency_symbol();
    settings
        .fixed_expenses
        .iter()
        .map(|e| {
            let tags = if e.tags.is_empty() {
                "None".to_string()
            } else {
                e.tags.join(", ")
            };
            format!(
                "- **{}**: {}\n  Description: {}\n  Category: {}\n  Tags: {tags}",
                e.title,
                money(currency, e.amount),
                e.description.as_deref().filter(|d| !d.is_empty()).unwrap_or("N/A"),
                e.category.as_deref().filter(|c| !c.is_empty()).unwrap_or("N/A"),
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Daily prompt over every entry in scope.
#[must_use]
pub fn daily_prompt(settings: &UserSettings, breakdown: &SpendingBreakdown) -> String {
    let currency = settings.currency_symbol();
    let skip = breakdown.entries.len().saturating_sub(RECENT_ENTRY_LIMIT);
    let recent = breakdown.entries[skip..]
        .iter()
        .map(|e| format!("- {}: {} ({})", e.title, money(currency, e.amount), e.category))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "
Analyze this daily financial data:

Total Spent Today: {total}
Monthly Budget: {monthly}
Fixed Expenses: {fixed}

Spending by Category:
{categories}

Recent Entries:
{recent}

Please provide insights on spending patterns, warnings if over budget, and savings recommendations.
",
        total = money(currency, breakdown.total_spent),
        monthly = money(currency, settings.monthly_budget),
        fixed = fixed_expense_summary(settings),
        categories = category_lines(currency, breakdown),
    )
}

/// Daily prompt for one page slot compared with the two slots before it.
///
/// `days` holds `(slot, breakdown)` pairs, current slot first.
#[must_use]
pub fn daily_comparison_prompt(
    settings: &UserSettings,
    page_title: &str,
    days: &[(u8, SpendingBreakdown)],
) -> String {
    let currency = settings.currency_symbol();
    let figures = BudgetFigures::from_settings(settings);

    let day_sections = days
        .iter()
        .enumerate()
        .map(|(position, (slot, breakdown))| {
            let label = if position == 0 { "Today" } else { "Earlier" };
            let entries = if breakdown.is_empty() {
                "- No entries".to_string()
            } else {
                breakdown
                    .entries
                    .iter()
                    .map(|e| {
                        format!(
                            "- {}: {} ({})",
                            e.title,
                            money(currency, e.amount),
                            e.category
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            };
            format!(
                "{label} - Day {slot} ({}): {}\n{entries}",
                day_name(*slot),
                money(currency, breakdown.total_spent)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    let current = days.first().map(|(_, b)| b.clone()).unwrap_or_default();

    format!(
        "
Analyze this daily financial data for the page \"{page_title}\":

Total Spent Today: {total}
Daily Budget Target (Available Budget ÷ 30): {daily}
Monthly Budget: {monthly}
Fixed Expenses: {fixed}

Spending by Category (today):
{categories}

Last 3 Days:
{day_sections}

Please compare today's spending with the previous two days, point out any trend, warn if today is over the daily budget, and suggest savings.
",
        total = money(currency, current.total_spent),
        daily = money(currency, figures.daily_budget),
        monthly = money(currency, settings.monthly_budget),
        fixed = fixed_expense_summary(settings),
        categories = category_lines(currency, &current),
    )
}

/// Weekly prompt for the on-demand summary.
#[must_use]
pub fn weekly_prompt(settings: &UserSettings, breakdown: &SpendingBreakdown) -> String {
    let currency = settings.currency_symbol();
    let figures = BudgetFigures::from_settings(settings);

    let days = breakdown
        .by_day
        .iter()
        .map(|(day, amount)| format!("- Day {day}: {}", money(currency, *amount)))
        .collect::<Vec<_>>()
        .join("\n");
    let (top_day, top_day_amount) = breakdown
        .top_day()
        .map_or(("N/A".to_string(), 0.0), |(d, a)| (d.to_string(), a));
    let (top_category, top_category_amount) = breakdown
        .top_category()
        .map_or(("N/A".to_string(), 0.0), |(c, a)| (c.to_string(), a));

    format!(
        "
Analyze this weekly financial data:

Total Spent This Week: {total}
Monthly Budget (Total): {monthly}
Fixed Monthly Expenses Total: {fixed_total}
Available Monthly Budget (After Fixed Expenses): {available}
Weekly Budget Target (Available Budget ÷ 4): {weekly}

Fixed Monthly Budgets/Expenses (Detailed):
{fixed_detail}

Spending by Day:
{days}

Spending by Category:
{categories}

Highest Spending Day: Day {top_day} ({top_day_amount})
Top Category: {top_category} ({top_category_amount})

Number of Transactions: {count}

Please provide a comprehensive weekly analysis with:
1. Overall spending assessment
2. Pattern recognition across days
3. Category-wise insights comparing actual spending vs fixed budgets
4. Budget warnings if applicable (check against budget categories and tags)
5. Specific savings recommendations based on budget descriptions
6. Analysis of which budget categories are on track or exceeded
",
        total = money(currency, breakdown.total_spent),
        monthly = money(currency, figures.monthly_budget),
        fixed_total = money(currency, figures.fixed_expenses_total),
        available = money(currency, figures.available_monthly_budget),
        weekly = money(currency, figures.weekly_budget),
        fixed_detail = fixed_expense_detail(settings),
        categories = category_lines(currency, breakdown),
        top_day_amount = money(currency, top_day_amount),
        top_category_amount = money(currency, top_category_amount),
        count = breakdown.entry_count(),
    )
}

/// Prompt for the narrative section of the weekly e-mail.
#[must_use]
pub fn weekly_email_prompt(
    user_name: &str,
    settings: &UserSettings,
    breakdown: &SpendingBreakdown,
) -> String {
    let currency = settings.currency_symbol();
    let figures = BudgetFigures::from_settings(settings);
    let difference = breakdown.total_spent - figures.weekly_budget;
    let status = if difference > 0.0 {
        "Over budget by"
    } else {
        "Under budget by"
    };

    let categories = breakdown
        .categories_by_amount()
        .into_iter()
        .map(|(category, amount)| format!("- {category}: {}", money(currency, amount)))
        .collect::<Vec<_>>()
        .join("\n");
    let days = breakdown
        .by_day
        .iter()
        .map(|(day, amount)| format!("- {}: {}", day_name(*day), money(currency, *amount)))
        .collect::<Vec<_>>()
        .join("\n");
    let (top_day, top_amount) = breakdown
        .top_day()
        .map_or(("N/A".to_string(), 0.0), |(d, a)| (day_name(d), a));

    format!(
        "
Analyze this weekly financial data and provide insights:

User: {user_name}
Monthly Budget: {monthly}
Fixed Expenses: {fixed}
Real Monthly Budget: {available}
Weekly Budget: {weekly}

This Week's Spending: {total}
Status: {status} {difference}

Category Breakdown:
{categories}

Daily Breakdown:
{days}

Top Spending Day: {top_day} ({top_amount})
Average Daily Spending: {average}

Please provide a brief weekly analysis including:
- Spending patterns and observations
- Warnings if overspending detected
- How much the user should spend per day next week to stay on track
- Predicted budget status for next week
- Any alerts or recommendations

Keep the response concise and actionable (4-6 bullet points).
",
        monthly = money(currency, figures.monthly_budget),
        fixed = money(currency, figures.fixed_expenses_total),
        available = money(currency, figures.available_monthly_budget),
        weekly = money(currency, figures.weekly_budget),
        total = money(currency, breakdown.total_spent),
        difference = money(currency, difference.abs()),
        top_amount = money(currency, top_amount),
        average = money(currency, breakdown.average_daily_spending()),
    )
}
