//! Budget and spending calculations.
//!
//! Everything here is pure: callers pass a settings snapshot and the day slots
//! in scope, and get plain numbers back. No rounding is applied; formatting to
//! two decimals happens only when text is rendered.

use crate::entities::{page, user::UserSettings};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Category label for entries with no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Weeks per month used to derive the weekly target.
const WEEKS_PER_MONTH: f64 = 4.0;
/// Days per month used to derive the daily target.
const DAYS_PER_MONTH: f64 = 30.0;
/// Days per week used for the average.
const DAYS_PER_WEEK: f64 = 7.0;

/// Which stored summary a computation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryKind {
    /// One summary per calendar day
    Daily,
    /// One summary per week, keyed by the week-start Sunday
    Weekly,
}

impl SummaryKind {
    /// Name stored in the `kind` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
        }
    }

    /// Number of summaries returned by the list routes when no limit is given.
    #[must_use]
    pub const fn default_list_limit(self) -> u64 {
        match self {
            Self::Daily => 7,
            Self::Weekly => 4,
        }
    }
}

impl fmt::Display for SummaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget targets derived from a user's settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BudgetFigures {
    /// Nominal monthly budget
    pub monthly_budget: f64,
    /// Sum of all fixed expenses
    pub fixed_expenses_total: f64,
    /// Monthly budget minus fixed expenses, may be negative
    pub available_monthly_budget: f64,
    /// Available budget divided by four
    pub weekly_budget: f64,
    /// Available budget divided by thirty
    pub daily_budget: f64,
}

impl BudgetFigures {
    /// Derives the figures from a settings snapshot.
    #[must_use]
    pub fn from_settings(settings: &UserSettings) -> Self {
        let fixed_expenses_total: f64 = settings.fixed_expenses.iter().map(|e| e.amount).sum();
        let available_monthly_budget = settings.monthly_budget - fixed_expenses_total;

        Self {
            monthly_budget: settings.monthly_budget,
            fixed_expenses_total,
            available_monthly_budget,
            weekly_budget: available_monthly_budget / WEEKS_PER_MONTH,
            daily_budget: available_monthly_budget / DAYS_PER_MONTH,
        }
    }

    /// The target a total is compared against for `kind`.
    #[must_use]
    pub const fn target(&self, kind: SummaryKind) -> f64 {
        match kind {
            SummaryKind::Daily => self.daily_budget,
            SummaryKind::Weekly => self.weekly_budget,
        }
    }

    /// True when `total_spent` strictly exceeds the target for `kind`.
    #[must_use]
    pub fn is_over_budget(&self, total_spent: f64, kind: SummaryKind) -> bool {
        total_spent > self.target(kind)
    }
}

/// One entry flattened out of its page and day.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryLine {
    /// Entry title
    pub title: String,
    /// Entry amount
    pub amount: f64,
    /// Category, [`UNCATEGORIZED`] when blank
    pub category: String,
    /// Slot the entry was recorded in
    pub day_index: u8,
}

/// Totals over a set of day slots.
///
/// Category and day totals keep first-encountered order, which is also the
/// tie-break order for [`SpendingBreakdown::top_category`] and
/// [`SpendingBreakdown::top_day`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendingBreakdown {
    /// Sum of every entry amount
    pub total_spent: f64,
    /// Category totals
    pub by_category: Vec<(String, f64)>,
    /// Totals per day slot, only slots that hold entries
    pub by_day: Vec<(u8, f64)>,
    /// Every entry in scope, in page then day order
    pub entries: Vec<EntryLine>,
}

impl SpendingBreakdown {
    /// Aggregates the given day slots.
    pub fn from_days<'a, I>(days: I) -> Self
    where
        I: IntoIterator<Item = &'a page::Day>,
    {
        let mut breakdown = Self::default();
        for day in days {
            for entry in &day.entries {
                breakdown.add(day.day_index, entry);
            }
        }
        breakdown
    }

    /// Aggregates every day slot of every page.
    #[must_use]
    pub fn from_pages(pages: &[page::Model]) -> Self {
        Self::from_days(pages.iter().flat_map(|p| p.days.iter()))
    }

    fn add(&mut self, day_index: u8, entry: &page::Entry) {
        let category = if entry.category.is_empty() {
            UNCATEGORIZED.to_string()
        } else {
            entry.category.clone()
        };

        self.total_spent += entry.amount;
        accumulate(&mut self.by_category, category.clone(), entry.amount);
        accumulate(&mut self.by_day, day_index, entry.amount);
        self.entries.push(EntryLine {
            title: entry.title.clone(),
            amount: entry.amount,
            category,
            day_index,
        });
    }

    /// Number of entries in scope.
    #[must_use]
    pub const fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are in scope.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total divided by seven, whatever the scope.
    #[must_use]
    pub fn average_daily_spending(&self) -> f64 {
        self.total_spent / DAYS_PER_WEEK
    }

    /// Category with the highest total.
    #[must_use]
    pub fn top_category(&self) -> Option<(&str, f64)> {
        arg_max(&self.by_category).map(|(name, amount)| (name.as_str(), amount))
    }

    /// Day slot with the highest total.
    #[must_use]
    pub fn top_day(&self) -> Option<(u8, f64)> {
        arg_max(&self.by_day).map(|(day, amount)| (*day, amount))
    }

    /// Category totals, largest first. Equal totals keep insertion order.
    #[must_use]
    pub fn categories_by_amount(&self) -> Vec<(&str, f64)> {
        let mut sorted: Vec<(&str, f64)> = self
            .by_category
            .iter()
            .map(|(name, amount)| (name.as_str(), *amount))
            .collect();
        sorted.sort_by(|a, b| b.1.total_cmp(&a.1));
        sorted
    }
}

fn accumulate<K: PartialEq>(totals: &mut Vec<(K, f64)>, key: K, amount: f64) {
    match totals.iter_mut().find(|(k, _)| *k == key) {
        Some((_, total)) => *total += amount,
        None => totals.push((key, amount)),
    }
}

fn arg_max<K>(totals: &[(K, f64)]) -> Option<(&K, f64)> {
    let mut best: Option<(&K, f64)> = None;
    for (key, amount) in totals {
        if best.is_none_or(|(_, top)| *amount > top) {
            best = Some((key, *amount));
        }
    }
    best
}

/// The slot itself and the two slots before it, wrapping Monday back to Sunday.
///
/// Uses `(day_index - i + 7) mod 7` for `i` in `0..3`, with a result of `0`
/// meaning slot 7. Accepts `0` as an alias for slot 7.
#[must_use]
pub const fn comparison_day_indices(day_index: u8) -> [u8; 3] {
    let mut out = [0u8; 3];
    let mut i = 0;
    while i < 3 {
        let slot = (day_index % 7 + 7 - i as u8) % 7;
        out[i] = if slot == 0 { 7 } else { slot };
        i += 1;
    }
    out
}

/// Weekday name for a slot, 1 = Monday .. 7 = Sunday.
#[must_use]
pub fn day_name(day_index: u8) -> String {
    const NAMES: [&str; 7] = [
        "Monday",
        "Tuesday",
        "Wednesday",
        "Thursday",
        "Friday",
        "Saturday",
        "Sunday",
    ];
    match day_index {
        1..=7 => NAMES[usize::from(day_index - 1)].to_string(),
        other => format!("Day {other}"),
    }
}

/// `<symbol><amount with two decimals>`
#[must_use]
pub fn money(currency: &str, amount: f64) -> String {
    format!("{currency}{amount:.2}")
}
