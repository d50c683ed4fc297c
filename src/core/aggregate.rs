//! Read-side aggregation.
//!
//! Pure reducers over an in-memory snapshot of one collection: counts by status,
//! fund totals, month buckets for the fund chart, elapsed times and recency
//! windows. None of these functions perform I/O or mutate their input.

use crate::entities::{
    announcement, chat_message, complaint, emergency, fund_entry, payment, visitor,
    fund_entry::FundKind,
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Bucket key used for fund entries without a month.
pub const UNKNOWN_MONTH: &str = "Unknown";

/// Display text for an elapsed time that cannot be computed.
pub const UNAVAILABLE: &str = "—";

/// Documents with a status column.
pub trait HasStatus {
    type Status: Copy + Ord;

    fn status(&self) -> Self::Status;
}

/// Documents with a creation timestamp.
pub trait Timestamped {
    fn created_at(&self) -> DateTime<Utc>;
}

macro_rules! impl_has_status {
    ($($model:ty => $status:ty),* $(,)?) => {
        $(impl HasStatus for $model {
            type Status = $status;

            fn status(&self) -> Self::Status {
                self.status
            }
        })*
    };
}

impl_has_status! {
    complaint::Model => complaint::ComplaintStatus,
    visitor::Model => visitor::VisitorStatus,
    emergency::Model => emergency::EmergencyStatus,
    payment::Model => payment::PaymentStatus,
}

macro_rules! impl_timestamped {
    ($($model:ty),* $(,)?) => {
        $(impl Timestamped for $model {
            fn created_at(&self) -> DateTime<Utc> {
                self.created_at
            }
        })*
    };
}

impl_timestamped!(
    complaint::Model,
    visitor::Model,
    emergency::Model,
    fund_entry::Model,
    announcement::Model,
    chat_message::Model,
);

/// Number of documents per status. Statuses with no documents are absent.
pub fn count_by_status<T: HasStatus>(entities: &[T]) -> BTreeMap<T::Status, usize> {
    entities.iter().fold(BTreeMap::new(), |mut counts, entity| {
        *counts.entry(entity.status()).or_insert(0) += 1;
        counts
    })
}

/// Number of documents in `status` that also satisfy `predicate`, e.g. the
/// active emergencies raised by one resident.
pub fn count_active<T, P>(entities: &[T], status: T::Status, predicate: P) -> usize
where
    T: HasStatus,
    P: Fn(&T) -> bool,
{
    entities
        .iter()
        .filter(|entity| entity.status() == status && predicate(entity))
        .count()
}

/// Reads a submitted amount as a number. Numeric strings are parsed; anything
/// else (missing, non-numeric, non-finite) counts as zero.
#[must_use]
pub fn coerce_amount(amount: &Value) -> f64 {
    let parsed = match amount {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|value| value.is_finite()).unwrap_or(0.0)
}

/// Income, expense and balance across a set of fund entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct FinancialSummary {
    pub income: f64,
    pub expense: f64,
    pub balance: f64,
}

/// Totals every entry by its kind.
#[must_use]
pub fn financial_summary(entries: &[fund_entry::Model]) -> FinancialSummary {
    let (income, expense) =
        entries
            .iter()
            .fold((0.0, 0.0), |(income, expense), entry| match entry.kind {
                FundKind::Income => (income + coerce_amount(&entry.amount), expense),
                FundKind::Expense => (income, expense + coerce_amount(&entry.amount)),
            });

    FinancialSummary {
        income,
        expense,
        balance: income - expense,
    }
}

/// Income and expense for one ledger month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub month: String,
    pub income: f64,
    pub expense: f64,
}

/// Groups entries by their `month` field (not by creation time), sorted
/// ascending by month key, keeping only the `limit` most recent buckets.
///
/// Entries without a month land in [`UNKNOWN_MONTH`], which sorts after every
/// `YYYY-MM` key.
#[must_use]
pub fn monthly_buckets(entries: &[fund_entry::Model], limit: usize) -> Vec<MonthBucket> {
    let mut months: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for entry in entries {
        let key = entry.month.as_deref().unwrap_or(UNKNOWN_MONTH);
        let totals = months.entry(key).or_insert((0.0, 0.0));
        match entry.kind {
            FundKind::Income => totals.0 += coerce_amount(&entry.amount),
            FundKind::Expense => totals.1 += coerce_amount(&entry.amount),
        }
    }

    let skip = months.len().saturating_sub(limit);
    months
        .into_iter()
        .skip(skip)
        .map(|(month, (income, expense))| MonthBucket {
            month: month.to_string(),
            income,
            expense,
        })
        .collect()
}

/// Elapsed time split for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ElapsedTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl ElapsedTime {
    /// Splits a duration, clamping negatives to zero.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        let total = duration.num_minutes().max(0);
        Self {
            days: total / (24 * 60),
            hours: (total / 60) % 24,
            minutes: total % 60,
        }
    }
}

impl fmt::Display for ElapsedTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.days > 0 {
            write!(f, "{}d {}h {}m", self.days, self.hours, self.minutes)
        } else if self.hours > 0 {
            write!(f, "{}h {}m", self.hours, self.minutes)
        } else {
            write!(f, "{}m", self.minutes)
        }
    }
}

/// Time from `start` to `end`, or `None` when either end is unknown. An `end`
/// earlier than `start` yields zero.
#[must_use]
pub fn duration_between(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
) -> Option<ElapsedTime> {
    match (start, end) {
        (Some(start), Some(end)) => Some(ElapsedTime::from_duration(end - start)),
        _ => None,
    }
}

/// Display form of an optional elapsed time.
#[must_use]
pub fn format_elapsed(elapsed: Option<ElapsedTime>) -> String {
    elapsed.map_or_else(|| UNAVAILABLE.to_string(), |e| e.to_string())
}

/// Mean time from creation to resolution over the resolved complaints.
#[must_use]
pub fn average_resolution(complaints: &[complaint::Model]) -> Option<ElapsedTime> {
    let minutes: Vec<i64> = complaints
        .iter()
        .filter(|c| c.status == complaint::ComplaintStatus::Resolved)
        .filter_map(|c| c.resolved_at.map(|at| (at - c.created_at).num_minutes().max(0)))
        .collect();

    if minutes.is_empty() {
        return None;
    }

    let count = i64::try_from(minutes.len()).unwrap_or(i64::MAX);
    let mean = minutes.iter().sum::<i64>() / count;
    Some(ElapsedTime::from_duration(Duration::minutes(mean)))
}

/// Whether `at` falls inside the trailing `window` ending at `reference`.
#[must_use]
pub fn within_window(at: DateTime<Utc>, window: Duration, reference: DateTime<Utc>) -> bool {
    at <= reference && reference - at <= window
}

/// Number of documents created inside the trailing window.
pub fn recent_count<T: Timestamped>(
    entities: &[T],
    window: Duration,
    reference: DateTime<Utc>,
) -> usize {
    entities
        .iter()
        .filter(|entity| within_window(entity.created_at(), window, reference))
        .count()
}

/// Recent count clamped to a display cap.
pub fn recent_count_capped<T: Timestamped>(
    entities: &[T],
    window: Duration,
    reference: DateTime<Utc>,
    cap: usize,
) -> usize {
    recent_count(entities, window, reference).min(cap)
}

/// `YYYY-MM` key for the month containing `now`.
#[must_use]
pub fn current_month(now: DateTime<Utc>) -> String {
    now.format("%Y-%m").to_string()
}
