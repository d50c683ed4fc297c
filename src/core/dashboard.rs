//! Role dashboards.
//!
//! Each dashboard composes the live subscriptions it needs through
//! [`orchestrator::compose`] and folds them with a pure `summarize_*` reducer.
//! The reducers are public so they can be exercised on hand-built snapshots.

use crate::{
    config::settings::Settings,
    core::{
        aggregate::{
            self, ElapsedTime, FinancialSummary, MonthBucket, count_active, count_by_status,
            current_month, duration_between, financial_summary, monthly_buckets,
            recent_count_capped, within_window,
        },
        announcement::latest_announcements,
        complaint::{all_complaints, complaints_raised_by},
        emergency::{active_emergencies, all_emergencies},
        fund::fund_ledger,
        orchestrator::{self, Composed},
        payment::{self, due_date, payments_for_user},
        principal::Principal,
        resident::{get_resident, residents_query},
        visitor::{all_visitors, visitors_for_apartment},
    },
    entities::{
        Payment, announcement,
        complaint::{self, ComplaintStatus},
        emergency::{self, EmergencyStatus},
        fund_entry,
        payment::PaymentStatus,
        resident,
        visitor::{self, VisitorStatus},
    },
    errors::{Error, Result},
    store::{Collection, Store},
};
use chrono::{DateTime, Utc};
use sea_orm::EntityTrait;
use serde::Serialize;
use std::{collections::BTreeMap, fmt::Write};
use tracing::info;

/// Latest snapshot held in one orchestrator slot.
#[derive(Debug, Clone, Default)]
pub enum Snapshot {
    /// Nothing delivered yet
    #[default]
    Pending,
    Complaints(Vec<complaint::Model>),
    Visitors(Vec<visitor::Model>),
    Emergencies(Vec<emergency::Model>),
    Payments(Vec<crate::entities::payment::Model>),
    Funds(Vec<fund_entry::Model>),
    Announcements(Vec<announcement::Model>),
    Residents(Vec<resident::Model>),
}

macro_rules! slot_accessor {
    ($name:ident, $variant:ident, $model:ty) => {
        /// Documents of this kind across the slots; empty until delivered.
        #[must_use]
        pub fn $name(slots: &[Self]) -> &[$model] {
            slots
                .iter()
                .find_map(|slot| match slot {
                    Self::$variant(docs) => Some(docs.as_slice()),
                    _ => None,
                })
                .unwrap_or(&[])
        }
    };
}

impl Snapshot {
    slot_accessor!(complaints, Complaints, complaint::Model);
    slot_accessor!(visitors, Visitors, visitor::Model);
    slot_accessor!(emergencies, Emergencies, emergency::Model);
    slot_accessor!(payments, Payments, crate::entities::payment::Model);
    slot_accessor!(funds, Funds, fund_entry::Model);
    slot_accessor!(announcements, Announcements, announcement::Model);
    slot_accessor!(residents, Residents, resident::Model);
}

/// Derived state for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOverview {
    pub community: String,
    pub complaints_by_status: BTreeMap<ComplaintStatus, usize>,
    pub total_complaints: usize,
    pub average_resolution: Option<ElapsedTime>,
    pub active_emergencies: usize,
    pub visitors_inside: usize,
    pub visitors_expected: usize,
    pub funds: FinancialSummary,
    pub fund_chart: Vec<MonthBucket>,
    pub month: String,
    pub payments_paid: usize,
    pub payments_due: usize,
    pub collected: f64,
    /// Maintenance still owed this month at the configured rate
    pub outstanding: f64,
    pub recent_announcements: usize,
    pub generated_at: DateTime<Utc>,
}

/// Folds the admin slots into an [`AdminOverview`].
#[must_use]
pub fn summarize_admin(
    slots: &[Snapshot],
    settings: &Settings,
    now: DateTime<Utc>,
) -> AdminOverview {
    let complaints = Snapshot::complaints(slots);
    let visitors = Snapshot::visitors(slots);
    let month = current_month(now);
    let roster = payment::payment_roster(
        Snapshot::residents(slots),
        Snapshot::payments(slots),
        &month,
    );

    AdminOverview {
        community: settings.community.name.clone(),
        complaints_by_status: count_by_status(complaints),
        total_complaints: complaints.len(),
        average_resolution: aggregate::average_resolution(complaints),
        active_emergencies: count_active(
            Snapshot::emergencies(slots),
            EmergencyStatus::Active,
            |_| true,
        ),
        visitors_inside: count_active(visitors, VisitorStatus::Inside, |_| true),
        visitors_expected: count_active(visitors, VisitorStatus::Preapproved, |_| true),
        funds: financial_summary(Snapshot::funds(slots)),
        fund_chart: monthly_buckets(Snapshot::funds(slots), settings.dashboard.chart_months),
        month,
        payments_paid: roster.paid,
        payments_due: roster.due,
        collected: roster.collected,
        outstanding: f64::from(u32::try_from(roster.due).unwrap_or(u32::MAX))
            * settings.community.maintenance_amount,
        recent_announcements: recent_count_capped(
            Snapshot::announcements(slots),
            settings.recent_window(),
            now,
            settings.dashboard.recent_announcement_cap,
        ),
        generated_at: now,
    }
}

/// Live admin dashboard.
///
/// # Panics
/// If called outside a Tokio runtime: each source spawns its subscription task
/// as soon as it is composed.
#[must_use]
pub fn admin_overview(store: &Store, settings: &Settings) -> Composed<AdminOverview> {
    let sources = vec![
        store.subscribe(Collection::Complaints, all_complaints(), Snapshot::Complaints),
        store.subscribe(Collection::Visitors, all_visitors(), Snapshot::Visitors),
        store.subscribe(Collection::Emergencies, all_emergencies(), Snapshot::Emergencies),
        store.subscribe(Collection::Funds, fund_ledger(), Snapshot::Funds),
        store.subscribe(Collection::Payments, Payment::find(), Snapshot::Payments),
        store.subscribe(Collection::Residents, residents_query(), Snapshot::Residents),
        store.subscribe(Collection::Announcements, latest_announcements(), Snapshot::Announcements),
    ];
    let settings = settings.clone();
    orchestrator::compose(sources, move |slots| summarize_admin(slots, &settings, Utc::now()))
}

/// Derived state for a resident's dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResidentOverview {
    pub my_complaints: BTreeMap<ComplaintStatus, usize>,
    pub my_active_emergencies: usize,
    /// Active alerts anywhere in the community
    pub community_alerts: usize,
    pub expected_visitors: usize,
    pub visitors_inside: usize,
    pub month: String,
    pub payment_status: PaymentStatus,
    pub due_date: String,
    pub recent_announcements: usize,
}

/// Folds a resident's slots into a [`ResidentOverview`].
#[must_use]
pub fn summarize_resident(
    slots: &[Snapshot],
    user_id: &str,
    settings: &Settings,
    now: DateTime<Utc>,
) -> ResidentOverview {
    let visitors = Snapshot::visitors(slots);
    let emergencies = Snapshot::emergencies(slots);
    let month = current_month(now);

    ResidentOverview {
        my_complaints: count_by_status(Snapshot::complaints(slots)),
        my_active_emergencies: count_active(emergencies, EmergencyStatus::Active, |e| {
            e.raised_by == user_id
        }),
        community_alerts: count_active(emergencies, EmergencyStatus::Active, |_| true),
        expected_visitors: count_active(visitors, VisitorStatus::Preapproved, |_| true),
        visitors_inside: count_active(visitors, VisitorStatus::Inside, |_| true),
        payment_status: payment::status_for(Snapshot::payments(slots), user_id, &month),
        due_date: due_date(&month, settings.community.due_day),
        month,
        recent_announcements: recent_count_capped(
            Snapshot::announcements(slots),
            settings.recent_window(),
            now,
            settings.dashboard.recent_announcement_cap,
        ),
    }
}

/// Live dashboard for the resident behind `principal`.
pub async fn resident_overview(
    store: &Store,
    principal: &Principal,
    settings: &Settings,
) -> Result<Composed<ResidentOverview>> {
    let profile = get_resident(store, &principal.id)
        .await?
        .ok_or_else(|| Error::NotFound {
            collection: Collection::Residents,
            id: principal.id.clone(),
        })?;
    info!(
        resident = %profile.id,
        apartment = %profile.apartment_number,
        "Composing resident dashboard"
    );

    let sources = vec![
        store.subscribe(
            Collection::Complaints,
            complaints_raised_by(&profile.id),
            Snapshot::Complaints,
        ),
        store.subscribe(Collection::Emergencies, all_emergencies(), Snapshot::Emergencies),
        store.subscribe(
            Collection::Visitors,
            visitors_for_apartment(&profile.apartment_number),
            Snapshot::Visitors,
        ),
        store.subscribe(Collection::Payments, payments_for_user(&profile.id), Snapshot::Payments),
        store.subscribe(Collection::Announcements, latest_announcements(), Snapshot::Announcements),
    ];
    let settings = settings.clone();
    let user_id = profile.id;
    Ok(orchestrator::compose(sources, move |slots| {
        summarize_resident(slots, &user_id, &settings, Utc::now())
    }))
}

/// Derived state for the security desk.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SecurityOverview {
    pub visitors_inside: usize,
    pub visitors_expected: usize,
    pub exited_recently: usize,
    pub rejected_recently: usize,
    /// Longest time any visitor currently inside has been on the premises
    pub longest_stay: Option<ElapsedTime>,
    pub active_emergencies: usize,
}

/// Folds the security slots into a [`SecurityOverview`].
#[must_use]
pub fn summarize_security(
    slots: &[Snapshot],
    settings: &Settings,
    now: DateTime<Utc>,
) -> SecurityOverview {
    let visitors = Snapshot::visitors(slots);
    let window = settings.recent_window();
    let recently = |at: Option<DateTime<Utc>>| at.is_some_and(|at| within_window(at, window, now));

    SecurityOverview {
        visitors_inside: count_active(visitors, VisitorStatus::Inside, |_| true),
        visitors_expected: count_active(visitors, VisitorStatus::Preapproved, |_| true),
        exited_recently: count_active(visitors, VisitorStatus::Exited, |v| recently(v.exit_time)),
        rejected_recently: count_active(visitors, VisitorStatus::Rejected, |v| {
            recently(v.rejected_at)
        }),
        longest_stay: visitors
            .iter()
            .filter(|v| v.status == VisitorStatus::Inside)
            .filter_map(|v| duration_between(v.entry_time, Some(now)))
            .max_by_key(|e| (e.days, e.hours, e.minutes)),
        active_emergencies: count_active(
            Snapshot::emergencies(slots),
            EmergencyStatus::Active,
            |_| true,
        ),
    }
}

/// Live dashboard for the security desk.
///
/// # Panics
/// If called outside a Tokio runtime: each source spawns its subscription task
/// as soon as it is composed.
#[must_use]
pub fn security_overview(store: &Store, settings: &Settings) -> Composed<SecurityOverview> {
    let sources = vec![
        store.subscribe(Collection::Visitors, all_visitors(), Snapshot::Visitors),
        store.subscribe(Collection::Emergencies, active_emergencies(), Snapshot::Emergencies),
    ];
    let settings = settings.clone();
    orchestrator::compose(sources, move |slots| summarize_security(slots, &settings, Utc::now()))
}

/// Plain-text rendering of an admin overview, for logs and terminals.
#[must_use]
pub fn format_admin_summary(overview: &AdminOverview) -> String {
    let mut summary = format!(
        "{} - {}\n",
        overview.community,
        overview.generated_at.format("%d %B %Y %H:%M")
    );

    let status_line = [
        ComplaintStatus::Pending,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
    ]
    .iter()
    .map(|status| {
        let count = overview.complaints_by_status.get(status).copied().unwrap_or(0);
        format!("{status}: {count}")
    })
    .collect::<Vec<_>>()
    .join(" | ");

    // Writing to a String cannot fail
    let _ = writeln!(
        summary,
        "  Complaints: {} ({status_line}) | Avg resolution: {}",
        overview.total_complaints,
        aggregate::format_elapsed(overview.average_resolution)
    );
    let _ = writeln!(
        summary,
        "  Emergencies active: {} | Visitors inside: {} | Expected: {}",
        overview.active_emergencies, overview.visitors_inside, overview.visitors_expected
    );
    let _ = writeln!(
        summary,
        "  Funds: income ${:.2} | expense ${:.2} | balance ${:.2}",
        overview.funds.income, overview.funds.expense, overview.funds.balance
    );
    for bucket in &overview.fund_chart {
        let _ = writeln!(
            summary,
            "    {} +${:.2} -${:.2}",
            bucket.month, bucket.income, bucket.expense
        );
    }
    let _ = writeln!(
        summary,
        "  Maintenance {}: {} paid, {} due, ${:.2} collected, ${:.2} outstanding",
        overview.month,
        overview.payments_paid,
        overview.payments_due,
        overview.collected,
        overview.outstanding
    );
    let _ = writeln!(summary, "  Recent announcements: {}", overview.recent_announcements);

    summary
}
