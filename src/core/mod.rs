/// Clearing of operational logs
pub mod admin;
/// Pure aggregation helpers behind the dashboards
pub mod aggregate;
/// Community announcements
pub mod announcement;
/// Community chat
pub mod chat;
/// Complaint intake and status changes
pub mod complaint;
/// Live role dashboards
pub mod dashboard;
/// Emergency alerts
pub mod emergency;
/// Community fund ledger
pub mod fund;
/// Status transition rules
pub mod lifecycle;
/// Fan-in of live subscriptions into derived state
pub mod orchestrator;
/// Monthly maintenance payments
pub mod payment;
/// Caller identity and role checks
pub mod principal;
/// Resident and staff profiles
pub mod resident;
/// Visitor gate flow
pub mod visitor;
