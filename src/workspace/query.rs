//! Canned database query filters for one report run.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};

/// Time boundaries for one run, computed once so that every query and the
/// rendered report agree on "now".
#[derive(Debug, Clone)]
pub struct ReportWindow {
    pub now: DateTime<Utc>,
    pub recent_cutoff: DateTime<Utc>,
    pub upcoming_cutoff: DateTime<Utc>,
}

impl ReportWindow {
    pub fn starting_at(now: DateTime<Utc>, recent_days: i64, upcoming_days: i64) -> Self {
        Self {
            now,
            recent_cutoff: now - Duration::days(recent_days),
            upcoming_cutoff: now + Duration::days(upcoming_days),
        }
    }

    pub fn current(recent_days: i64, upcoming_days: i64) -> Self {
        Self::starting_at(Utc::now(), recent_days, upcoming_days)
    }
}

/// Launches completed within the look-back window.
pub fn recent_releases_filter(window: &ReportWindow) -> Value {
    json!({
        "and": [
            { "property": "Status", "status": { "equals": "Completed" } },
            { "property": "Date", "date": { "after": window.recent_cutoff.to_rfc3339() } }
        ]
    })
}

/// Launches planned within the look-ahead window.
pub fn upcoming_releases_filter(window: &ReportWindow) -> Value {
    json!({
        "and": [
            { "or": [
                { "property": "Status", "status": { "equals": "Upcoming" } },
                { "property": "Status", "status": { "equals": "In Progress" } }
            ]},
            { "property": "Date", "date": { "after": window.now.to_rfc3339() } },
            { "property": "Date", "date": { "before": window.upcoming_cutoff.to_rfc3339() } }
        ]
    })
}

/// Bug-type tasks resolved within the look-back window. The task database
/// tags the kind with a plain select and the workflow state with a status
/// property, so the filter mixes both kinds.
pub fn resolved_bugs_filter(window: &ReportWindow) -> Value {
    json!({
        "and": [
            { "property": "Type", "select": { "equals": "Bug" } },
            { "property": "Status", "status": { "equals": "Done" } },
            { "property": "Done Date", "date": { "after": window.recent_cutoff.to_rfc3339() } }
        ]
    })
}

/// Union of the recent and upcoming filters; the matching release records
/// seed recipient resolution.
pub fn recipient_seed_filter(window: &ReportWindow) -> Value {
    json!({
        "or": [
            recent_releases_filter(window),
            upcoming_releases_filter(window)
        ]
    })
}
