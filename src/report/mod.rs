//! One report run: fetch, normalize, render, deliver.
//!
//! Steps are strictly sequential. A failed query degrades to an empty
//! section (the report still goes out); a failed send is fatal.

pub mod extract;
pub mod recipients;
pub mod render;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::config::Config;
use crate::mailer::Mailer;
use crate::workspace::query::{
    recent_releases_filter, recipient_seed_filter, resolved_bugs_filter,
    upcoming_releases_filter, ReportWindow,
};
use crate::workspace::{Page, WorkspaceClient};

pub async fn run(config: &Config, dry_run: bool) -> Result<()> {
    let window = ReportWindow::current(config.report.recent_days, config.report.upcoming_days);
    tracing::info!(
        recent_cutoff = %window.recent_cutoff,
        upcoming_cutoff = %window.upcoming_cutoff,
        "Starting report run"
    );

    let client = WorkspaceClient::new(&config.workspace)?;
    let releases_db = config
        .workspace
        .releases_db
        .as_deref()
        .context("Releases database id not configured")?;
    let tasks_db = config
        .workspace
        .tasks_db
        .as_deref()
        .context("Tasks database id not configured")?;

    let recent_pages = fetch_or_empty(
        &client,
        releases_db,
        recent_releases_filter(&window),
        "recent launches",
    )
    .await;
    let upcoming_pages = fetch_or_empty(
        &client,
        releases_db,
        upcoming_releases_filter(&window),
        "upcoming launches",
    )
    .await;
    let bug_pages = fetch_or_empty(
        &client,
        tasks_db,
        resolved_bugs_filter(&window),
        "bug fixes",
    )
    .await;

    let recent: Vec<_> = recent_pages.iter().map(extract::normalize_release).collect();
    let upcoming: Vec<_> = upcoming_pages.iter().map(extract::normalize_release).collect();
    let bugs: Vec<_> = bug_pages.iter().map(extract::normalize_task).collect();

    let content = render::render_report(
        &recent,
        &upcoming,
        &bugs,
        window.now,
        &config.signature_html(),
    );

    if dry_run {
        tracing::info!("Dry run, printing report instead of sending");
        println!("{}", content.html);
        return Ok(());
    }

    let seed_pages = fetch_or_empty(
        &client,
        releases_db,
        recipient_seed_filter(&window),
        "recipient seeds",
    )
    .await;
    let recipients = recipients::resolve(
        &seed_pages,
        &config.report.fallback_to,
        &config.report.fallback_cc,
    );

    if recipients.is_empty() {
        tracing::warn!("No recipients resolved and no fallback configured, skipping send");
        return Ok(());
    }
    tracing::info!(
        to = recipients.to.len(),
        cc = recipients.cc.len(),
        "Resolved recipients"
    );

    let mailer = Mailer::new(config.smtp.clone());
    mailer
        .send_report(&recipients, &content)
        .await
        .context("Failed to send the report")?;

    tracing::info!("Report run completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn page(id: &str, properties: serde_json::Value) -> Page {
        serde_json::from_value(json!({ "id": id, "properties": properties })).unwrap()
    }

    // Fetch is exercised against a mock server in the client tests; this
    // covers the rest of the pipeline from raw pages to the rendered report.
    #[test]
    fn test_pages_flow_into_the_right_sections() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();

        let shipped = page(
            "rel-1",
            json!({
                "Event Name": { "type": "title", "title": [ { "text": { "content": "Checkout revamp" } } ] },
                "Status": { "type": "status", "status": { "name": "Completed" } },
                "Date": { "type": "date", "date": { "start": (now - Duration::days(3)).to_rfc3339() } }
            }),
        );
        let planned = page(
            "rel-2",
            json!({
                "Event Name": { "type": "title", "title": [ { "text": { "content": "Mobile beta" } } ] },
                "Status": { "type": "status", "status": { "name": "Upcoming" } },
                "Date": { "type": "date", "date": { "start": (now + Duration::days(10)).to_rfc3339() } }
            }),
        );
        let bug = page(
            "task-1",
            json!({
                "Task": { "type": "title", "title": [ { "text": { "content": "Fix payment retry" } } ] },
                "Priority": { "type": "select", "select": { "name": "Critical" } },
                "Done Date": { "type": "date", "date": { "start": (now - Duration::days(1)).to_rfc3339() } }
            }),
        );

        let recent = vec![extract::normalize_release(&shipped)];
        let upcoming = vec![extract::normalize_release(&planned)];
        let bugs = vec![extract::normalize_task(&bug)];
        let content = render::render_report(&recent, &upcoming, &bugs, now, "");

        let html = &content.html;
        let recent_heading = html.find("Recent Launches").unwrap();
        let upcoming_heading = html.find("Upcoming Launches").unwrap();
        let bugs_heading = html.find("Bug Fixes").unwrap();

        let shipped_at = html.find("Checkout revamp").unwrap();
        let planned_at = html.find("Mobile beta").unwrap();
        let bug_at = html.find("Fix payment retry").unwrap();

        assert!(recent_heading < shipped_at && shipped_at < upcoming_heading);
        assert!(upcoming_heading < planned_at && planned_at < bugs_heading);
        assert!(bugs_heading < bug_at);
        // Critical bugs carry the high-visibility marker
        assert!(html[bug_at..].contains("background-color: #dc3545; color: white"));
    }
}

/// Run one query; a failure costs that section, not the run.
async fn fetch_or_empty(
    client: &WorkspaceClient,
    database_id: &str,
    filter: Value,
    what: &str,
) -> Vec<Page> {
    match client.query_database(database_id, &filter).await {
        Ok(pages) => {
            tracing::info!(count = pages.len(), "Fetched {}", what);
            pages
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to fetch {}, continuing with empty set", what);
            Vec::new()
        }
    }
}
