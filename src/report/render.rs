//! HTML and plain-text bodies for the weekly digest email.

use chrono::{DateTime, NaiveDate, Utc};

use crate::report::extract::{ReleaseRecord, TaskRecord};

const NO_RECENT: &str = "No launches completed this week.";
const NO_UPCOMING: &str = "No upcoming launches in the next 2 weeks.";
const NO_BUGS: &str = "No bug fixes completed this week.";

/// Rendered report, ready for delivery.
#[derive(Debug, Clone)]
pub struct ReportContent {
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub fn render_report(
    recent: &[ReleaseRecord],
    upcoming: &[ReleaseRecord],
    bugs: &[TaskRecord],
    generated_at: DateTime<Utc>,
    signature_html: &str,
) -> ReportContent {
    ReportContent {
        subject: format!(
            "Weekly Development Release Notes - {}",
            generated_at.format("%B %d, %Y")
        ),
        html: render_html(recent, upcoming, bugs, generated_at, signature_html),
        text: render_text(recent, upcoming, bugs, generated_at),
    }
}

fn render_html(
    recent: &[ReleaseRecord],
    upcoming: &[ReleaseRecord],
    bugs: &[TaskRecord],
    generated_at: DateTime<Utc>,
    signature_html: &str,
) -> String {
    let mut html = format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 800px; margin: 0 auto;">
    <div style="background-color: #f8f9fa; padding: 20px; border-radius: 8px; margin-bottom: 20px;">
        <h1 style="color: #2c3e50; margin: 0;">Weekly Development Update</h1>
        <p style="margin: 5px 0 0 0; color: #6c757d;"><strong>Date:</strong> {}</p>
    </div>
"#,
        generated_at.format("%B %d, %Y")
    );

    html.push_str(&release_section_html(
        "\u{1F680} Recent Launches",
        "#28a745",
        "#f8fff8",
        "Released",
        recent,
        NO_RECENT,
    ));
    html.push_str(&release_section_html(
        "\u{1F4C5} Upcoming Launches",
        "#fd7e14",
        "#fff8f0",
        "Planned",
        upcoming,
        NO_UPCOMING,
    ));
    html.push_str(&bug_section_html(bugs));

    html.push_str(
        r#"    <hr style="margin: 30px 0; border: none; border-top: 1px solid #e9ecef;">
    <div style="background-color: #f8f9fa; padding: 15px; border-radius: 5px; text-align: center;">
        <p style="color: #6c757d; font-size: 14px; margin: 0;">
            This weekly update was automatically generated from the team workspace.<br>
            For questions or additional details, please reach out to the development team.
        </p>
    </div>
"#,
    );

    if !signature_html.is_empty() {
        html.push_str(&format!(
            r#"    <div style="margin-top: 30px; padding-top: 20px; border-top: 2px solid #e9ecef;">
        <div style="font-family: Arial, sans-serif; color: #495057;">
            {}
        </div>
    </div>
"#,
            signature_html
        ));
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn release_section_html(
    heading: &str,
    accent: &str,
    tint: &str,
    date_label: &str,
    items: &[ReleaseRecord],
    empty_text: &str,
) -> String {
    let mut html = section_heading(heading, accent, items.len());

    if items.is_empty() {
        html.push_str(&placeholder_html(empty_text));
        return html;
    }

    html.push_str(&format!(
        "    <div style=\"background-color: {}; padding: 15px; border-radius: 5px; margin-bottom: 20px;\">\n",
        tint
    ));
    for item in items {
        html.push_str(&format!(
            r#"        <div style="margin-bottom: 15px; padding: 10px; border-left: 4px solid {accent};">
            <h4 style="margin: 0 0 5px 0; color: #2c3e50;">{title}</h4>
            <p style="margin: 0 0 5px 0; font-size: 14px; color: #6c757d;">
                <strong>{date_label}:</strong> {date} | <strong>Status:</strong> {status}
            </p>
            <p style="margin: 0; color: #495057;">{description}</p>
        </div>
"#,
            accent = accent,
            title = html_escape(&item.title),
            date_label = date_label,
            date = html_escape(&format_timestamp(&item.date)),
            status = html_escape(&item.status),
            description = html_escape(&item.description),
        ));
    }
    html.push_str("    </div>\n");
    html
}

fn bug_section_html(bugs: &[TaskRecord]) -> String {
    let mut html = section_heading("\u{1F41B} Bug Fixes", "#dc3545", bugs.len());

    if bugs.is_empty() {
        html.push_str(&placeholder_html(NO_BUGS));
        return html;
    }

    html.push_str(
        "    <div style=\"background-color: #fff5f5; padding: 15px; border-radius: 5px; margin-bottom: 20px;\">\n",
    );
    for bug in bugs {
        html.push_str(&format!(
            r#"        <div style="margin-bottom: 15px; padding: 10px; border-left: 4px solid #dc3545;">
            <h4 style="margin: 0 0 5px 0; color: #2c3e50;">{title}{badge}</h4>
            <p style="margin: 0 0 5px 0; font-size: 14px; color: #6c757d;">
                <strong>Fixed:</strong> {date}
            </p>
            <p style="margin: 0; color: #495057;">{description}</p>
        </div>
"#,
            title = html_escape(&bug.title),
            badge = priority_badge(&bug.priority),
            date = html_escape(&format_day(&bug.date)),
            description = html_escape(&bug.description),
        ));
    }
    html.push_str("    </div>\n");
    html
}

fn section_heading(heading: &str, accent: &str, count: usize) -> String {
    format!(
        "    <h2 style=\"color: {accent}; border-bottom: 2px solid {accent}; padding-bottom: 5px;\">{heading} ({count} items)</h2>\n",
        accent = accent,
        heading = heading,
        count = count,
    )
}

fn placeholder_html(text: &str) -> String {
    format!(
        "    <p style=\"color: #6c757d; font-style: italic; background-color: #f8f9fa; padding: 15px; border-radius: 5px;\">{}</p>\n",
        text
    )
}

/// Priority marker next to the bug title; high-severity labels get the
/// red treatment so they stand out in the inbox preview.
fn priority_badge(priority: &str) -> String {
    if priority.is_empty() {
        return String::new();
    }
    let color = match priority.to_lowercase().as_str() {
        "high" | "critical" => "#dc3545",
        "medium" => "#fd7e14",
        _ => "#6c757d",
    };
    format!(
        " <span style=\"background-color: {}; color: white; padding: 2px 6px; border-radius: 3px; font-size: 12px;\">{}</span>",
        color,
        html_escape(priority)
    )
}

fn render_text(
    recent: &[ReleaseRecord],
    upcoming: &[ReleaseRecord],
    bugs: &[TaskRecord],
    generated_at: DateTime<Utc>,
) -> String {
    let mut text = format!(
        "Weekly Development Update\n{}\n",
        generated_at.format("%B %d, %Y")
    );

    text.push_str(&format!("\nRecent Launches ({})\n", recent.len()));
    if recent.is_empty() {
        text.push_str(NO_RECENT);
        text.push('\n');
    }
    for item in recent {
        text.push_str(&release_line(item, "Released"));
    }

    text.push_str(&format!("\nUpcoming Launches ({})\n", upcoming.len()));
    if upcoming.is_empty() {
        text.push_str(NO_UPCOMING);
        text.push('\n');
    }
    for item in upcoming {
        text.push_str(&release_line(item, "Planned"));
    }

    text.push_str(&format!("\nBug Fixes ({})\n", bugs.len()));
    if bugs.is_empty() {
        text.push_str(NO_BUGS);
        text.push('\n');
    }
    for bug in bugs {
        let priority = if bug.priority.is_empty() {
            String::new()
        } else {
            format!(" [{}]", bug.priority)
        };
        text.push_str(&format!(
            "* {}{}\n  Fixed: {}\n",
            bug.title,
            priority,
            format_day(&bug.date)
        ));
        if !bug.description.is_empty() {
            text.push_str(&format!("  {}\n", bug.description));
        }
    }

    text.push_str("\n---\nThis weekly update was automatically generated from the team workspace.\n");
    text
}

fn release_line(item: &ReleaseRecord, date_label: &str) -> String {
    let mut line = format!(
        "* {}\n  {}: {} | Status: {}\n",
        item.title,
        date_label,
        format_timestamp(&item.date),
        item.status
    );
    if !item.description.is_empty() {
        line.push_str(&format!("  {}\n", item.description));
    }
    line
}

/// Render an upstream timestamp for humans. Date-only values are common when
/// a record has no scheduled time; anything unparsable is shown verbatim.
fn format_timestamp(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%B %d, %Y at %I:%M %p").to_string();
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return day.format("%B %d, %Y").to_string();
    }
    raw.to_string()
}

fn format_day(raw: &str) -> String {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed.format("%B %d, %Y").to_string();
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return day.format("%B %d, %Y").to_string();
    }
    raw.to_string()
}

/// Escape HTML special characters
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
