//! Record normalization for externally fetched pages.
//!
//! Query results arrive as loosely-typed property maps whose shapes vary per
//! property kind and occasionally per workspace schema version. Everything
//! here decodes field-by-field with explicit presence checks and degrades to
//! a safe default, so one malformed upstream record can never keep the report
//! from rendering.

use serde_json::{Map, Value};

use crate::workspace::Page;

/// A release/launch entry, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRecord {
    pub title: String,
    pub description: String,
    /// Raw date string as stored upstream; formatting happens at render time.
    pub date: String,
    pub status: String,
}

/// A resolved bug-fix task, ready for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub title: String,
    pub description: String,
    pub date: String,
    pub priority: String,
}

/// Normalize one releases-database page.
pub fn normalize_release(page: &Page) -> ReleaseRecord {
    let props = &page.properties;
    ReleaseRecord {
        title: release_title(props, &page.id),
        description: rich_text_plain(props.get("Description")).unwrap_or_default(),
        date: date_start(props.get("Date")).unwrap_or_default(),
        status: status_name(props.get("Status")).unwrap_or_default(),
    }
}

/// Normalize one tasks-database page.
pub fn normalize_task(page: &Page) -> TaskRecord {
    let props = &page.properties;
    TaskRecord {
        title: task_title(props, &page.id),
        description: rich_text_plain(props.get("Description")).unwrap_or_default(),
        date: date_start(props.get("Done Date")).unwrap_or_default(),
        priority: select_name(props.get("Priority")).unwrap_or_default(),
    }
}

/// Release title chain: the dedicated "Event Name" property wins outright.
/// An absent property or an empty title array means the record simply has no
/// name yet ("Untitled"); a present-but-broken one gets an id-derived tag so
/// the entry stays traceable.
fn release_title(props: &Map<String, Value>, page_id: &str) -> String {
    match props
        .get("Event Name")
        .and_then(|p| p.get("title"))
        .and_then(Value::as_array)
    {
        Some(items) if !items.is_empty() => first_text_content(items)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| id_tag("Event", page_id)),
        _ => "Untitled".to_string(),
    }
}

/// Task title chain: tasks carry no fixed title property name, so scan for
/// the property whose reported kind is "title". Anything that does not yield
/// a usable string falls through to the id-derived tag.
fn task_title(props: &Map<String, Value>, page_id: &str) -> String {
    for prop in props.values() {
        if prop.get("type").and_then(Value::as_str) != Some("title") {
            continue;
        }
        if let Some(items) = prop.get("title").and_then(Value::as_array) {
            if !items.is_empty() {
                if let Some(text) = first_text_content(items).filter(|t| !t.is_empty()) {
                    return text;
                }
            }
        }
        break;
    }
    id_tag("Task", page_id)
}

/// Plain content of the first fragment of a rich-text property.
fn rich_text_plain(prop: Option<&Value>) -> Option<String> {
    let items = prop?.get("rich_text")?.as_array()?;
    first_text_content(items)
}

/// `start` value of a date property, verbatim.
fn date_start(prop: Option<&Value>) -> Option<String> {
    let start = prop?.get("date")?.get("start")?.as_str()?;
    Some(start.to_string())
}

/// `name` of a status-kind property.
fn status_name(prop: Option<&Value>) -> Option<String> {
    let name = prop?.get("status")?.get("name")?.as_str()?;
    Some(name.to_string())
}

/// `name` of a select-kind property.
fn select_name(prop: Option<&Value>) -> Option<String> {
    let name = prop?.get("select")?.get("name")?.as_str()?;
    Some(name.to_string())
}

fn first_text_content(items: &[Value]) -> Option<String> {
    let content = items.first()?.get("text")?.get("content")?.as_str()?;
    Some(content.to_string())
}

/// Short synthetic title from the tail of the record id.
fn id_tag(kind: &str, id: &str) -> String {
    let skip = id.chars().count().saturating_sub(8);
    let tail: String = id.chars().skip(skip).collect();
    format!("{} {}", kind, tail)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(id: &str, properties: Value) -> Page {
        serde_json::from_value(json!({ "id": id, "properties": properties })).unwrap()
    }

    #[test]
    fn test_release_all_fields_present() {
        let page = page(
            "abcdef1234567890",
            json!({
                "Event Name": { "type": "title", "title": [
                    { "text": { "content": "Search v2 launch" } }
                ]},
                "Description": { "type": "rich_text", "rich_text": [
                    { "text": { "content": "New ranking pipeline" } }
                ]},
                "Date": { "type": "date", "date": { "start": "2024-03-15T10:00:00Z" } },
                "Status": { "type": "status", "status": { "name": "Completed" } }
            }),
        );
        assert_eq!(
            normalize_release(&page),
            ReleaseRecord {
                title: "Search v2 launch".to_string(),
                description: "New ranking pipeline".to_string(),
                date: "2024-03-15T10:00:00Z".to_string(),
                status: "Completed".to_string(),
            }
        );
    }

    #[test]
    fn test_release_empty_page_uses_defaults() {
        let record = normalize_release(&page("abcdef1234567890", json!({})));
        assert_eq!(record.title, "Untitled");
        assert_eq!(record.description, "");
        assert_eq!(record.date, "");
        assert_eq!(record.status, "");
    }

    #[test]
    fn test_release_empty_title_array_is_untitled() {
        let page = page(
            "abcdef1234567890",
            json!({ "Event Name": { "type": "title", "title": [] } }),
        );
        assert_eq!(normalize_release(&page).title, "Untitled");
    }

    #[test]
    fn test_release_broken_title_falls_back_to_id_tag() {
        // Present but missing the text.content nesting
        let page = page(
            "abcdef1234567890",
            json!({ "Event Name": { "type": "title", "title": [ { "mention": {} } ] } }),
        );
        assert_eq!(normalize_release(&page).title, "Event 34567890");
    }

    #[test]
    fn test_release_blank_title_content_is_untitled() {
        let page = page(
            "abcdef1234567890",
            json!({ "Event Name": { "type": "title", "title": [ { "text": { "content": "" } } ] } }),
        );
        assert_eq!(normalize_release(&page).title, "Untitled");
    }

    #[test]
    fn test_dedicated_title_field_wins_over_type_tagged() {
        let page = page(
            "abcdef1234567890",
            json!({
                "Name": { "type": "title", "title": [ { "text": { "content": "Generic name" } } ] },
                "Event Name": { "type": "title", "title": [ { "text": { "content": "Dedicated name" } } ] }
            }),
        );
        assert_eq!(normalize_release(&page).title, "Dedicated name");
    }

    #[test]
    fn test_release_malformed_nested_shapes_degrade() {
        let page = page(
            "abcdef1234567890",
            json!({
                // status reported as a bare string instead of an object
                "Status": { "type": "status", "status": "Completed" },
                // date present but null
                "Date": { "type": "date", "date": null },
                // rich_text reported as an object
                "Description": { "type": "rich_text", "rich_text": { "oops": true } }
            }),
        );
        let record = normalize_release(&page);
        assert_eq!(record.status, "");
        assert_eq!(record.date, "");
        assert_eq!(record.description, "");
    }

    #[test]
    fn test_task_title_found_by_type_scan() {
        let page = page(
            "1234abcd5678efgh",
            json!({
                "Priority": { "type": "select", "select": { "name": "High" } },
                "Task": { "type": "title", "title": [ { "text": { "content": "Fix login loop" } } ] }
            }),
        );
        assert_eq!(normalize_task(&page).title, "Fix login loop");
    }

    #[test]
    fn test_task_without_title_property_gets_id_tag() {
        let page = page(
            "1234abcd5678efgh",
            json!({ "Priority": { "type": "select", "select": { "name": "Low" } } }),
        );
        assert_eq!(normalize_task(&page).title, "Task 5678efgh");
    }

    #[test]
    fn test_task_broken_title_gets_id_tag() {
        let page = page(
            "1234abcd5678efgh",
            json!({ "Task": { "type": "title", "title": [ { "href": null } ] } }),
        );
        assert_eq!(normalize_task(&page).title, "Task 5678efgh");
    }

    #[test]
    fn test_task_fields() {
        let page = page(
            "1234abcd5678efgh",
            json!({
                "Task": { "type": "title", "title": [ { "text": { "content": "Fix crash" } } ] },
                "Description": { "type": "rich_text", "rich_text": [
                    { "text": { "content": "Null pointer on resume" } }
                ]},
                "Done Date": { "type": "date", "date": { "start": "2024-03-12" } },
                "Priority": { "type": "select", "select": { "name": "Critical" } }
            }),
        );
        assert_eq!(
            normalize_task(&page),
            TaskRecord {
                title: "Fix crash".to_string(),
                description: "Null pointer on resume".to_string(),
                date: "2024-03-12".to_string(),
                priority: "Critical".to_string(),
            }
        );
    }

    #[test]
    fn test_id_tag_short_id() {
        assert_eq!(id_tag("Task", "abc"), "Task abc");
        assert_eq!(id_tag("Event", ""), "Event ");
    }
}
