//! Recipient resolution from release records, with static fallback lists.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::workspace::Page;

/// Resolved To/CC lists for the outbound report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipients {
    pub to: Vec<String>,
    pub cc: Vec<String>,
}

impl Recipients {
    pub fn is_empty(&self) -> bool {
        self.to.is_empty() && self.cc.is_empty()
    }

    /// Union of both lists for the delivery envelope, without repeats.
    pub fn all(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.to
            .iter()
            .chain(self.cc.iter())
            .filter(|addr| seen.insert(addr.as_str()))
            .cloned()
            .collect()
    }
}

/// Derive To/CC lists from the seed pages' "Email To"/"Email CC" properties.
/// When neither list yields an address, the configured fallback lists are
/// used verbatim.
pub fn resolve(pages: &[Page], fallback_to: &[String], fallback_cc: &[String]) -> Recipients {
    let mut to = BTreeSet::new();
    let mut cc = BTreeSet::new();

    for page in pages {
        collect_addresses(page.properties.get("Email To"), &mut to);
        collect_addresses(page.properties.get("Email CC"), &mut cc);
    }

    if to.is_empty() && cc.is_empty() {
        return Recipients {
            to: fallback_to.to_vec(),
            cc: fallback_cc.to_vec(),
        };
    }

    Recipients {
        to: to.into_iter().collect(),
        cc: cc.into_iter().collect(),
    }
}

/// The address property comes in two shapes: free rich text holding a
/// comma-separated list, or a dedicated email field holding one address.
fn collect_addresses(prop: Option<&Value>, out: &mut BTreeSet<String>) {
    let Some(prop) = prop else { return };

    let fragments = prop
        .get("rich_text")
        .and_then(Value::as_array)
        .filter(|items| !items.is_empty());

    if let Some(items) = fragments {
        let mut text = String::new();
        for item in items {
            if let Some(chunk) = item
                .get("text")
                .and_then(|t| t.get("content"))
                .and_then(Value::as_str)
            {
                text.push_str(chunk);
            }
        }
        for part in text.split(',') {
            push_address(part, out);
        }
    } else if let Some(addr) = prop.get("email").and_then(Value::as_str) {
        push_address(addr, out);
    }
}

fn push_address(raw: &str, out: &mut BTreeSet<String>) {
    let addr = raw.trim();
    if !addr.is_empty() && addr.contains('@') {
        out.insert(addr.to_string());
    }
}
