//! Locate named line items inside arbitrarily shaped statement responses.
//!
//! Providers disagree on layout. The same inventory figure may arrive as a
//! flat key (`{"inventory": 120}`), as a labelled item in a list
//! (`{"lineItems": [{"label": "Inventory", "amount": "120"}]}`), or buried
//! in nested sections. [`find_value`] walks the JSON tree depth-first and
//! returns the first match, comparing names after [`normalize_name`] and
//! through a small synonym table.

use serde_json::{Map, Value};
use tracing::trace;

use crate::numeric::normalize_numeric;

/// Fields naming a labelled line item, in lookup order.
const LABEL_FIELDS: [&str; 2] = ["name", "label"];

/// Fields carrying a labelled line item's amount, in lookup order.
const VALUE_FIELDS: [&str; 3] = ["value", "amount", "quantity"];

/// Canonical concept → accepted spellings (already normalized).
const SYNONYMS: &[(&str, &[&str])] = &[
    (
        "inventory",
        &["inventory", "inventories", "inventorytotal", "totalinventory"],
    ),
    (
        "capitalworkinprogress",
        &["capitalworkinprogress", "cwip", "workinprogress"],
    ),
    (
        "costofrevenue",
        &["costofrevenue", "costofsales", "cogs", "costofgoodsold"],
    ),
];

/// Lower-case and drop everything that is not an ASCII letter or digit.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// The normalized names that count as a match for `key`.
///
/// Keys with no synonym entry match only themselves.
pub fn candidate_names(key: &str) -> Vec<String> {
    let target = normalize_name(key);
    SYNONYMS
        .iter()
        .find(|(concept, _)| *concept == target)
        .map(|(_, spellings)| spellings.iter().map(|s| s.to_string()).collect())
        .unwrap_or_else(|| vec![target])
}

/// Find `key` anywhere in `root` and return its normalized value.
///
/// Object entries are visited in document order and arrays in index order,
/// so the result is deterministic for a given response. A miss is `None`,
/// never an error.
pub fn find_value(root: &Value, key: &str) -> Option<Value> {
    let candidates = candidate_names(key);
    let found = search(root, &candidates);
    trace!(key, found = ?found, "line item lookup");
    found
}

fn search(node: &Value, candidates: &[String]) -> Option<Value> {
    match node {
        Value::Object(map) => search_object(map, candidates),
        Value::Array(items) => search_array(items, candidates),
        _ => None,
    }
}

fn search_object(map: &Map<String, Value>, candidates: &[String]) -> Option<Value> {
    for (key, value) in map {
        if is_candidate(key, candidates) {
            if let Some(found) = normalize_numeric(value) {
                return Some(found);
            }
            continue;
        }

        match value {
            Value::Object(child) => {
                if let Some(found) = labelled_match(child, candidates) {
                    return Some(found);
                }
                if let Some(found) = search_object(child, candidates) {
                    return Some(found);
                }
            }
            Value::Array(items) => {
                if let Some(found) = search_array(items, candidates) {
                    return Some(found);
                }
            }
            _ => {}
        }
    }
    None
}

fn search_array(items: &[Value], candidates: &[String]) -> Option<Value> {
    for item in items {
        if let Value::Object(child) = item {
            if let Some(found) = labelled_match(child, candidates) {
                return Some(found);
            }
        }
        if let Some(found) = search(item, candidates) {
            return Some(found);
        }
    }
    None
}

/// Match an item shaped like `{"label": "Inventory", "amount": "120"}`.
fn labelled_match(item: &Map<String, Value>, candidates: &[String]) -> Option<Value> {
    let label = first_present(item, &LABEL_FIELDS)?;
    let label = match label {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if !is_candidate(&label, candidates) {
        return None;
    }
    first_present(item, &VALUE_FIELDS).and_then(normalize_numeric)
}

fn first_present<'a>(item: &'a Map<String, Value>, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .filter_map(|field| item.get(*field))
        .find(|value| is_present(value))
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn is_candidate(name: &str, candidates: &[String]) -> bool {
    let normalized = normalize_name(name);
    candidates.iter().any(|c| *c == normalized)
}
