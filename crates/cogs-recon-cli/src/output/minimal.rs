use serde_json::Value;

use super::{figures, format_value};

/// Print just the headline number.
///
/// Looks for well-known fields in priority order, first among the reported
/// figures and then at the top level, falling back to the first field.
pub fn print_minimal(value: &Value) {
    let priority_keys = ["cogs", "reconciliation", "decimal", "healthy"];

    let scopes = [figures(value), value.as_object()];
    for map in scopes.iter().flatten() {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    println!("{}", format_value(val));
                    return;
                }
            }
        }
    }

    if let Some((key, val)) = value.as_object().and_then(|m| m.iter().next()) {
        println!("{}: {}", key, format_value(val));
        return;
    }

    println!("{}", format_value(value));
}
