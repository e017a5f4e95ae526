pub mod csv_out;
pub mod minimal;
pub mod table;

use crate::OutputFormat;
use serde_json::{Map, Value};

/// Dispatch output to the appropriate formatter.
pub fn format_output(format: &OutputFormat, value: &Value) {
    match format {
        OutputFormat::Json => print_json(value),
        OutputFormat::Table => table::print_table(value),
        OutputFormat::Csv => csv_out::print_csv(value),
        OutputFormat::Minimal => minimal::print_minimal(value),
    }
}

/// Pretty-print JSON to stdout.
fn print_json(value: &Value) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => eprintln!("JSON serialization error: {}", e),
    }
}

/// The reported figures: `report` of a pipeline run or `result` of a
/// one-shot reconciliation.
pub(crate) fn figures(value: &Value) -> Option<&Map<String, Value>> {
    let map = value.as_object()?;
    map.get("report")
        .or_else(|| map.get("result"))
        .and_then(Value::as_object)
}

/// Audit lines from either output shape.
pub(crate) fn audit_lines(value: &Value) -> Vec<String> {
    match value.get("logs") {
        Some(Value::Array(lines)) => lines.iter().map(format_value).collect(),
        _ => value
            .get("audit_trail")
            .and_then(Value::as_str)
            .map(|trail| trail.split(" | ").map(str::to_string).collect())
            .unwrap_or_default(),
    }
}

pub(crate) fn format_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Array(arr) => {
            let items: Vec<String> = arr.iter().map(format_value).collect();
            items.join(", ")
        }
        Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_figures_from_pipeline_report() {
        let value = json!({"company": "AAPL", "year": 2023, "report": {"cogs": "80.00"}, "logs": []});
        assert_eq!(figures(&value).unwrap()["cogs"], json!("80.00"));
    }

    #[test]
    fn test_figures_from_envelope() {
        let value = json!({"result": {"cogs": "1.00"}, "audit_trail": "a | b"});
        assert_eq!(figures(&value).unwrap()["cogs"], json!("1.00"));
        assert_eq!(audit_lines(&value), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_flat_object_has_no_figures() {
        assert!(figures(&json!({"healthy": true})).is_none());
        assert!(audit_lines(&json!({"healthy": true})).is_empty());
    }
}
