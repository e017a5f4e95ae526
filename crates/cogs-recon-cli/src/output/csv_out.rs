use serde_json::Value;
use std::io;

use super::{figures, format_value};

/// Write the reported figures (or a flat object) as two-column CSV.
pub fn print_csv(value: &Value) {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    let rows = figures(value).or_else(|| value.as_object());
    match rows {
        Some(map) => {
            let _ = wtr.write_record(["field", "value"]);
            if let (Some(company), Some(year)) = (value.get("company"), value.get("year")) {
                let _ = wtr.write_record(["company", &format_value(company)]);
                let _ = wtr.write_record(["year", &format_value(year)]);
            }
            for (key, val) in map {
                let _ = wtr.write_record([key.as_str(), &csv_value(val)]);
            }
        }
        None => {
            let _ = wtr.write_record([&csv_value(value)]);
        }
    }

    let _ = wtr.flush();
}

fn csv_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).unwrap_or_default(),
        other => format_value(other),
    }
}
