use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

use super::{audit_lines, figures, format_value};

/// Format output as tables: the figures first, then the audit trail.
pub fn print_table(value: &Value) {
    let Some(map) = value.as_object() else {
        println!("{}", format_value(value));
        return;
    };

    let Some(figs) = figures(value) else {
        println!("{}", field_table(map));
        return;
    };

    if let (Some(company), Some(year)) = (map.get("company"), map.get("year")) {
        println!("{} FY{}\n", format_value(company), format_value(year));
    }

    println!("{}", field_table(figs));

    let lines = audit_lines(value);
    if !lines.is_empty() {
        println!("\nAudit trail:");
        for (i, line) in lines.iter().enumerate() {
            println!("  {}. {}", i + 1, line);
        }
    }

    if let Some(Value::Array(warnings)) = map.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings {
                println!("  - {}", format_value(w));
            }
        }
    }

    if let Some(Value::String(meth)) = map.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

fn field_table(map: &Map<String, Value>) -> Table {
    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    for (key, val) in map {
        builder.push_record([key.as_str(), &format_value(val)]);
    }
    Table::from(builder)
}
