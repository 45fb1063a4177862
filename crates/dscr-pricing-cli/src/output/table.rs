use serde_json::{Map, Value};
use tabled::{builder::Builder, Table};

/// Format output as tables using the tabled crate.
pub fn print_table(value: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(result) = map.get("result") {
                print_section(None, result);
                print_envelope(map);
            } else {
                print_section(None, value);
            }
        }
        Value::Array(arr) => print_array_table(arr),
        _ => println!("{}", value),
    }
}

fn print_envelope(envelope: &Map<String, Value>) {
    if let Some(Value::Array(warnings)) = envelope.get("warnings") {
        if !warnings.is_empty() {
            println!("\nWarnings:");
            for w in warnings.iter().filter_map(Value::as_str) {
                println!("  - {}", w);
            }
        }
    }

    if let Some(Value::String(meth)) = envelope.get("methodology") {
        println!("\nMethodology: {}", meth);
    }
}

/// Scalar fields as a Field/Value table, then one table per list of records
/// and a titled section per nested object (a quote's `pricing`, `analytics`).
fn print_section(title: Option<&str>, value: &Value) {
    let Value::Object(map) = value else {
        println!("{}", format_value(value));
        return;
    };

    if let Some(title) = title {
        println!("\n{}:", title);
    }

    let mut builder = Builder::default();
    builder.push_record(["Field", "Value"]);
    let mut scalars = 0;
    for (key, val) in map {
        if is_scalar(val) {
            builder.push_record([key.as_str(), &format_value(val)]);
            scalars += 1;
        }
    }
    if scalars > 0 {
        println!("{}", Table::from(builder));
    }

    for (key, val) in map {
        match val {
            Value::Array(arr) if arr.iter().any(Value::is_object) => {
                println!("\n{}:", key);
                print_array_table(arr);
            }
            Value::Object(_) if !is_scalar(val) => print_section(Some(key), val),
            _ => {}
        }
    }
}

fn print_array_table(arr: &[Value]) {
    if arr.is_empty() {
        println!("(empty)");
        return;
    }

    if let Some(Value::Object(first)) = arr.first() {
        // Nested breakdowns do not fit a row; they stay in the JSON output.
        let headers: Vec<String> = first
            .iter()
            .filter(|(_, v)| is_scalar(v))
            .map(|(k, _)| k.clone())
            .collect();
        let mut builder = Builder::default();
        builder.push_record(&headers);

        for item in arr {
            if let Value::Object(map) = item {
                let row: Vec<String> = headers
                    .iter()
                    .map(|h| map.get(h.as_str()).map(format_value).unwrap_or_default())
                    .collect();
                builder.push_record(row);
            }
        }

        println!("{}", Table::from(builder));
    } else {
        for item in arr {
            println!("{}", format_value(item));
        }
    }
}

/// Plain values and tagged ratios render in a single cell.
fn is_scalar(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.contains_key("status") && map.len() == 2,
        Value::Array(arr) => !arr.iter().any(|v| v.is_object()),
        _ => true,
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
        Value::Object(map) => match (map.get("value"), map.get("reason")) {
            (Some(v), _) => format_value(v),
            (None, Some(reason)) => format!("undefined ({})", format_value(reason)),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
    }
}
