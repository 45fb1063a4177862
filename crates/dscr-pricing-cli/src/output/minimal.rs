use serde_json::Value;

/// Print just the key answer value from the output.
///
/// Pricing results print the best option's final rate, quotes the same from
/// their pricing section, analytics the DSCR. Anything else falls back to the
/// first field of the result object.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    println!("{}", minimal_answer(result_obj));
}

fn minimal_answer(result: &Value) -> String {
    let pricing = result.get("pricing").unwrap_or(result);
    if let Some(Value::Array(options)) = pricing.get("options") {
        return match options.first().and_then(|o| o.get("final_rate")) {
            Some(rate) => format_minimal(rate),
            None => pricing
                .get("status")
                .map(format_minimal)
                .unwrap_or_else(|| "no_eligible_products".to_string()),
        };
    }

    let priority_keys = ["dscr", "valid", "status", "default_program"];

    if let Value::Object(map) = result {
        for key in &priority_keys {
            if let Some(val) = map.get(*key) {
                if !val.is_null() {
                    return format_minimal(val);
                }
            }
        }

        if let Some((key, val)) = map.iter().next() {
            return format!("{}: {}", key, format_minimal(val));
        }
    }

    format_minimal(result)
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        Value::Object(map) => match (map.get("value"), map.get("reason")) {
            (Some(v), _) => format_minimal(v),
            (None, Some(reason)) => format!("undefined: {}", format_minimal(reason)),
            _ => serde_json::to_string(value).unwrap_or_default(),
        },
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_best_rate_then_status() {
        let priced = json!({ "status": "priced", "options": [{ "final_rate": "7.150" }, { "final_rate": "7.400" }] });
        assert_eq!(minimal_answer(&priced), "7.150");

        let none = json!({ "status": "no_eligible_products", "options": [] });
        assert_eq!(minimal_answer(&none), "no_eligible_products");

        let quote = json!({ "request": {}, "pricing": priced });
        assert_eq!(minimal_answer(&quote), "7.150");
    }

    #[test]
    fn test_dscr_ratio() {
        let metrics = json!({ "noi": "48000", "dscr": { "status": "defined", "value": "3.6107" } });
        assert_eq!(minimal_answer(&metrics), "3.6107");
    }
}
