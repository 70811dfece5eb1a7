use serde_json::{json, Value};

use crate::cli::OutputFormat;

pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Confirmation line in text mode; `{ "success", "message", ...details }` in JSON mode
pub fn report_success(format: &OutputFormat, message: &str, details: Option<Value>) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&success_body(message, details)),
        OutputFormat::Text => {
            println!("✓ {}", message);
            Ok(())
        }
    }
}

/// Errors go to stderr in text mode so piped output stays clean
pub fn report_error(format: &OutputFormat, message: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ "success": false, "error": message })),
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
            Ok(())
        }
    }
}

pub fn report_empty(format: &OutputFormat, collection: &str, message: &str) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_json(&json!({ collection: [] })),
        OutputFormat::Text => {
            println!("{}", message);
            Ok(())
        }
    }
}

fn success_body(message: &str, details: Option<Value>) -> Value {
    let mut body = json!({ "success": true, "message": message });
    if let (Some(Value::Object(extra)), Some(fields)) = (details, body.as_object_mut()) {
        fields.extend(extra);
    }
    body
}
