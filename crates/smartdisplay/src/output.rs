//! Output formatting: table, JSON, YAML, plain.
//!
//! Backend payloads are free-form JSON, so every renderer works on
//! `serde_json::Value`. Tables list top-level fields as key/value rows.

use std::io::{self, Write};

use serde_json::Value;
use tabled::{Table, Tabled, settings::Style};

use crate::cli::OutputFormat;

#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Value")]
    value: String,
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a payload in the chosen format.
pub fn render_value(format: OutputFormat, value: &Value) -> String {
    match format {
        OutputFormat::Table => render_table(value),
        OutputFormat::Json => render_json_pretty(value),
        OutputFormat::JsonCompact => render_json_compact(value),
        OutputFormat::Yaml => render_yaml(value),
        OutputFormat::Plain => render_plain(value),
    }
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

// ── Format-specific renderers ────────────────────────────────────────

fn rows(value: &Value) -> Vec<FieldRow> {
    match value {
        Value::Object(map) => map
            .iter()
            .map(|(k, v)| FieldRow {
                field: k.clone(),
                value: scalar_text(v),
            })
            .collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| FieldRow {
                field: i.to_string(),
                value: scalar_text(v),
            })
            .collect(),
        other => vec![FieldRow {
            field: "value".into(),
            value: scalar_text(other),
        }],
    }
}

fn render_table(value: &Value) -> String {
    let rows = rows(value);
    if rows.is_empty() {
        return "(empty)".into();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}

fn render_plain(value: &Value) -> String {
    rows(value)
        .into_iter()
        .map(|r| format!("{}={}", r.field, r.value))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Strings print bare; everything else as compact JSON.
fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => render_json_compact(other),
    }
}

/// Pretty-printed JSON.
pub(crate) fn render_json_pretty<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string_pretty(data).expect("serialization should not fail")
}

/// Compact single-line JSON.
pub(crate) fn render_json_compact<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_json::to_string(data).expect("serialization should not fail")
}

/// YAML output.
pub(crate) fn render_yaml<T: serde::Serialize + ?Sized>(data: &T) -> String {
    serde_yaml::to_string(data).expect("serialization should not fail")
}
