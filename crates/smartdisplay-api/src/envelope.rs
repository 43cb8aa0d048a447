// ── Response envelope classification ──
//
// The backend signals failure with a non-empty string `error` field,
// independent of HTTP status. Classification happens exactly once, here.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The backend's error payload: `{error, code?, details?, data?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A parsed response body, discriminated into success or failure.
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Success(Value),
    Failure(ErrorEnvelope),
}

impl Envelope {
    /// Classify a parsed body.
    ///
    /// Only a non-empty *string* `error` marks a failure; `"error": ""`,
    /// `"error": null` or a non-string `error` are ordinary payload fields.
    pub fn classify(body: Value) -> Self {
        let Value::Object(map) = body else {
            return Self::Success(body);
        };
        match map.get("error") {
            Some(Value::String(msg)) if !msg.is_empty() => {
                Self::Failure(error_envelope(msg.clone(), &map))
            }
            _ => Self::Success(Value::Object(map)),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }
}

/// Parse a raw body as JSON. An empty (or whitespace-only) body is `{}`.
pub fn parse_body(raw: &str) -> Result<Value, serde_json::Error> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(raw)
}

fn error_envelope(error: String, map: &Map<String, Value>) -> ErrorEnvelope {
    let code = match map.get("code") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(other) => Some(other.to_string()),
    };
    ErrorEnvelope {
        error,
        code,
        details: map.get("details").filter(|v| !v.is_null()).cloned(),
        data: map.get("data").filter(|v| !v.is_null()).cloned(),
    }
}
