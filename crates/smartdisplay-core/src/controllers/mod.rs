// ── View controllers ──
//
// Each controller owns one slice. Polled controllers hand a
// `PollingProvider` to the store via `attach`; action methods call the
// backend directly and propagate failures to the caller.

mod alarm;
mod guest;
mod home;
mod login;
mod menu;

use serde_json::Value;

pub use alarm::{AlarmController, ArmMode};
pub use guest::GuestController;
pub use home::HomeController;
pub use login::LoginController;
pub use menu::MenuController;

use crate::error::CoreError;

/// Accept only JSON objects for `slice`.
pub(crate) fn normalize_object(slice: &'static str, value: Value) -> Result<Value, CoreError> {
    match value {
        Value::Object(_) => Ok(value),
        other => Err(CoreError::InvalidPayload {
            slice: slice.to_owned(),
            reason: format!("expected an object, got {}", json_type(&other)),
        }),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
