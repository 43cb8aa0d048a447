// ── Authentication model ──
//
// Roles, the `authState` slice shape, and the on-screen PIN keypad buffer.

use std::fmt;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use strum::{Display, EnumString, IntoStaticStr};

/// Number of digits in a kiosk PIN.
pub const PIN_LENGTH: usize = 4;

/// Access level of the signed-in user.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Role {
    Admin,
    User,
    #[default]
    Guest,
}

/// Client-side fallback role table.
pub fn determine_role(pin: &str) -> Role {
    match pin {
        "1234" => Role::Admin,
        "5678" => Role::User,
        _ => Role::Guest,
    }
}

/// The backend's role wins when it names a known role; otherwise fall back
/// to [`determine_role`].
pub fn resolve_role(backend: Option<&str>, pin: &str) -> Role {
    backend
        .and_then(|r| r.parse().ok())
        .unwrap_or_else(|| determine_role(pin))
}

/// Value of the `authState` slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub authenticated: bool,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AuthState {
    pub fn guest() -> Self {
        Self {
            authenticated: false,
            role: Role::Guest,
            username: None,
        }
    }

    pub fn signed_in(role: Role, username: Option<String>) -> Self {
        Self {
            authenticated: true,
            role,
            username,
        }
    }

    /// The slice value stored under `authState`.
    pub fn to_value(&self) -> Value {
        let mut value = json!({
            "authenticated": self.authenticated,
            "role": <&'static str>::from(self.role),
        });
        if let Some(username) = &self.username {
            value["username"] = Value::String(username.clone());
        }
        value
    }
}

impl Default for AuthState {
    fn default() -> Self {
        Self::guest()
    }
}

// ── PIN entry ────────────────────────────────────────────────────────

/// Result of pressing a key on the keypad.
pub enum PinInput {
    /// Digit accepted, more needed.
    Pending { entered: usize },
    /// The PIN is complete; the buffer has been reset.
    Complete(SecretString),
    /// Not a digit.
    Ignored,
}

impl fmt::Debug for PinInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending { entered } => f.debug_struct("Pending").field("entered", entered).finish(),
            Self::Complete(_) => f.write_str("Complete([REDACTED])"),
            Self::Ignored => f.write_str("Ignored"),
        }
    }
}

/// Digits-only keypad buffer. The PIN is handed out and the buffer reset
/// as soon as [`PIN_LENGTH`] digits are in.
#[derive(Default)]
pub struct PinEntry {
    digits: String,
}

impl PinEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: char) -> PinInput {
        if !key.is_ascii_digit() {
            return PinInput::Ignored;
        }
        self.digits.push(key);
        if self.digits.len() == PIN_LENGTH {
            PinInput::Complete(SecretString::from(std::mem::take(&mut self.digits)))
        } else {
            PinInput::Pending {
                entered: self.digits.len(),
            }
        }
    }

    pub fn backspace(&mut self) {
        self.digits.pop();
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    /// `●` per entered digit, `○` for the rest.
    pub fn masked(&self) -> String {
        let filled = self.digits.len();
        "●".repeat(filled) + &"○".repeat(PIN_LENGTH - filled)
    }
}

impl fmt::Debug for PinEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinEntry").field("len", &self.len()).finish()
    }
}

/// A PIN is exactly [`PIN_LENGTH`] ASCII digits.
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == PIN_LENGTH && pin.bytes().all(|b| b.is_ascii_digit())
}
