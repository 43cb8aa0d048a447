// Typed wrappers for the backend's UI endpoints.
//
// State payloads are opaque JSON owned by the backend; only the login and
// alarm-action shapes are modelled.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::client::ApiClient;
use crate::error::Error;
use crate::request::RequestOptions;

pub const ALARM_STATE: &str = "/ui/alarm/state";
pub const ALARM_ACTION: &str = "/ui/alarm/action";
pub const GUEST_STATE: &str = "/ui/guest/state";
pub const GUEST_REQUEST: &str = "/ui/guest/request";
pub const GUEST_EXIT: &str = "/ui/guest/exit";
pub const HOME_STATE: &str = "/ui/home/state";
pub const MENU: &str = "/ui/menu";
pub const LOGIN: &str = "/api/login";

/// Header carrying the caller's role on role-sensitive requests.
pub const USER_ROLE_HEADER: &str = "X-User-Role";

/// Alarm panel commands accepted by `POST /ui/alarm/action`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AlarmAction {
    ArmHome,
    ArmAway,
    ArmNight,
    Disarm,
}

#[derive(Serialize)]
struct AlarmActionRequest {
    action: AlarmAction,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    pin: &'a str,
}

/// Response of `POST /api/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiClient {
    // ── Alarm ────────────────────────────────────────────────────────

    pub async fn alarm_state(&self) -> Result<Value, Error> {
        self.get(ALARM_STATE, RequestOptions::default()).await
    }

    pub async fn alarm_action(&self, action: AlarmAction) -> Result<Value, Error> {
        self.post(ALARM_ACTION, &AlarmActionRequest { action }, RequestOptions::default())
            .await
    }

    // ── Guest ────────────────────────────────────────────────────────

    pub async fn guest_state(&self) -> Result<Value, Error> {
        self.get(GUEST_STATE, RequestOptions::default()).await
    }

    pub async fn guest_request(&self) -> Result<Value, Error> {
        self.post(GUEST_REQUEST, &json!({}), RequestOptions::default())
            .await
    }

    pub async fn guest_exit(&self) -> Result<Value, Error> {
        self.post(GUEST_EXIT, &json!({}), RequestOptions::default())
            .await
    }

    // ── Home / menu ──────────────────────────────────────────────────

    pub async fn home_state(&self) -> Result<Value, Error> {
        self.get(HOME_STATE, RequestOptions::default()).await
    }

    /// Fetch the menu tree visible to `role`.
    pub async fn menu(&self, role: &str) -> Result<Value, Error> {
        self.get(MENU, RequestOptions::default().header(USER_ROLE_HEADER, role))
            .await
    }

    // ── Auth ─────────────────────────────────────────────────────────

    /// Submit a PIN. A `{success: false}` reply is a successful call; only
    /// transport, HTTP and envelope failures are errors.
    pub async fn login(&self, pin: &SecretString) -> Result<LoginResponse, Error> {
        let body = LoginRequest {
            pin: pin.expose_secret(),
        };
        self.post_json(LOGIN, &body, RequestOptions::default()).await
    }
}
