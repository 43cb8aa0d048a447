// ── Core error types ──
//
// User-facing errors from smartdisplay-core. Transport failures arrive as
// the api crate's normalized `Error` and are folded into a few variants
// here; the original `ErrorKind` stays recoverable through `kind()`.

use serde_json::Value;
use thiserror::Error;

use smartdisplay_api::{ClientBuildError, ErrorKind};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Backend errors ───────────────────────────────────────────────
    #[error("Backend request timed out: {message}")]
    Timeout { message: String, request_id: String },

    #[error("Cannot reach backend: {message}")]
    ConnectionFailed { message: String, request_id: String },

    #[error("Backend error: {message}")]
    Api {
        kind: ErrorKind,
        message: String,
        request_id: String,
        /// HTTP status code (if a response was received).
        status: Option<u16>,
        status_text: Option<String>,
        /// Backend error code from the envelope.
        code: Option<String>,
        /// Envelope `details`, for user-facing feedback.
        details: Option<Value>,
        /// Envelope `data`.
        data: Option<Value>,
        /// Parsed response body, when there was one.
        body: Option<Value>,
    },

    // ── Operation errors ─────────────────────────────────────────────
    #[error("Login rejected: {message}")]
    LoginRejected { message: String },

    #[error("PIN must be exactly {expected} digits")]
    InvalidPin { expected: usize },

    #[error("Invalid {slice} payload: {reason}")]
    InvalidPayload { slice: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The request failure kind, for errors that came from the backend.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Timeout { .. } => Some(ErrorKind::Timeout),
            Self::ConnectionFailed { .. } => Some(ErrorKind::NetworkError),
            Self::Api { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<smartdisplay_api::Error> for CoreError {
    fn from(err: smartdisplay_api::Error) -> Self {
        let request_id = err.request_id.to_string();
        match err.kind {
            ErrorKind::Timeout => CoreError::Timeout {
                message: err.message,
                request_id,
            },
            ErrorKind::NetworkError => CoreError::ConnectionFailed {
                message: err.message,
                request_id,
            },
            kind @ (ErrorKind::ParseError | ErrorKind::HttpError | ErrorKind::ApiError) => {
                CoreError::Api {
                    kind,
                    message: err.message,
                    request_id,
                    status: err.status,
                    status_text: err.status_text,
                    code: err.code,
                    details: err.details,
                    data: err.data,
                    body: err.body,
                }
            }
        }
    }
}

impl From<ClientBuildError> for CoreError {
    fn from(err: ClientBuildError) -> Self {
        CoreError::Config {
            message: err.to_string(),
        }
    }
}
