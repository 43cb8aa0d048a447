//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with
//! actionable help text and distinct exit codes.

use miette::Diagnostic;
use thiserror::Error;

use smartdisplay_api::ErrorKind;
use smartdisplay_config::ConfigError;
use smartdisplay_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
#[allow(dead_code)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the backend: {message}")]
    #[diagnostic(
        code(smartdisplay::connection_failed),
        help(
            "Check that the backend is running and reachable from this machine.\n\
             Request ID: {request_id}"
        )
    )]
    ConnectionFailed { message: String, request_id: String },

    #[error("Request timed out: {message}")]
    #[diagnostic(
        code(smartdisplay::timeout),
        help(
            "Increase the timeout with --timeout (milliseconds) or check backend responsiveness.\n\
             Request ID: {request_id}"
        )
    )]
    Timeout { message: String, request_id: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Login rejected: {message}")]
    #[diagnostic(code(smartdisplay::auth_failed), help("Check the PIN and try again."))]
    AuthFailed { message: String },

    // ── Backend ──────────────────────────────────────────────────────
    #[error("Backend error ({kind}): {message}")]
    #[diagnostic(code(smartdisplay::api_error), help("Request ID: {request_id}"))]
    ApiError {
        kind: ErrorKind,
        message: String,
        code: Option<String>,
        status: Option<u16>,
        request_id: String,
    },

    #[error("Unexpected {slice} payload: {reason}")]
    #[diagnostic(code(smartdisplay::invalid_payload))]
    InvalidPayload { slice: String, reason: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(smartdisplay::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(smartdisplay::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: smartdisplay config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No backend configured")]
    #[diagnostic(
        code(smartdisplay::no_config),
        help(
            "Pass --backend <URL>, or create a config with: smartdisplay config init\n\
             Expected at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error("Config file already exists at {path}")]
    #[diagnostic(
        code(smartdisplay::config_exists),
        help("Use --force to overwrite it.")
    )]
    ConfigExists { path: String },

    #[error("{message}")]
    #[diagnostic(code(smartdisplay::config))]
    Config { message: String },

    // ── Internal ─────────────────────────────────────────────────────
    #[error("Internal error: {0}")]
    #[diagnostic(code(smartdisplay::internal))]
    Internal(String),

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render TOML: {0}")]
    Toml(#[from] toml::ser::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::Validation { .. } | Self::ConfigExists { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Timeout {
                message,
                request_id,
            } => CliError::Timeout {
                message,
                request_id,
            },

            CoreError::ConnectionFailed {
                message,
                request_id,
            } => CliError::ConnectionFailed {
                message,
                request_id,
            },

            CoreError::Api {
                kind,
                message,
                request_id,
                status,
                code,
                ..
            } => CliError::ApiError {
                kind,
                message,
                code,
                status,
                request_id,
            },

            CoreError::LoginRejected { message } => CliError::AuthFailed { message },

            CoreError::InvalidPin { expected } => CliError::Validation {
                field: "pin".into(),
                reason: format!("expected exactly {expected} digits"),
            },

            CoreError::InvalidPayload { slice, reason } => {
                CliError::InvalidPayload { slice, reason }
            }

            CoreError::Config { message } => CliError::Config { message },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            ConfigError::Serialization(e) => CliError::Toml(e),
            other => CliError::Config {
                message: other.to_string(),
            },
        }
    }
}
