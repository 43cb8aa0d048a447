use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::envelope::{Envelope, ErrorEnvelope};
use crate::request::RequestId;

/// Failure taxonomy for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display, strum::IntoStaticStr)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The timer fired before the exchange completed.
    Timeout,
    /// The body was not valid JSON (or not the expected shape).
    ParseError,
    /// Status outside `200..300`.
    HttpError,
    /// No response: connect failure, DNS, reset, invalid URL.
    NetworkError,
    /// 2xx response carrying an error envelope.
    ApiError,
}

/// Normalized error produced for every failed request.
///
/// Callers branch on [`kind`](Self::kind), never on transport-specific
/// error types. The raw transport error, when there is one, is kept as the
/// `source` for diagnostics.
#[derive(Debug, Error)]
#[error("{kind} [{request_id}] {endpoint}: {message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub request_id: RequestId,
    pub endpoint: String,
    pub message: String,
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    pub status_text: Option<String>,
    /// Backend error code from the envelope.
    pub code: Option<String>,
    pub details: Option<Value>,
    pub data: Option<Value>,
    /// Parsed response body, when one was received and parseable.
    pub body: Option<Value>,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    fn bare(kind: ErrorKind, request_id: &RequestId, endpoint: &str, message: String) -> Self {
        Self {
            kind,
            request_id: request_id.clone(),
            endpoint: endpoint.to_owned(),
            message,
            status: None,
            status_text: None,
            code: None,
            details: None,
            data: None,
            body: None,
            source: None,
        }
    }

    pub(crate) fn timeout(request_id: &RequestId, endpoint: &str, after: Duration) -> Self {
        Self::bare(
            ErrorKind::Timeout,
            request_id,
            endpoint,
            format!("request timed out after {}ms", after.as_millis()),
        )
    }

    pub(crate) fn network(
        request_id: &RequestId,
        endpoint: &str,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        let mut err = Self::bare(ErrorKind::NetworkError, request_id, endpoint, message.into());
        err.source = Some(Box::new(source));
        err
    }

    pub(crate) fn parse(
        request_id: &RequestId,
        endpoint: &str,
        status: u16,
        source: serde_json::Error,
        raw: &str,
    ) -> Self {
        let preview: String = raw.chars().take(200).collect();
        let mut err = Self::bare(
            ErrorKind::ParseError,
            request_id,
            endpoint,
            format!("invalid JSON response: {source} (body preview: {preview:?})"),
        );
        err.status = Some(status);
        err.source = Some(Box::new(source));
        err
    }

    /// The body parsed as JSON but did not match the caller's type.
    pub(crate) fn decode(
        request_id: &RequestId,
        endpoint: &str,
        source: serde_json::Error,
        body: Value,
    ) -> Self {
        let mut err = Self::bare(
            ErrorKind::ParseError,
            request_id,
            endpoint,
            format!("unexpected response shape: {source}"),
        );
        err.body = Some(body);
        err.source = Some(Box::new(source));
        err
    }

    /// The request body could not be serialized; nothing was sent.
    pub(crate) fn encode(request_id: &RequestId, endpoint: &str, source: serde_json::Error) -> Self {
        let mut err = Self::bare(
            ErrorKind::ParseError,
            request_id,
            endpoint,
            format!("request body could not be encoded: {source}"),
        );
        err.source = Some(Box::new(source));
        err
    }

    pub(crate) fn http(
        request_id: &RequestId,
        endpoint: &str,
        status: reqwest::StatusCode,
        body: Option<Value>,
    ) -> Self {
        let status_text = status.canonical_reason().unwrap_or("Unknown").to_owned();
        let mut err = Self::bare(
            ErrorKind::HttpError,
            request_id,
            endpoint,
            format!("HTTP {} {status_text}", status.as_u16()),
        );
        // An error envelope on a non-2xx body refines the message.
        if let Some(Envelope::Failure(env)) = body.clone().map(Envelope::classify) {
            err.message = format!("HTTP {}: {}", status.as_u16(), env.error);
            err.code = env.code;
            err.details = env.details;
            err.data = env.data;
        }
        err.status = Some(status.as_u16());
        err.status_text = Some(status_text);
        err.body = body;
        err
    }

    pub(crate) fn api(
        request_id: &RequestId,
        endpoint: &str,
        status: u16,
        envelope: ErrorEnvelope,
        body: Value,
    ) -> Self {
        let mut err = Self::bare(ErrorKind::ApiError, request_id, endpoint, envelope.error);
        err.status = Some(status);
        err.code = envelope.code;
        err.details = envelope.details;
        err.data = envelope.data;
        err.body = Some(body);
        err
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ErrorKind::Timeout
    }

    /// Returns `true` for failures a caller might reasonably retry.
    pub fn is_transient(&self) -> bool {
        match self.kind {
            ErrorKind::Timeout | ErrorKind::NetworkError => true,
            ErrorKind::HttpError => self.status.is_some_and(|s| s >= 500),
            ErrorKind::ParseError | ErrorKind::ApiError => false,
        }
    }

    /// Backend error code from the envelope, if any.
    pub fn api_error_code(&self) -> Option<&str> {
        self.code.as_deref()
    }
}

/// Failure while constructing an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
