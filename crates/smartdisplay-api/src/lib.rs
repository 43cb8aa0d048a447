//! Async client for the smart display REST backend.
//!
//! Every call gets a process-unique request ID, a per-request timeout raced
//! against the exchange, and a single normalized [`Error`] on failure. The
//! backend's `{error, code?, details?, data?}` envelope is classified once at
//! the boundary into an [`Envelope`], so callers never sniff fields.
//!
//! - **[`ApiClient`]**: `get` / `post` plus typed endpoint wrappers
//!   (`alarm_state`, `login`, ...).
//! - **[`TransportConfig`]**: TLS, default timeout and user agent for the
//!   underlying `reqwest::Client`.
//! - **[`Error`] / [`ErrorKind`]**: `TIMEOUT`, `PARSE_ERROR`, `HTTP_ERROR`,
//!   `NETWORK_ERROR`, `API_ERROR`.

pub mod client;
pub mod endpoints;
pub mod envelope;
pub mod error;
pub mod request;
pub mod transport;

pub use client::ApiClient;
pub use endpoints::{AlarmAction, LoginResponse};
pub use envelope::{Envelope, ErrorEnvelope};
pub use error::{ClientBuildError, Error, ErrorKind};
pub use request::{Method, RequestId, RequestOptions};
pub use transport::{TlsMode, TransportConfig};
