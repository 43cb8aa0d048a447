// ── Per-request identity and options ──
//
// A request ID is minted for every call and travels in the `X-Request-ID`
// header and every log line for that call.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

/// Process-wide counter backing [`RequestId::generate`].
static NEXT_REQUEST: AtomicU64 = AtomicU64::new(1);

// ── RequestId ───────────────────────────────────────────────────────

/// Identifier attached to a single outbound request.
///
/// Format: `req-<counter>-<8 hex>`. The monotonic counter makes IDs unique
/// for the lifetime of the process; the random suffix keeps them
/// distinguishable across restarts in backend logs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub fn generate() -> Self {
        let seq = NEXT_REQUEST.fetch_add(1, Ordering::Relaxed);
        let salt = Uuid::new_v4().simple().to_string();
        Self(format!("req-{seq}-{}", &salt[..8]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Method ──────────────────────────────────────────────────────────

/// HTTP methods the backend contract uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

// ── RequestOptions ──────────────────────────────────────────────────

/// Callback fired when a request times out, before the call fails.
///
/// Receives the request ID and the endpoint as the caller passed it.
pub type TimeoutHook = Arc<dyn Fn(&RequestId, &str) + Send + Sync>;

/// Per-call overrides.
#[derive(Clone, Default)]
pub struct RequestOptions {
    /// Overrides the client's default timeout.
    pub timeout: Option<Duration>,
    /// Extra headers. A caller `Accept` replaces the default one; a caller
    /// `X-Request-ID` is ignored. Repeating any other name sends every value.
    pub headers: Vec<(String, String)>,
    pub on_timeout: Option<TimeoutHook>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Whether a caller header named `name` (case-insensitive) is set.
    pub(crate) fn sets_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(n, _)| n.eq_ignore_ascii_case(name))
    }

    pub fn on_timeout(mut self, hook: impl Fn(&RequestId, &str) + Send + Sync + 'static) -> Self {
        self.on_timeout = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for RequestOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestOptions")
            .field("timeout", &self.timeout)
            .field("headers", &self.headers)
            .field("on_timeout", &self.on_timeout.is_some())
            .finish()
    }
}
