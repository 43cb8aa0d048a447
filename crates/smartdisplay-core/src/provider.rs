// ── Polling providers ──
//
// A provider is what the store calls once per cycle to refresh a slice.
// `PollingProvider` is the one generic implementation controllers use:
// they hand it a fetch function and a normalizer, and it owns failure
// counting and the degraded-connection signal.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::DEFAULT_FAILURE_THRESHOLD;
use crate::error::CoreError;
use crate::store::{PartialState, partial};

/// Boxed future returned by [`StateProvider::poll`].
pub type ProviderFuture =
    Pin<Box<dyn Future<Output = Result<Option<PartialState>, CoreError>> + Send>>;

/// Something the polling store invokes once per cycle.
///
/// `Ok(None)` means "no update this cycle". An `Err` (or a panic) is caught
/// by the store and treated the same as `Ok(None)`.
pub trait StateProvider: Send + Sync + 'static {
    fn name(&self) -> &str;

    fn poll(&self) -> ProviderFuture;
}

// ── Closure providers ────────────────────────────────────────────────

/// Adapter turning an async closure into a [`StateProvider`].
pub struct FnProvider<F> {
    name: String,
    f: F,
}

/// Wrap an async closure as a provider.
pub fn provider_fn<F, Fut>(name: impl Into<String>, f: F) -> FnProvider<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<PartialState>, CoreError>> + Send + 'static,
{
    FnProvider {
        name: name.into(),
        f,
    }
}

impl<F, Fut> StateProvider for FnProvider<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Option<PartialState>, CoreError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&self) -> ProviderFuture {
        Box::pin((self.f)())
    }
}

// ── Failure policy ───────────────────────────────────────────────────

/// When to raise the degraded-connection signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailurePolicy {
    /// Consecutive failures that raise the signal. Clamped to at least 1.
    pub threshold: u32,
}

impl FailurePolicy {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
        }
    }
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FAILURE_THRESHOLD)
    }
}

/// Advisory connection health for one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkHealth {
    Healthy,
    /// Raised once when the failure streak reached the threshold.
    Degraded { consecutive_failures: u32 },
}

impl LinkHealth {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded { .. })
    }
}

/// Consecutive-failure counter plus the health signal it drives.
struct FailureTracker {
    consecutive: AtomicU32,
    health: watch::Sender<LinkHealth>,
}

impl FailureTracker {
    fn new() -> Self {
        let (health, _) = watch::channel(LinkHealth::Healthy);
        Self {
            consecutive: AtomicU32::new(0),
            health,
        }
    }

    fn record_success(&self, provider: &str) {
        self.consecutive.store(0, Ordering::SeqCst);
        let cleared = self.health.send_if_modified(|h| {
            if h.is_degraded() {
                *h = LinkHealth::Healthy;
                true
            } else {
                false
            }
        });
        if cleared {
            info!(provider, "connection restored");
        }
    }

    /// Returns the new streak length.
    fn record_failure(&self, provider: &str, policy: FailurePolicy) -> u32 {
        let streak = self.consecutive.fetch_add(1, Ordering::SeqCst).saturating_add(1);
        let raised = self.health.send_if_modified(|h| {
            if streak >= policy.threshold && !h.is_degraded() {
                *h = LinkHealth::Degraded {
                    consecutive_failures: streak,
                };
                true
            } else {
                false
            }
        });
        if raised {
            warn!(provider, consecutive_failures = streak, "connection degraded");
        }
        streak
    }
}

// ── PollingProvider ──────────────────────────────────────────────────

type FetchFn =
    Arc<dyn Fn() -> Pin<Box<dyn Future<Output = Result<Value, CoreError>> + Send>> + Send + Sync>;
type NormalizeFn = Arc<dyn Fn(Value) -> Result<Value, CoreError> + Send + Sync>;

/// Generic provider for one slice: fetch, normalize, publish.
///
/// Failures never reach the store: they are counted, logged at `debug`,
/// and turned into "no update". Crossing the policy threshold flips the
/// [`health`](Self::health) signal to degraded exactly once; the next
/// success clears it.
pub struct PollingProvider {
    name: String,
    slice: String,
    fetch: FetchFn,
    normalize: NormalizeFn,
    policy: FailurePolicy,
    tracker: Arc<FailureTracker>,
}

impl PollingProvider {
    pub fn new<F, Fut, E>(name: impl Into<String>, slice: impl Into<String>, fetch: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Value, E>> + Send + 'static,
        E: Into<CoreError> + Send + 'static,
    {
        let fetch: FetchFn = Arc::new(move || {
            let fut = fetch();
            Box::pin(async move { fut.await.map_err(Into::into) })
        });
        Self {
            name: name.into(),
            slice: slice.into(),
            fetch,
            normalize: Arc::new(Ok),
            policy: FailurePolicy::default(),
            tracker: Arc::new(FailureTracker::new()),
        }
    }

    /// Replace the identity normalizer.
    pub fn normalize_with(
        mut self,
        normalize: impl Fn(Value) -> Result<Value, CoreError> + Send + Sync + 'static,
    ) -> Self {
        self.normalize = Arc::new(normalize);
        self
    }

    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn slice(&self) -> &str {
        &self.slice
    }

    /// Subscribe to the degraded-connection signal.
    pub fn health(&self) -> watch::Receiver<LinkHealth> {
        self.tracker.health.subscribe()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.tracker.consecutive.load(Ordering::SeqCst)
    }
}

impl StateProvider for PollingProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn poll(&self) -> ProviderFuture {
        let name = self.name.clone();
        let slice = self.slice.clone();
        let fetch = Arc::clone(&self.fetch);
        let normalize = Arc::clone(&self.normalize);
        let tracker = Arc::clone(&self.tracker);
        let policy = self.policy;

        Box::pin(async move {
            let outcome = match fetch().await {
                Ok(raw) => normalize(raw),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(value) => {
                    tracker.record_success(&name);
                    Ok(Some(partial(&slice, value)))
                }
                Err(e) => {
                    let streak = tracker.record_failure(&name, policy);
                    debug!(provider = %name, consecutive_failures = streak, error = %e, "poll failed");
                    Ok(None)
                }
            }
        })
    }
}
