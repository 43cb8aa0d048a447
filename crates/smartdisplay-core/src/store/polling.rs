// ── Polling store ──
//
// Owns the shared state and the registered providers. A cycle runs every
// provider on its own task, waits for all of them, then merges the
// partial updates in registration order and notifies subscribers once.
// Merge+notify is single-writer: it always happens under `cycle_lock`
// through `watch::Sender::send_modify`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::de::DeserializeOwned;
use serde_json::Value;
use strum::{Display, IntoStaticStr};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::state::{PartialState, SharedState, StateChange};
use super::subscription::StateSubscription;
use crate::provider::StateProvider;

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Handle returned by [`PollingStore::register`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProviderId(u64);

/// Whether a cycle is currently in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum PollPhase {
    Idle,
    Polling,
}

/// Outcome of one poll cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Cycle number, `None` when the results were discarded.
    pub cycle: Option<u64>,
    /// Providers invoked.
    pub providers: usize,
    /// Providers that returned an update.
    pub updated: usize,
    /// Providers that errored or panicked.
    pub failed: usize,
    /// Slice names written by the merge.
    pub updated_keys: Vec<String>,
    /// True when `confirm_stop` landed while the cycle was in flight.
    pub discarded: bool,
}

#[derive(Clone)]
struct Registration {
    id: ProviderId,
    provider: Arc<dyn StateProvider>,
}

struct PollTimer {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Default)]
struct TimerSlot {
    active: Option<PollTimer>,
    /// Stopped timer tasks that may still be finishing a cycle.
    draining: Vec<JoinHandle<()>>,
}

impl TimerSlot {
    /// Forget timer tasks that already exited.
    fn prune(&mut self) {
        self.draining.retain(|h| !h.is_finished());
    }
}

/// Marks a cycle in flight for as long as it lives, so an aborted cycle
/// still returns the phase to `Idle`.
struct CycleGuard<'a> {
    store: &'a PollingStore,
}

impl<'a> CycleGuard<'a> {
    fn enter(store: &'a PollingStore) -> Self {
        if store.inner.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            store.inner.phase.send_replace(PollPhase::Polling);
        }
        Self { store }
    }
}

impl Drop for CycleGuard<'_> {
    fn drop(&mut self) {
        if self.store.inner.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.store.inner.phase.send_replace(PollPhase::Idle);
        }
    }
}

struct StoreInner {
    state: watch::Sender<Arc<SharedState>>,
    changes: broadcast::Sender<Arc<StateChange>>,
    phase: watch::Sender<PollPhase>,
    providers: ArcSwap<Vec<Registration>>,
    next_provider: AtomicU64,
    cycle_lock: Mutex<()>,
    cycles: AtomicU64,
    in_flight: AtomicUsize,
    /// Bumped by `confirm_stop`; cycles started under an older value are
    /// discarded.
    generation: AtomicU64,
    timer: Mutex<TimerSlot>,
    last_cycle: watch::Sender<Option<DateTime<Utc>>>,
}

/// Reactive store driven by periodic provider polling.
///
/// Cheaply cloneable; all clones share the same state, providers and timer.
#[derive(Clone)]
pub struct PollingStore {
    inner: Arc<StoreInner>,
}

impl PollingStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(Arc::new(SharedState::new()));
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        let (phase, _) = watch::channel(PollPhase::Idle);
        let (last_cycle, _) = watch::channel(None);

        Self {
            inner: Arc::new(StoreInner {
                state,
                changes,
                phase,
                providers: ArcSwap::from_pointee(Vec::new()),
                next_provider: AtomicU64::new(1),
                cycle_lock: Mutex::new(()),
                cycles: AtomicU64::new(0),
                in_flight: AtomicUsize::new(0),
                generation: AtomicU64::new(0),
                timer: Mutex::new(TimerSlot::default()),
                last_cycle,
            }),
        }
    }

    // ── Providers ────────────────────────────────────────────────────

    /// Register a provider. It participates from the next cycle on.
    pub fn register(&self, provider: impl StateProvider) -> ProviderId {
        self.register_arc(Arc::new(provider))
    }

    pub fn register_arc(&self, provider: Arc<dyn StateProvider>) -> ProviderId {
        let id = ProviderId(self.inner.next_provider.fetch_add(1, Ordering::Relaxed));
        debug!(provider = provider.name(), "registering provider");
        self.inner.providers.rcu(|current| {
            let mut next: Vec<Registration> = current.iter().cloned().collect();
            next.push(Registration {
                id,
                provider: Arc::clone(&provider),
            });
            next
        });
        id
    }

    /// Remove a provider. Returns false if `id` was not registered.
    pub fn unregister(&self, id: ProviderId) -> bool {
        let mut removed = false;
        self.inner.providers.rcu(|current| {
            removed = current.iter().any(|r| r.id == id);
            current
                .iter()
                .filter(|r| r.id != id)
                .cloned()
                .collect::<Vec<_>>()
        });
        removed
    }

    pub fn provider_count(&self) -> usize {
        self.inner.providers.load().len()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> Arc<SharedState> {
        self.inner.state.borrow().clone()
    }

    pub fn slice(&self, key: &str) -> Option<Value> {
        self.inner.state.borrow().get(key).cloned()
    }

    pub fn slice_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.inner.state.borrow().get_as(key)
    }

    pub fn phase(&self) -> PollPhase {
        *self.inner.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<PollPhase> {
        self.inner.phase.subscribe()
    }

    /// Per-merge change notifications.
    pub fn subscribe(&self) -> StateSubscription {
        StateSubscription::new(self.inner.changes.subscribe())
    }

    /// Latest-value view of the whole state.
    pub fn watch_state(&self) -> watch::Receiver<Arc<SharedState>> {
        self.inner.state.subscribe()
    }

    pub fn cycles_completed(&self) -> u64 {
        self.inner.cycles.load(Ordering::SeqCst)
    }

    pub fn last_cycle_at(&self) -> Option<DateTime<Utc>> {
        *self.inner.last_cycle.borrow()
    }

    /// Time since the last merged cycle.
    pub fn data_age(&self) -> Option<chrono::Duration> {
        self.last_cycle_at().map(|t| Utc::now() - t)
    }

    // ── Writes ───────────────────────────────────────────────────────

    /// Initial value, written without notifying anyone.
    pub(crate) fn seed(&self, update: PartialState) {
        self.inner.state.send_modify(|state| {
            Arc::make_mut(state).merge(update);
        });
    }

    /// Merge `update` directly and notify subscribers.
    pub async fn set_state(&self, update: PartialState) -> Vec<String> {
        let _guard = self.inner.cycle_lock.lock().await;
        self.merge_and_notify(None, vec![update])
    }

    /// Replace one slice with a value derived from its current one, as a
    /// single serialized write.
    pub async fn update_slice(
        &self,
        slice: &str,
        f: impl FnOnce(Option<&Value>) -> Value,
    ) -> Vec<String> {
        let _guard = self.inner.cycle_lock.lock().await;
        let next = f(self.inner.state.borrow().get(slice));
        let mut update = PartialState::new();
        update.insert(slice.to_owned(), next);
        self.merge_and_notify(None, vec![update])
    }

    /// Run one poll cycle now.
    pub async fn refresh(&self) -> CycleReport {
        let generation = self.inner.generation.load(Ordering::SeqCst);
        let registrations = self.inner.providers.load_full();

        let _cycle = CycleGuard::enter(self);

        let handles: Vec<_> = registrations
            .iter()
            .map(|r| {
                let provider = Arc::clone(&r.provider);
                tokio::spawn(async move { provider.poll().await })
            })
            .collect();
        let results = join_all(handles).await;

        let mut report = CycleReport {
            providers: registrations.len(),
            ..CycleReport::default()
        };
        let mut updates = Vec::with_capacity(results.len());
        for (registration, result) in registrations.iter().zip(results) {
            let name = registration.provider.name();
            match result {
                Ok(Ok(Some(update))) => {
                    report.updated += 1;
                    updates.push(update);
                }
                Ok(Ok(None)) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    debug!(provider = name, error = %e, "provider failed");
                }
                Err(join_err) => {
                    report.failed += 1;
                    warn!(provider = name, error = %join_err, "provider panicked");
                }
            }
        }

        {
            let _guard = self.inner.cycle_lock.lock().await;
            if self.inner.generation.load(Ordering::SeqCst) == generation {
                let cycle = self.inner.cycles.fetch_add(1, Ordering::SeqCst) + 1;
                report.cycle = Some(cycle);
                report.updated_keys = self.merge_and_notify(Some(cycle), updates);
                self.inner.last_cycle.send_replace(Some(Utc::now()));
                debug!(
                    cycle,
                    providers = report.providers,
                    failed = report.failed,
                    updated = ?report.updated_keys,
                    "poll cycle merged"
                );
            } else {
                report.discarded = true;
                debug!(providers = report.providers, "poll cycle discarded after stop");
            }
        }

        report
    }

    /// Must be called with `cycle_lock` held.
    fn merge_and_notify(&self, cycle: Option<u64>, updates: Vec<PartialState>) -> Vec<String> {
        let changes = &self.inner.changes;
        let mut written = Vec::new();
        self.inner.state.send_modify(|state| {
            let next = Arc::make_mut(state);
            for update in updates {
                for key in next.merge(update) {
                    if !written.contains(&key) {
                        written.push(key);
                    }
                }
            }
            // No receivers is fine.
            let _ = changes.send(Arc::new(StateChange {
                cycle,
                updated: written.clone(),
                state: Arc::clone(state),
                at: Utc::now(),
            }));
        });
        written
    }


    // ── Timer ────────────────────────────────────────────────────────

    /// Start the periodic timer. The first cycle runs immediately.
    ///
    /// Calling `start` while running replaces the period.
    pub async fn start(&self, period: Duration) {
        let mut slot = self.inner.timer.lock().await;
        slot.prune();
        if let Some(previous) = slot.active.take() {
            previous.cancel.cancel();
            slot.draining.push(previous.handle);
        }
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(poll_task(self.clone(), period, cancel.clone()));
        slot.active = Some(PollTimer { cancel, handle });
        info!(period_ms = %period.as_millis(), "polling started");
    }

    /// Stop scheduling new cycles. An in-flight cycle keeps running and is
    /// merged unless [`confirm_stop`](Self::confirm_stop) lands first.
    pub async fn stop(&self) {
        let mut slot = self.inner.timer.lock().await;
        slot.prune();
        if let Some(timer) = slot.active.take() {
            timer.cancel.cancel();
            slot.draining.push(timer.handle);
            info!("polling stopped");
        }
    }

    /// Discard the results of every cycle still in flight.
    pub fn confirm_stop(&self) {
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub async fn is_running(&self) -> bool {
        self.inner.timer.lock().await.active.is_some()
    }

    /// Stop, discard in-flight results and abort the timer tasks.
    ///
    /// In-flight cycles are cancelled rather than awaited: their results
    /// would be discarded anyway.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.confirm_stop();
        let draining = std::mem::take(&mut self.inner.timer.lock().await.draining);
        for handle in &draining {
            handle.abort();
        }
        for handle in draining {
            if let Some(e) = handle.await.err().filter(tokio::task::JoinError::is_panic) {
                warn!(error = %e, "poll task ended abnormally");
            }
        }
    }
}

impl Default for PollingStore {
    fn default() -> Self {
        Self::new()
    }
}

async fn poll_task(store: PollingStore, period: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                let report = store.refresh().await;
                if report.failed > 0 {
                    debug!(failed = report.failed, cycle = ?report.cycle, "poll cycle had failures");
                }
            }
        }
    }
    debug!("poll task exited");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::error::CoreError;
    use crate::provider::provider_fn;
    use crate::store::partial;

    fn constant(name: &'static str, slice: &'static str, value: Value) -> impl StateProvider {
        provider_fn(name, move || {
            let value = value.clone();
            async move { Ok(Some(partial(slice, value))) }
        })
    }

    #[tokio::test]
    async fn two_providers_merge() {
        let store = PollingStore::new();
        store.register(constant("a", "a", json!(1)));
        store.register(constant("b", "b", json!(2)));

        let report = store.refresh().await;

        assert_eq!(report.cycle, Some(1));
        assert_eq!(report.updated, 2);
        assert_eq!(report.failed, 0);
        assert_eq!(
            serde_json::to_value(&*store.snapshot()).unwrap(),
            json!({"a": 1, "b": 2})
        );
    }

    #[tokio::test]
    async fn failing_and_panicking_providers_do_not_abort_the_cycle() {
        let store = PollingStore::new();
        store.register(provider_fn("err", || async {
            Err(CoreError::Internal("boom".into()))
        }));
        store.register(provider_fn("panic", || async {
            let blow_up = true;
            if blow_up {
                panic!("provider blew up");
            }
            Ok(None)
        }));
        store.register(constant("ok", "ok", json!(true)));

        let report = store.refresh().await;

        assert_eq!(report.failed, 2);
        assert_eq!(report.updated_keys, vec!["ok".to_owned()]);
        assert_eq!(store.slice("ok"), Some(json!(true)));
        assert_eq!(store.phase(), PollPhase::Idle);
    }

    #[tokio::test]
    async fn last_registered_wins_on_collision() {
        let store = PollingStore::new();
        store.register(constant("first", "shared", json!("first")));
        store.register(constant("second", "shared", json!("second")));

        let report = store.refresh().await;

        assert_eq!(store.slice("shared"), Some(json!("second")));
        assert_eq!(report.updated_keys, vec!["shared".to_owned()]);
    }

    #[tokio::test]
    async fn one_notification_per_cycle() {
        let store = PollingStore::new();
        store.register(constant("a", "a", json!(1)));
        store.register(constant("b", "b", json!(2)));
        let mut sub = store.subscribe();

        store.refresh().await;

        let change = sub.next().await.unwrap();
        assert_eq!(change.cycle, Some(1));
        assert!(change.touches("a") && change.touches("b"));
        assert!(sub.try_next().is_none());
    }

    #[tokio::test]
    async fn set_state_merges_and_notifies() {
        let store = PollingStore::new();
        let mut sub = store.subscribe();

        store.set_state(partial("authState", json!({"authenticated": false}))).await;

        let change = sub.next().await.unwrap();
        assert_eq!(change.cycle, None);
        assert_eq!(change.updated, vec!["authState".to_owned()]);
        assert_eq!(store.cycles_completed(), 0);
    }

    #[tokio::test]
    async fn update_slice_sees_current_value() {
        let store = PollingStore::new();
        store.set_state(partial("count", json!(1))).await;

        store
            .update_slice("count", |v| json!(v.and_then(Value::as_u64).unwrap_or(0) + 1))
            .await;

        assert_eq!(store.slice_as::<u64>("count"), Some(2));
    }

    #[tokio::test]
    async fn unregister_removes_provider() {
        let store = PollingStore::new();
        let id = store.register(constant("a", "a", json!(1)));
        assert!(store.unregister(id));
        assert!(!store.unregister(id));

        let report = store.refresh().await;
        assert_eq!(report.providers, 0);
        assert!(store.slice("a").is_none());
    }

    #[tokio::test]
    async fn empty_cycle_still_notifies() {
        let store = PollingStore::new();
        store.register(provider_fn("quiet", || async { Ok(None) }));
        let mut sub = store.subscribe();

        store.refresh().await;

        let change = sub.next().await.unwrap();
        assert!(change.updated.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn restarting_the_timer_does_not_accumulate_handles() {
        let store = PollingStore::new();
        store.register(constant("a", "a", json!(1)));

        for _ in 0..100 {
            store.start(Duration::from_secs(3)).await;
            store.stop().await;
        }
        tokio::time::sleep(Duration::from_secs(1)).await;
        store.start(Duration::from_secs(3)).await;
        store.stop().await;

        assert!(store.inner.timer.lock().await.draining.len() <= 1);
        store.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_a_slow_cycle() {
        let store = PollingStore::new();
        store.register(provider_fn("slow", || async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Some(partial("slow", json!(true))))
        }));

        let mut phase = store.watch_phase();
        store.start(Duration::from_secs(3)).await;
        phase.wait_for(|p| *p == PollPhase::Polling).await.unwrap();

        tokio::time::timeout(Duration::from_secs(1), store.shutdown())
            .await
            .expect("shutdown should not wait for the slow provider");

        assert_eq!(store.phase(), PollPhase::Idle);
        assert!(!store.is_running().await);
        assert_eq!(store.slice("slow"), None);
    }
}
