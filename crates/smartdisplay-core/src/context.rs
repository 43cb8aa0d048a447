// ── Application context ──
//
// Everything a controller needs, bundled once and passed explicitly.

use std::sync::Arc;

use smartdisplay_api::ApiClient;
use tracing::debug;

use crate::auth::AuthState;
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::provider::FailurePolicy;
use crate::router::Router;
use crate::session::SessionStorage;
use crate::store::{PollingStore, partial, slices};

struct ContextInner {
    config: CoreConfig,
    api: ApiClient,
    store: PollingStore,
    session: Arc<SessionStorage>,
    router: Router,
}

/// Shared handle to the API client, state store, session and router.
///
/// Cheaply cloneable. The store starts with `authState` set to guest and
/// the router at the login view.
#[derive(Clone)]
pub struct AppContext {
    inner: Arc<ContextInner>,
}

impl AppContext {
    /// Build the API client from `config` and wire everything together.
    pub fn new(config: CoreConfig) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.base_url.as_str(), &config.transport())?;
        Ok(Self::with_client(config, api))
    }

    /// Use a pre-built client.
    pub fn with_client(config: CoreConfig, api: ApiClient) -> Self {
        let store = PollingStore::new();
        store.seed(partial(slices::AUTH, AuthState::guest().to_value()));
        debug!(backend = %config.base_url, "application context ready");

        Self {
            inner: Arc::new(ContextInner {
                config,
                api,
                store,
                session: Arc::new(SessionStorage::new()),
                router: Router::new(),
            }),
        }
    }

    pub fn config(&self) -> &CoreConfig {
        &self.inner.config
    }

    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    pub fn store(&self) -> &PollingStore {
        &self.inner.store
    }

    pub fn session(&self) -> &SessionStorage {
        &self.inner.session
    }

    pub(crate) fn session_handle(&self) -> Arc<SessionStorage> {
        Arc::clone(&self.inner.session)
    }

    pub fn router(&self) -> &Router {
        &self.inner.router
    }

    /// Failure policy built from the configured threshold.
    pub fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::new(self.inner.config.failure_threshold)
    }

    /// Start the polling timer at the configured period.
    pub async fn start_polling(&self) {
        self.inner.store.start(self.inner.config.poll_interval).await;
    }

    /// Current `authState` slice.
    pub fn auth_state(&self) -> AuthState {
        self.inner
            .store
            .slice_as(slices::AUTH)
            .unwrap_or_default()
    }
}
