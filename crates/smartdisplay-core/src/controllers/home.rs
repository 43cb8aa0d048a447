use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;

use super::normalize_object;
use crate::context::AppContext;
use crate::error::CoreError;
use crate::provider::{LinkHealth, PollingProvider};
use crate::store::{ProviderId, slices};

/// Owns `homeState`.
pub struct HomeController {
    ctx: AppContext,
    provider: Arc<PollingProvider>,
}

impl HomeController {
    pub fn new(ctx: AppContext) -> Self {
        let api = ctx.api().clone();
        let provider = PollingProvider::new("home", slices::HOME, move || {
            let api = api.clone();
            async move { api.home_state().await }
        })
        .normalize_with(|v| normalize_object(slices::HOME, v))
        .policy(ctx.failure_policy());

        Self {
            ctx,
            provider: Arc::new(provider),
        }
    }

    pub fn attach(&self) -> ProviderId {
        self.ctx.store().register_arc(self.provider.clone())
    }

    pub fn health(&self) -> watch::Receiver<LinkHealth> {
        self.provider.health()
    }

    pub fn state(&self) -> Option<Value> {
        self.ctx.store().slice(slices::HOME)
    }

    pub async fn load(&self) -> Result<Value, CoreError> {
        let state = normalize_object(slices::HOME, self.ctx.api().home_state().await?)?;
        self.ctx
            .store()
            .update_slice(slices::HOME, |_| state.clone())
            .await;
        Ok(state)
    }
}
