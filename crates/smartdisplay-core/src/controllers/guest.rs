use std::sync::Arc;

use serde_json::Value;
use tokio::sync::watch;
use tracing::info;

use super::normalize_object;
use crate::context::AppContext;
use crate::error::CoreError;
use crate::provider::{LinkHealth, PollingProvider};
use crate::store::{ProviderId, slices};

/// Owns `guestState`: visitor access requests.
pub struct GuestController {
    ctx: AppContext,
    provider: Arc<PollingProvider>,
}

impl GuestController {
    pub fn new(ctx: AppContext) -> Self {
        let api = ctx.api().clone();
        let provider = PollingProvider::new("guest", slices::GUEST, move || {
            let api = api.clone();
            async move { api.guest_state().await }
        })
        .normalize_with(|v| normalize_object(slices::GUEST, v))
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
        self.ctx.store().slice(slices::GUEST)
    }

    pub async fn load(&self) -> Result<Value, CoreError> {
        let state = normalize_object(slices::GUEST, self.ctx.api().guest_state().await?)?;
        self.ctx
            .store()
            .update_slice(slices::GUEST, |_| state.clone())
            .await;
        Ok(state)
    }

    /// Ask the household for entry.
    pub async fn request_access(&self) -> Result<Value, CoreError> {
        let reply = self.ctx.api().guest_request().await?;
        info!("guest access requested");
        Ok(reply)
    }

    pub async fn exit(&self) -> Result<Value, CoreError> {
        let reply = self.ctx.api().guest_exit().await?;
        info!("guest exit recorded");
        Ok(reply)
    }
}
