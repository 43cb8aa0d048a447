use std::sync::Arc;

use serde_json::{Value, json};
use tokio::sync::watch;

use crate::auth::Role;
use crate::context::AppContext;
use crate::error::CoreError;
use crate::provider::{LinkHealth, PollingProvider};
use crate::store::{ProviderId, slices};

/// Owns `menuState`. The menu is role-filtered by the backend, so every
/// fetch carries the session role in `X-User-Role`.
pub struct MenuController {
    ctx: AppContext,
    provider: Arc<PollingProvider>,
}

impl MenuController {
    pub fn new(ctx: AppContext) -> Self {
        let api = ctx.api().clone();
        let session = ctx.session_handle();
        let provider = PollingProvider::new("menu", slices::MENU, move || {
            let api = api.clone();
            let role = session.role();
            async move { api.menu(<&'static str>::from(role)).await }
        })
        .normalize_with(normalize_menu)
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
        self.ctx.store().slice(slices::MENU)
    }

    /// Fetch the menu for `role`, or the session role when `None`.
    pub async fn load(&self, role: Option<Role>) -> Result<Value, CoreError> {
        let role = role.unwrap_or_else(|| self.ctx.session().role());
        let state = normalize_menu(self.ctx.api().menu(<&'static str>::from(role)).await?)?;
        self.ctx
            .store()
            .update_slice(slices::MENU, |_| state.clone())
            .await;
        Ok(state)
    }
}

/// Bare arrays are wrapped as `{"items": [...]}`.
fn normalize_menu(value: Value) -> Result<Value, CoreError> {
    match value {
        Value::Object(_) => Ok(value),
        Value::Array(items) => Ok(json!({ "items": items })),
        _ => Err(CoreError::InvalidPayload {
            slice: slices::MENU.to_owned(),
            reason: "expected an object or an array".to_owned(),
        }),
    }
}
