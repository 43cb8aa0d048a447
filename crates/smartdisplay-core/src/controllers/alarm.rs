use std::sync::Arc;

use serde_json::Value;
use smartdisplay_api::AlarmAction;
use strum::{Display, EnumString};
use tokio::sync::watch;
use tracing::info;

use super::normalize_object;
use crate::context::AppContext;
use crate::error::CoreError;
use crate::provider::{LinkHealth, PollingProvider};
use crate::store::{ProviderId, slices};

/// Arming modes offered on the alarm panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ArmMode {
    Home,
    Away,
    Night,
}

impl From<ArmMode> for AlarmAction {
    fn from(mode: ArmMode) -> Self {
        match mode {
            ArmMode::Home => AlarmAction::ArmHome,
            ArmMode::Away => AlarmAction::ArmAway,
            ArmMode::Night => AlarmAction::ArmNight,
        }
    }
}

/// Owns `alarmState`.
pub struct AlarmController {
    ctx: AppContext,
    provider: Arc<PollingProvider>,
}

impl AlarmController {
    pub fn new(ctx: AppContext) -> Self {
        let api = ctx.api().clone();
        let provider = PollingProvider::new("alarm", slices::ALARM, move || {
            let api = api.clone();
            async move { api.alarm_state().await }
        })
        .normalize_with(|v| normalize_object(slices::ALARM, v))
        .policy(ctx.failure_policy());

        Self {
            ctx,
            provider: Arc::new(provider),
        }
    }

    /// Register the alarm provider with the store.
    pub fn attach(&self) -> ProviderId {
        self.ctx.store().register_arc(self.provider.clone())
    }

    pub fn health(&self) -> watch::Receiver<LinkHealth> {
        self.provider.health()
    }

    pub fn state(&self) -> Option<Value> {
        self.ctx.store().slice(slices::ALARM)
    }

    /// Fetch now, store the result and return it. Errors propagate.
    pub async fn load(&self) -> Result<Value, CoreError> {
        let state = normalize_object(slices::ALARM, self.ctx.api().alarm_state().await?)?;
        self.ctx
            .store()
            .update_slice(slices::ALARM, |_| state.clone())
            .await;
        Ok(state)
    }

    pub async fn arm(&self, mode: ArmMode) -> Result<Value, CoreError> {
        self.act(mode.into()).await
    }

    pub async fn disarm(&self) -> Result<Value, CoreError> {
        self.act(AlarmAction::Disarm).await
    }

    async fn act(&self, action: AlarmAction) -> Result<Value, CoreError> {
        let payload = self.ctx.api().alarm_action(action).await?;
        info!(%action, "alarm action accepted");

        if let Value::Object(fields) = &payload {
            self.ctx
                .store()
                .update_slice(slices::ALARM, |current| {
                    let mut merged = match current {
                        Some(Value::Object(existing)) => existing.clone(),
                        _ => serde_json::Map::new(),
                    };
                    for (k, v) in fields {
                        merged.insert(k.clone(), v.clone());
                    }
                    Value::Object(merged)
                })
                .await;
        }
        Ok(payload)
    }
}
