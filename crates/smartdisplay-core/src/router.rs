// ── View routing ──

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};
use tokio::sync::watch;
use tracing::debug;

/// Screens of the kiosk UI.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum View {
    #[default]
    Login,
    Home,
    Alarm,
    Guest,
    Menu,
    Settings,
}

/// Current view, observable through a watch channel. Starts at `Login`.
#[derive(Debug)]
pub struct Router {
    current: watch::Sender<View>,
}

impl Router {
    pub fn new() -> Self {
        let (current, _) = watch::channel(View::Login);
        Self { current }
    }

    pub fn navigate(&self, view: View) {
        let previous = self.current.send_replace(view);
        if previous != view {
            debug!(from = %previous, to = %view, "navigate");
        }
    }

    pub fn current(&self) -> View {
        *self.current.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.current.subscribe()
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
