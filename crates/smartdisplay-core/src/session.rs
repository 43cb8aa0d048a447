// ── Session storage ──
//
// Per-session key/value store for the signed-in user. Lives only as long
// as the process; `clear()` ends the session. The PIN is kept apart as a
// secret so it never shows up in `Debug` output or logs.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use dashmap::DashMap;
use secrecy::SecretString;
use strum::{AsRefStr, Display};

use crate::auth::Role;

/// Keys held in session storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr)]
pub enum SessionKey {
    #[strum(serialize = "currentUser")]
    CurrentUser,
    #[strum(serialize = "role")]
    Role,
}

#[derive(Default)]
pub struct SessionStorage {
    values: DashMap<SessionKey, String>,
    pin: ArcSwapOption<SecretString>,
}

impl SessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: SessionKey, value: impl Into<String>) {
        self.values.insert(key, value.into());
    }

    pub fn get(&self, key: SessionKey) -> Option<String> {
        self.values.get(&key).map(|v| v.value().clone())
    }

    pub fn remove(&self, key: SessionKey) -> Option<String> {
        self.values.remove(&key).map(|(_, v)| v)
    }

    pub fn set_pin(&self, pin: SecretString) {
        self.pin.store(Some(Arc::new(pin)));
    }

    pub fn pin(&self) -> Option<Arc<SecretString>> {
        self.pin.load_full()
    }

    /// Session role, `Guest` when unset or unrecognized.
    pub fn role(&self) -> Role {
        self.get(SessionKey::Role)
            .and_then(|r| r.parse().ok())
            .unwrap_or_default()
    }

    pub fn current_user(&self) -> Option<String> {
        self.get(SessionKey::CurrentUser)
    }

    pub fn is_signed_in(&self) -> bool {
        self.values.contains_key(&SessionKey::Role)
    }

    /// End the session.
    pub fn clear(&self) {
        self.values.clear();
        self.pin.store(None);
    }
}

impl std::fmt::Debug for SessionStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStorage")
            .field("current_user", &self.current_user())
            .field("role", &self.get(SessionKey::Role))
            .field("pin", &self.pin.load().is_some().then_some("[REDACTED]"))
            .finish()
    }
}
