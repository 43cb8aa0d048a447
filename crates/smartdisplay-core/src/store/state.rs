// ── Shared state mapping ──
//
// One JSON object of named slices. Merges are shallow: a partial update
// replaces the top-level keys it names and leaves every sibling alone.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A partial update: top-level slice name → new slice value.
pub type PartialState = Map<String, Value>;

/// Well-known slice names.
pub mod slices {
    pub const ALARM: &str = "alarmState";
    pub const HOME: &str = "homeState";
    pub const GUEST: &str = "guestState";
    pub const MENU: &str = "menuState";
    pub const AUTH: &str = "authState";
    pub const ADMIN_TRACE: &str = "adminTrace";
}

/// Build a single-slice partial update.
pub fn partial(slice: &str, value: Value) -> PartialState {
    let mut p = PartialState::new();
    p.insert(slice.to_owned(), value);
    p
}

/// The store's state: a mapping of slice name to slice value.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SharedState {
    slices: Map<String, Value>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, slice: &str) -> Option<&Value> {
        self.slices.get(slice)
    }

    /// Decode a slice into `T`. `None` if absent or of a different shape.
    pub fn get_as<T: DeserializeOwned>(&self, slice: &str) -> Option<T> {
        self.slices
            .get(slice)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn contains(&self, slice: &str) -> bool {
        self.slices.contains_key(slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.slices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.slices
    }

    /// Shallow-merge `update`, returning the slice names it wrote.
    pub(crate) fn merge(&mut self, update: PartialState) -> Vec<String> {
        let mut written = Vec::with_capacity(update.len());
        for (slice, value) in update {
            written.push(slice.clone());
            self.slices.insert(slice, value);
        }
        written
    }
}

/// Notification sent to subscribers after every merge.
#[derive(Debug, Clone)]
pub struct StateChange {
    /// Poll cycle number, or `None` for a direct `set_state` merge.
    pub cycle: Option<u64>,
    /// Slice names written by this merge (possibly empty).
    pub updated: Vec<String>,
    /// State snapshot right after the merge.
    pub state: std::sync::Arc<SharedState>,
    pub at: DateTime<Utc>,
}

impl StateChange {
    pub fn touches(&self, slice: &str) -> bool {
        self.updated.iter().any(|s| s == slice)
    }
}
