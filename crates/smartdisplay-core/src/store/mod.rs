// ── Polling state store ──
//
// A single shared JSON mapping refreshed by periodic provider polling.

mod polling;
mod state;
mod subscription;

pub use polling::{CycleReport, PollPhase, PollingStore, ProviderId};
pub use state::{PartialState, SharedState, StateChange, partial, slices};
pub use subscription::{StateChangeStream, StateSubscription};
