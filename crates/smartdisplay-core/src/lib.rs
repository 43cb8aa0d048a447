// smartdisplay-core: Polling state store and view controllers between smartdisplay-api and front ends.

pub mod auth;
pub mod config;
pub mod context;
pub mod controllers;
pub mod error;
pub mod provider;
pub mod router;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{AuthState, PinEntry, PinInput, Role, determine_role, resolve_role};
pub use config::{CoreConfig, TlsVerification};
pub use context::AppContext;
pub use controllers::{
    AlarmController, ArmMode, GuestController, HomeController, LoginController, MenuController,
};
pub use error::CoreError;
pub use provider::{
    FailurePolicy, FnProvider, LinkHealth, PollingProvider, ProviderFuture, StateProvider,
    provider_fn,
};
pub use router::{Router, View};
pub use session::{SessionKey, SessionStorage};
pub use store::{
    CycleReport, PartialState, PollPhase, PollingStore, ProviderId, SharedState, StateChange,
    StateSubscription, partial, slices,
};
