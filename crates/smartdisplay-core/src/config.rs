// ── Runtime configuration ──
//
// These types describe *how* the display talks to its backend.
// They never touch disk: the CLI (or any other front end) builds a
// `CoreConfig` and hands it to `AppContext`.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use smartdisplay_api::{TlsMode, TransportConfig};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification (self-signed kiosk backends).
    DangerAcceptInvalid,
}

/// Configuration for one display talking to one backend.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Backend base URL (e.g., `http://192.168.1.50:8090`).
    pub base_url: Url,
    pub tls: TlsVerification,
    /// Default per-request timeout.
    pub request_timeout: Duration,
    /// Period of the polling store's timer.
    pub poll_interval: Duration,
    /// Consecutive provider failures before the degraded signal is raised.
    pub failure_threshold: u32,
}

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 3;

impl CoreConfig {
    /// A config for `base_url` with default timings.
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            tls: TlsVerification::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
        }
    }

    /// Transport settings for the API client.
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig::default()
            .with_tls(tls)
            .with_timeout(self.request_timeout)
    }
}
