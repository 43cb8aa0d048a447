//! CLI configuration: thin wrapper around `smartdisplay_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--profile, --backend, --insecure, --timeout).

use std::time::Duration;

use smartdisplay_core::{CoreConfig, TlsVerification};

use crate::cli::GlobalOpts;
use crate::error::CliError;

pub use smartdisplay_config::{
    Config, Profile, config_path, load_config, profile_to_core_config, save_config_to,
    starter_config,
};

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Build a `CoreConfig` from the config file, the active profile and CLI
/// overrides.
pub fn build_core_config(global: &GlobalOpts) -> Result<CoreConfig, CliError> {
    let cfg = load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => {
            let mut profile = profile.clone();
            if let Some(ref backend) = global.backend {
                profile.backend.clone_from(backend);
            }
            profile
        }
        None if global.profile.is_some() => {
            let mut available: Vec<_> = cfg.profiles.keys().cloned().collect();
            available.sort();
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            });
        }
        // No profile -- build from flags / env alone.
        None => Profile {
            backend: global.backend.clone().ok_or_else(|| CliError::NoConfig {
                path: config_path().display().to_string(),
            })?,
            ..Profile::default()
        },
    };

    let mut core = profile_to_core_config(&profile, &cfg.defaults)?;
    apply_overrides(&mut core, global)?;
    tracing::debug!(profile = %profile_name, backend = %core.base_url, "resolved configuration");
    Ok(core)
}

fn apply_overrides(core: &mut CoreConfig, global: &GlobalOpts) -> Result<(), CliError> {
    if global.insecure {
        core.tls = TlsVerification::DangerAcceptInvalid;
    }
    if let Some(ms) = global.timeout {
        if ms == 0 {
            return Err(CliError::Validation {
                field: "timeout".into(),
                reason: "must be greater than zero".into(),
            });
        }
        core.request_timeout = Duration::from_millis(ms);
    }
    Ok(())
}
