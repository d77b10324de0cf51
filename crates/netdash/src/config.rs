//! CLI configuration -- thin wrapper around `netdash_config`.
//!
//! Adds resolution that respects `GlobalOpts` flag overrides
//! (--server, --insecure, --timeout) on top of the active profile.

use clap::ValueEnum;
use tracing::{debug, warn};

use netdash_core::DashboardConfig;

use crate::cli::{ColorMode, GlobalOpts};
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use netdash_config::{Config, Profile, config_path, load_config, save_config};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Apply CLI flag overrides to a profile. Flags win over profile values.
pub fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Color mode: `--color` wins, then `defaults.color` from the config file.
pub fn color_mode(global: &GlobalOpts) -> ColorMode {
    if let Some(ref mode) = global.color {
        return mode.clone();
    }
    parse_color(&netdash_config::load_config_or_default().defaults.color)
}

fn parse_color(raw: &str) -> ColorMode {
    ColorMode::from_str(raw, true).unwrap_or_else(|_| {
        warn!(value = raw, "unrecognized defaults.color, using auto");
        ColorMode::Auto
    })
}

/// Build the runtime `DashboardConfig` from file, environment, and flags.
pub fn resolve(global: &GlobalOpts) -> Result<DashboardConfig, CliError> {
    let cfg = load_config()?;
    let name = active_profile_name(global, &cfg);
    let (name, mut profile) = cfg.profile(Some(&name))?;
    apply_overrides(&mut profile, global);

    let dashboard = netdash_config::profile_to_dashboard_config(&profile, &cfg.defaults)?;
    debug!(profile = %name, server = %dashboard.server, "resolved configuration");
    Ok(dashboard)
}
