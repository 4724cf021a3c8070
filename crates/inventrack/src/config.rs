//! CLI configuration: a thin wrapper around `inventrack_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--api-url, --timeout, etc.).

use secrecy::SecretString;

use inventrack_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use inventrack_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_password,
};

// ── Resolved target ─────────────────────────────────────────────────

/// The profile a command runs against, after flag overrides.
#[derive(Debug)]
pub struct Target {
    pub profile_name: String,
    pub profile: Profile,
    pub client: ClientConfig,
}

impl Target {
    /// Email + password for this profile, from env, keyring or config.
    pub fn credentials(&self) -> Result<(String, SecretString), CliError> {
        Ok(inventrack_config::resolve_credentials(
            &self.profile,
            &self.profile_name,
        )?)
    }
}

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config
        .profile_name(global.profile.as_deref())
        .to_owned()
}

pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build the command target from the config file, the active profile and
/// CLI overrides. A missing profile is tolerated when `--api-url` is given.
pub fn resolve(global: &GlobalOpts) -> Result<Target, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match (cfg.profiles.get(&profile_name), global.api_url.as_deref()) {
        (Some(profile), _) => profile.clone(),
        (None, Some(url)) => Profile::new(url),
        (None, None) if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        (None, None) => {
            return Err(CliError::NoConfig {
                path: config_path().display().to_string(),
            });
        }
    };

    // Flag > env > profile
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
    if let Some(ref dir) = global.storage_dir {
        profile.storage_dir = Some(dir.clone());
    }

    let client = inventrack_config::profile_to_client_config(&profile, &profile_name, &cfg.defaults)?;

    Ok(Target {
        profile_name,
        profile,
        client,
    })
}
