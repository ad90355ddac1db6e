//! Profile resolution with CLI flag overrides.
//!
//! The profile format and credential chain live in `digiprobe-config`; this
//! module layers `GlobalOpts` on top and produces the `RuntimeConfig` core
//! consumes.

use digiprobe_config::{Config, Profile};
use digiprobe_core::{ProbeEndpoints, RuntimeConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .unwrap_or_else(|| config.active_profile_name().to_owned())
}

/// Comma-separated profile names, or `(none)`.
pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Copy flag overrides onto a profile (flag > env > profile).
fn apply_overrides(profile: &mut Profile, global: &GlobalOpts) {
    if let Some(ref url) = global.store_url {
        profile.store_url = Some(url.clone());
    }
    if let Some(ref base) = global.probe_base {
        let endpoints = ProbeEndpoints::from_base(base);
        profile.ping_url = Some(endpoints.ping);
        profile.download_url = Some(endpoints.download);
        profile.upload_url = Some(endpoints.upload);
        profile.browse_url = Some(endpoints.browse);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }
}

/// Build a `RuntimeConfig` from the config file, profile, and CLI overrides.
///
/// A missing profile is fine when it was not asked for by name: the
/// built-in defaults plus flags are enough to run against the in-memory
/// store.
pub fn build_runtime_config(global: &GlobalOpts) -> Result<RuntimeConfig, CliError> {
    let cfg = digiprobe_config::load_config()?;
    let profile_name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if global.profile.is_some() => {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        None => Profile::default(),
    };
    apply_overrides(&mut profile, global);

    tracing::debug!(profile = %profile_name, store = ?profile.store_url, "resolved profile");
    Ok(digiprobe_config::profile_to_runtime_config(
        &profile,
        &profile_name,
        &cfg.defaults,
        global.api_key.as_deref(),
    )?)
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["digiprobe"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["glyph", "x"]);
        match Cli::try_parse_from(argv) {
            Ok(cli) => cli.global,
            Err(e) => panic!("{e}"),
        }
    }

    #[test]
    fn flags_override_profile() {
        let mut profile = Profile {
            store_url: Some("https://old.example.net".into()),
            timeout: Some(60),
            ..Profile::default()
        };
        apply_overrides(
            &mut profile,
            &global(&[
                "--store-url",
                "https://new.example.net",
                "--probe-base",
                "http://127.0.0.1:8080/",
                "--timeout",
                "5",
                "-k",
            ]),
        );

        assert_eq!(profile.store_url.as_deref(), Some("https://new.example.net"));
        assert_eq!(profile.timeout, Some(5));
        assert_eq!(profile.insecure, Some(true));
        assert_eq!(
            profile.download_url.as_deref(),
            Some("http://127.0.0.1:8080/bytes/{bytes}")
        );
    }

    #[test]
    fn absent_flags_keep_profile() {
        let mut profile = Profile {
            timeout: Some(60),
            ..Profile::default()
        };
        apply_overrides(&mut profile, &global(&[]));
        assert_eq!(profile.timeout, Some(60));
        assert_eq!(profile.insecure, None);
        assert_eq!(profile.ping_url, None);
    }

    #[test]
    fn explicit_profile_wins_over_default() {
        let cfg = Config::default();
        assert_eq!(active_profile_name(&global(&[]), &cfg), "default");
        assert_eq!(active_profile_name(&global(&["-p", "lab"]), &cfg), "lab");
        assert_eq!(available_profiles(&cfg), "(none)");
    }
}
