//! Config subcommand handlers.

use dialoguer::{Confirm, Input, Select};

use digiprobe_config::{self as cfgfile, Profile};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config;
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: field.into(),
        reason: "must be 'true' or 'false'".into(),
    })
}

/// Apply `key = value` to a profile.
fn set_profile_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "store_url" | "store-url" => profile.store_url = Some(value),
        "api_key" | "api-key" => profile.api_key = Some(value),
        "api_key_env" | "api-key-env" => profile.api_key_env = Some(value),
        "ping_url" | "ping-url" => profile.ping_url = Some(value),
        "download_url" | "download-url" => profile.download_url = Some(value),
        "upload_url" | "upload-url" => profile.upload_url = Some(value),
        "browse_url" | "browse-url" => profile.browse_url = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_bool("insecure", &value)?),
        "timeout" => {
            profile.timeout = Some(value.parse().map_err(|_| CliError::Validation {
                field: "timeout".into(),
                reason: "must be a number (seconds)".into(),
            })?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!(
                    "unknown config key '{other}'. Valid keys: store_url, api_key, api_key_env, \
                     ping_url, download_url, upload_url, browse_url, ca_cert, insecure, timeout"
                ),
            });
        }
    }
    // Reject values that would fail later at run time.
    cfgfile::profile_endpoints(profile)?;
    Ok(())
}

fn store_key_in_keyring(profile_name: &str, key: &str) -> Result<(), CliError> {
    cfgfile::store_api_key(profile_name, key).map_err(|e| CliError::Validation {
        field: "keyring".into(),
        reason: format!("failed to store API key in keyring: {e}"),
    })
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => init(),

        ConfigCommand::Show => {
            let cfg = cfgfile::load_config_or_default();
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("{c:#?}\n# {e}")),
                |c| c.active_profile_name().to_owned(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = cfgfile::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_profile_key(profile, &key, value)?;

            cfgfile::save_config(&cfg)?;
            eprintln!("✓ Set {key} on profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = cfgfile::load_config_or_default();
            let default = cfg.active_profile_name();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: digiprobe config init");
            } else {
                let mut names: Vec<_> = cfg.profiles.keys().collect();
                names.sort();
                for name in names {
                    let marker = if name == default { " *" } else { "" };
                    println!("{name}{marker}");
                }
            }
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = cfgfile::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            cfgfile::save_config(&cfg)?;
            eprintln!("✓ Default profile set to '{name}'");
            Ok(())
        }

        ConfigCommand::SetKey { profile } => {
            let cfg = cfgfile::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }

            let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
            if key.is_empty() {
                return Err(CliError::Validation {
                    field: "api_key".into(),
                    reason: "value cannot be empty".into(),
                });
            }
            store_key_in_keyring(&profile_name, &key)?;
            eprintln!("✓ API key stored in system keyring for profile '{profile_name}'");
            Ok(())
        }

        ConfigCommand::Path => {
            println!("{}", cfgfile::config_path().display());
            Ok(())
        }
    }
}

// ── Init: interactive wizard ────────────────────────────────────────

fn init() -> Result<(), CliError> {
    let config_path = cfgfile::config_path();
    eprintln!("DigiProbe configuration wizard");
    eprintln!("   Config path: {}\n", config_path.display());

    let profile_name: String = Input::new()
        .with_prompt("Profile name")
        .default("default".into())
        .interact_text()
        .map_err(prompt_err)?;

    let mut profile = Profile::default();

    let use_store = Confirm::new()
        .with_prompt("Record results to a remote store?")
        .default(true)
        .interact()
        .map_err(prompt_err)?;

    if use_store {
        let store_url: String = Input::new()
            .with_prompt("Store URL")
            .default("https://xyz.supabase.co".into())
            .interact_text()
            .map_err(prompt_err)?;
        profile.store_url = Some(store_url);

        let key = rpassword::prompt_password("API key: ").map_err(prompt_err)?;
        if key.is_empty() {
            return Err(CliError::Validation {
                field: "api_key".into(),
                reason: "API key cannot be empty".into(),
            });
        }

        let store_choices = &[
            "Store in system keyring (recommended)",
            "Save to config file (plaintext)",
        ];
        let store_selection = Select::new()
            .with_prompt("Where to store the API key?")
            .items(store_choices)
            .default(0)
            .interact()
            .map_err(prompt_err)?;

        if store_selection == 0 {
            store_key_in_keyring(&profile_name, &key)?;
            eprintln!("   ✓ API key stored in system keyring");
        } else {
            profile.api_key = Some(key);
        }
    }

    let probe_base: String = Input::new()
        .with_prompt("Probe target base URL (empty for public defaults)")
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    if !probe_base.trim().is_empty() {
        let endpoints = digiprobe_core::ProbeEndpoints::from_base(probe_base.trim());
        profile.ping_url = Some(endpoints.ping);
        profile.download_url = Some(endpoints.download);
        profile.upload_url = Some(endpoints.upload);
        profile.browse_url = Some(endpoints.browse);
        cfgfile::profile_endpoints(&profile)?;
    }

    let mut cfg = cfgfile::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    cfg.default_profile = Some(profile_name.clone());
    let written = cfgfile::save_config(&cfg)?;

    eprintln!("\n✓ Configuration written to {}", written.display());
    eprintln!("  Active profile: {profile_name}");
    eprintln!("\n  Test it: digiprobe identity");
    Ok(())
}
