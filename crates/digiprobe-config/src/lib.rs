//! Configuration for the DigiProbe CLI.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext), and
//! translation to `digiprobe_core::RuntimeConfig`. The CLI adds
//! `GlobalOpts`-aware overrides on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use digiprobe_core::{ProbeEndpoints, RuntimeConfig, StoreConfig, TlsVerification};

/// Keyring service name for stored API keys.
pub const KEYRING_SERVICE: &str = "digiprobe";

/// Prefix for environment overrides, e.g. `DIGIPROBE_DEFAULTS__TIMEOUT=10`.
pub const ENV_PREFIX: &str = "DIGIPROBE_";

const BYTES_PLACEHOLDER: &str = "{bytes}";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no API key configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Name of the profile to use when none is given explicitly.
    pub fn active_profile_name(&self) -> &str {
        self.default_profile.as_deref().unwrap_or("default")
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}

/// A named profile: where results go and which probe targets to hit.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct Profile {
    /// Result store base URL (e.g., "https://xyz.supabase.co"). Results
    /// stay in memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_url: Option<String>,

    /// API key (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Environment variable name containing the API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Ping target; any HTTP answer counts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ping_url: Option<String>,

    /// Download target template containing `{bytes}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub browse_url: Option<String>,

    /// Path to custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "digiprobe", "digiprobe").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("digiprobe");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path`, layering defaults, the file, then `DIGIPROBE_` env vars.
///
/// A missing file is not an error.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if loading fails.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution (without CLI flags) ───────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, keyring::Error> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/api-key"))
}

/// Resolve an API key from the credential chain.
///
/// `flag` is a key given on the command line; it wins over everything else.
pub fn resolve_api_key(
    profile: &Profile,
    profile_name: &str,
    flag: Option<&str>,
) -> Result<SecretString, ConfigError> {
    // 1. CLI flag
    if let Some(key) = flag {
        return Ok(SecretString::from(key.to_owned()));
    }

    // 2. Profile's api_key_env → env var lookup
    if let Some(ref env_name) = profile.api_key_env {
        if let Ok(val) = std::env::var(env_name) {
            return Ok(SecretString::from(val));
        }
    }

    // 3. System keyring
    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 4. Plaintext in config
    if let Some(ref key) = profile.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store an API key for `profile_name` in the system keyring.
pub fn store_api_key(profile_name: &str, key: &str) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(key)?;
    Ok(())
}

// ── Translation to runtime config ───────────────────────────────────

fn parse_url(field: &str, raw: &str) -> Result<url::Url, ConfigError> {
    raw.parse().map_err(|e| ConfigError::Validation {
        field: field.into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })
}

/// Probe endpoints from a profile, falling back to the public defaults.
pub fn profile_endpoints(profile: &Profile) -> Result<ProbeEndpoints, ConfigError> {
    let defaults = ProbeEndpoints::default();
    let pick = |field: &str, value: Option<&String>, default: String| -> Result<String, ConfigError> {
        match value {
            Some(raw) => {
                parse_url(field, &raw.replace(BYTES_PLACEHOLDER, "0"))?;
                Ok(raw.clone())
            }
            None => Ok(default),
        }
    };

    let download = pick("download_url", profile.download_url.as_ref(), defaults.download)?;
    if !download.contains(BYTES_PLACEHOLDER) {
        return Err(ConfigError::Validation {
            field: "download_url".into(),
            reason: format!("must contain the {BYTES_PLACEHOLDER} placeholder"),
        });
    }

    Ok(ProbeEndpoints {
        ping: pick("ping_url", profile.ping_url.as_ref(), defaults.ping)?,
        download,
        upload: pick("upload_url", profile.upload_url.as_ref(), defaults.upload)?,
        browse: pick("browse_url", profile.browse_url.as_ref(), defaults.browse)?,
    })
}

/// TLS strategy: `insecure` wins over a custom CA.
pub fn profile_tls(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `RuntimeConfig` from a profile.
///
/// A profile with a `store_url` needs an API key; one without runs
/// against the in-memory store. `api_key_flag` takes precedence over the
/// profile's credential chain.
pub fn profile_to_runtime_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    api_key_flag: Option<&str>,
) -> Result<RuntimeConfig, ConfigError> {
    let store = match profile.store_url {
        Some(ref raw) => Some(StoreConfig {
            url: parse_url("store_url", raw)?,
            api_key: resolve_api_key(profile, profile_name, api_key_flag)?,
        }),
        None => None,
    };

    Ok(RuntimeConfig {
        endpoints: profile_endpoints(profile)?,
        tls: profile_tls(profile, defaults),
        timeout: Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout)),
        store,
    })
}
