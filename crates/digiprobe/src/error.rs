//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` variants into user-facing errors with
//! actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use digiprobe_config::ConfigError;
use digiprobe_core::CoreError;

pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not reach the result store at {url}")]
    #[diagnostic(
        code(digiprobe::connection_failed),
        help(
            "Check store_url in your profile and your network connection.\n\
             URL: {url}\n\
             Leave store_url unset to keep results in memory."
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Network identity unavailable: {message}")]
    #[diagnostic(
        code(digiprobe::identity),
        help("Both ipwho.is and ipapi.co failed. Use `run --offline` to skip the lookup.")
    )]
    IdentityUnavailable { message: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Result store rejected the API key")]
    #[diagnostic(
        code(digiprobe::auth_failed),
        help("Verify the key, then run: digiprobe config set-key --profile {profile}")
    )]
    AuthFailed { profile: String },

    #[error("No API key configured for profile '{profile}'")]
    #[diagnostic(
        code(digiprobe::no_credentials),
        help(
            "Store one with: digiprobe config set-key\n\
             Or set the DIGIPROBE_API_KEY environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(digiprobe::not_found),
        help("Run: digiprobe {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── Store ────────────────────────────────────────────────────────
    #[error("Store error ({code}): {message}")]
    #[diagnostic(code(digiprobe::store_error))]
    StoreError { code: String, message: String },

    #[error("{message}")]
    #[diagnostic(code(digiprobe::operation_failed))]
    OperationFailed { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(digiprobe::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(digiprobe::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: digiprobe config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(digiprobe::config))]
    Config(Box<ConfigError>),

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request to {url} timed out")]
    #[diagnostic(
        code(digiprobe::timeout),
        help("Increase timeout with --timeout or check the store's responsiveness.")
    )]
    Timeout { url: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render output: {0}")]
    #[diagnostic(code(digiprobe::render))]
    Render(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::IdentityUnavailable { .. } => {
                exit_code::CONNECTION
            }
            Self::AuthFailed { .. } | Self::NoCredentials { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::ProfileNotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::StoreUnavailable { url, reason } => CliError::ConnectionFailed {
                url,
                source: reason.into(),
            },

            CoreError::AuthenticationFailed { message: _ } => CliError::AuthFailed {
                profile: "current".into(),
            },

            CoreError::SessionNotFound { id } => CliError::NotFound {
                resource_type: "session".into(),
                identifier: id,
                list_command: "sessions".into(),
            },

            CoreError::Store {
                message,
                code,
                status,
            } => CliError::StoreError {
                code: code
                    .or_else(|| status.map(|s| s.to_string()))
                    .unwrap_or_else(|| "unknown".into()),
                message,
            },

            CoreError::Identity { message } => CliError::IdentityUnavailable { message },

            CoreError::Timeout { url } => CliError::Timeout { url },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            err @ (CoreError::Probe { .. }
            | CoreError::WakeHoldUnavailable { .. }
            | CoreError::Internal(_)) => CliError::OperationFailed {
                message: err.to_string(),
            },
        }
    }
}

// ── ConfigError → CliError mapping ───────────────────────────────────

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { profile } => CliError::NoCredentials { profile },
            ConfigError::Validation { field, reason } => CliError::Validation { field, reason },
            ConfigError::Io(e) => CliError::Io(e),
            other => CliError::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        let missing: CliError = CoreError::SessionNotFound { id: "abc".into() }.into();
        assert_eq!(missing.exit_code(), exit_code::NOT_FOUND);

        let creds: CliError = ConfigError::NoCredentials {
            profile: "field".into(),
        }
        .into();
        assert_eq!(creds.exit_code(), exit_code::AUTH);

        let invalid: CliError = CoreError::ValidationFailed {
            message: "operator label is required".into(),
        }
        .into();
        assert_eq!(invalid.exit_code(), exit_code::USAGE);

        let timeout: CliError = CoreError::Timeout {
            url: "https://xyz.supabase.co/rest/v1/sessions".into(),
        }
        .into();
        assert_eq!(timeout.exit_code(), exit_code::TIMEOUT);
        assert_eq!(
            timeout.to_string(),
            "Request to https://xyz.supabase.co/rest/v1/sessions timed out"
        );
    }

    #[test]
    fn store_code_falls_back_to_status() {
        let err: CliError = CoreError::Store {
            message: "conflict".into(),
            code: None,
            status: Some(409),
        }
        .into();
        assert!(matches!(err, CliError::StoreError { ref code, .. } if code == "409"));
    }
}
