// ── Core error types ──
//
// User-facing errors from digiprobe-core. Consumers never see HTTP status
// codes or JSON parse failures directly: the `From<digiprobe_api::Error>`
// impl translates transport-layer errors into domain variants.
//
// None of these abort a measurement run. Probe failures are replaced by
// synthetic values before they reach the orchestrator, and store failures
// surface as notices while the loop keeps going.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Input errors ─────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Probe errors (always recovered locally) ──────────────────────
    #[error("{probe} probe failed: {message}")]
    Probe {
        probe: &'static str,
        message: String,
    },

    // ── Store errors ─────────────────────────────────────────────────
    #[error("Cannot reach result store at {url}: {reason}")]
    StoreUnavailable { url: String, reason: String },

    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    #[error("Session not found: {id}")]
    SessionNotFound { id: String },

    #[error("Store error: {message}")]
    Store {
        message: String,
        /// The store-specific error code (e.g., "23503").
        code: Option<String>,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Environment errors ───────────────────────────────────────────
    #[error("Network identity lookup failed: {message}")]
    Identity { message: String },

    #[error("Screen wake hold unavailable: {reason}")]
    WakeHoldUnavailable { reason: String },

    #[error("Request to {url} timed out")]
    Timeout { url: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<digiprobe_api::Error> for CoreError {
    fn from(err: digiprobe_api::Error) -> Self {
        match err {
            digiprobe_api::Error::Authentication { message } => {
                CoreError::AuthenticationFailed { message }
            }
            digiprobe_api::Error::Transport(ref e) => {
                let url = e
                    .url()
                    .map(ToString::to_string)
                    .unwrap_or_else(|| "<unknown>".into());
                if e.is_timeout() {
                    CoreError::Timeout { url }
                } else if e.is_connect() {
                    CoreError::StoreUnavailable {
                        url,
                        reason: e.to_string(),
                    }
                } else {
                    CoreError::Store {
                        message: e.to_string(),
                        code: None,
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            digiprobe_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid URL: {e}"),
            },
            digiprobe_api::Error::Tls(msg) => CoreError::StoreUnavailable {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            digiprobe_api::Error::Status { status, url } => CoreError::Store {
                message: format!("{url} returned HTTP {status}"),
                code: None,
                status: Some(status),
            },
            digiprobe_api::Error::Identity { provider, message } => CoreError::Identity {
                message: format!("{provider}: {message}"),
            },
            digiprobe_api::Error::Store {
                message,
                code,
                status,
            } => CoreError::Store {
                message,
                code,
                status: Some(status),
            },
            digiprobe_api::Error::EmptyResponse { table } => CoreError::Store {
                message: format!("store returned no rows for {table}"),
                code: None,
                status: None,
            },
            digiprobe_api::Error::Deserialization { message, body: _ } => {
                CoreError::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

impl CoreError {
    /// Tag a transport error with the probe that produced it.
    pub(crate) fn probe(probe: &'static str, err: impl std::fmt::Display) -> Self {
        CoreError::Probe {
            probe,
            message: err.to_string(),
        }
    }
}
