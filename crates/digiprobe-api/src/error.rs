use thiserror::Error;

/// Top-level error type for the `digiprobe-api` crate.
///
/// Covers every failure mode across the three HTTP surfaces: probe
/// endpoints, identity providers, and the session/result store.
/// `digiprobe-core` maps these into domain errors or synthetic fallbacks.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The store rejected the API key (HTTP 401/403).
    #[error("Authentication failed: {message}")]
    Authentication { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── Probe endpoints ─────────────────────────────────────────────
    /// A probe endpoint answered with a non-success status.
    #[error("Probe endpoint {url} returned HTTP {status}")]
    Status { status: u16, url: String },

    // ── Identity providers ──────────────────────────────────────────
    /// An identity provider answered but flagged the lookup as failed.
    #[error("Identity provider {provider} failed: {message}")]
    Identity {
        provider: &'static str,
        message: String,
    },

    // ── Store ───────────────────────────────────────────────────────
    /// Structured error returned by the store (`{message, code, ...}` body).
    #[error("Store error (HTTP {status}): {message}")]
    Store {
        message: String,
        code: Option<String>,
        status: u16,
    },

    /// The store accepted a write but returned no representation.
    #[error("Store returned no rows for {table}")]
    EmptyResponse { table: &'static str },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Status { status, .. } | Self::Store { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Status { status: 404, .. } | Self::Store { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Extract the store error code, if available.
    pub fn store_error_code(&self) -> Option<&str> {
        match self {
            Self::Store { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}
