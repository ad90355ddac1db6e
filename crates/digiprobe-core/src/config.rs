// ── Runtime configuration ──
//
// These types describe *where* probes, the result store, and the identity
// providers live. They carry credentials and connection tuning but never
// touch disk: the CLI builds a `RuntimeConfig` from its profile and hands
// it in.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use url::Url;

use digiprobe_api::{ProbeClient, RecordsClient, TlsMode, TransportConfig};

pub use digiprobe_api::ProbeEndpoints;

use crate::error::CoreError;
use crate::identity::NetworkInfo;
use crate::probes::ProbeSuite;
use crate::store::{MemoryStore, RemoteStore, ResultStore};

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

/// Remote session/result store location and key.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Project base URL, e.g. `https://xyz.supabase.co`.
    pub url: Url,
    pub api_key: SecretString,
}

/// Everything needed to wire up a measurement session.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub endpoints: ProbeEndpoints,
    pub tls: TlsVerification,
    /// Per-request timeout.
    pub timeout: Duration,
    /// `None` keeps results in memory only.
    pub store: Option<StoreConfig>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            endpoints: ProbeEndpoints::default(),
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            store: None,
        }
    }
}

impl RuntimeConfig {
    pub fn transport(&self) -> TransportConfig {
        let tls = match &self.tls {
            TlsVerification::SystemDefaults => TlsMode::System,
            TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
            TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
        };
        TransportConfig {
            tls,
            timeout: self.timeout,
        }
    }

    /// Probe suite over HTTP with an OS-seeded random source.
    pub fn probe_suite(&self) -> Result<ProbeSuite, CoreError> {
        let client = ProbeClient::new(self.endpoints.clone(), &self.transport())?;
        Ok(ProbeSuite::new(Arc::new(client)))
    }

    /// The configured store, or an in-memory one when none is set.
    pub fn result_store(&self) -> Result<Arc<dyn ResultStore>, CoreError> {
        match &self.store {
            Some(store) => {
                let client =
                    RecordsClient::new(store.url.clone(), &store.api_key, &self.transport())?;
                Ok(Arc::new(RemoteStore::new(client)))
            }
            None => Ok(Arc::new(MemoryStore::new())),
        }
    }

    /// Identity lookup with the default provider chain.
    pub fn network_info(&self) -> Result<NetworkInfo, CoreError> {
        NetworkInfo::with_transport(&self.transport())
    }
}
