// ── Network identity ──
//
// Public IP and ISP lookup. Providers are tried in order; the first
// success wins. The result is exposed as a loading/error-bearing value
// that can be refetched.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, warn};

use digiprobe_api::{IdentityClient, IpApiResponse, IpWhoResponse, TransportConfig};

use crate::error::CoreError;
use crate::model::NetworkIdentity;

/// ISP shown when a provider names none.
pub const UNKNOWN_ISP: &str = "Unknown ISP";

/// Message carried by [`IdentityState::Failed`] when every provider fails.
pub const LOOKUP_FAILED: &str = "Failed to detect network information";

/// One "who am I" service.
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn lookup(&self) -> BoxFuture<'_, Result<NetworkIdentity, CoreError>>;
}

// ── Providers ────────────────────────────────────────────────────

/// `ipwho.is`, the primary provider.
pub struct IpWhoProvider {
    client: Arc<IdentityClient>,
}

impl IpWhoProvider {
    pub fn new(client: Arc<IdentityClient>) -> Self {
        Self { client }
    }
}

impl IdentityProvider for IpWhoProvider {
    fn name(&self) -> &'static str {
        "ipwho.is"
    }

    fn lookup(&self) -> BoxFuture<'_, Result<NetworkIdentity, CoreError>> {
        Box::pin(async move { Ok(from_ipwho(self.client.ipwho().await?)) })
    }
}

/// `ipapi.co`, the fallback provider.
pub struct IpApiProvider {
    client: Arc<IdentityClient>,
}

impl IpApiProvider {
    pub fn new(client: Arc<IdentityClient>) -> Self {
        Self { client }
    }
}

impl IdentityProvider for IpApiProvider {
    fn name(&self) -> &'static str {
        "ipapi.co"
    }

    fn lookup(&self) -> BoxFuture<'_, Result<NetworkIdentity, CoreError>> {
        Box::pin(async move { Ok(from_ipapi(self.client.ipapi().await?)) })
    }
}

fn filled(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// ISP from `connection.isp`, then `connection.org`.
pub fn from_ipwho(resp: IpWhoResponse) -> NetworkIdentity {
    let (isp, org) = resp
        .connection
        .map_or((None, None), |c| (filled(c.isp), filled(c.org)));

    NetworkIdentity {
        ip: resp.ip.unwrap_or_default(),
        isp: isp.or(org).unwrap_or_else(|| UNKNOWN_ISP.to_owned()),
        country: filled(resp.country),
        region: filled(resp.region),
        city: filled(resp.city),
    }
}

/// ISP from `org`.
pub fn from_ipapi(resp: IpApiResponse) -> NetworkIdentity {
    NetworkIdentity {
        ip: resp.ip.unwrap_or_default(),
        isp: filled(resp.org).unwrap_or_else(|| UNKNOWN_ISP.to_owned()),
        country: filled(resp.country_name),
        region: filled(resp.region),
        city: filled(resp.city),
    }
}

/// Try each provider in order and return the first identity found.
pub async fn lookup_first(
    providers: &[Arc<dyn IdentityProvider>],
) -> Result<NetworkIdentity, CoreError> {
    let mut last_error = None;
    for provider in providers {
        match provider.lookup().await {
            Ok(identity) => {
                debug!(provider = provider.name(), ip = %identity.ip, "network identity resolved");
                return Ok(identity);
            }
            Err(e) => {
                warn!(provider = provider.name(), error = %e, "identity provider failed");
                last_error = Some(e);
            }
        }
    }
    Err(CoreError::Identity {
        message: last_error.map_or_else(
            || "no identity providers configured".to_owned(),
            |e| e.to_string(),
        ),
    })
}

// ── Observable lookup ────────────────────────────────────────────

/// Lookup progress as seen by a presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum IdentityState {
    Loading,
    Ready(NetworkIdentity),
    Failed { message: String },
}

impl IdentityState {
    pub fn identity(&self) -> Option<&NetworkIdentity> {
        match self {
            Self::Ready(identity) => Some(identity),
            _ => None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Network identity with provider fallback and refetch.
pub struct NetworkInfo {
    providers: Vec<Arc<dyn IdentityProvider>>,
    state: watch::Sender<IdentityState>,
}

impl NetworkInfo {
    /// Starts in `Loading`; call [`refetch`](Self::refetch) to resolve.
    pub fn new(providers: Vec<Arc<dyn IdentityProvider>>) -> Self {
        let (state, _) = watch::channel(IdentityState::Loading);
        Self { providers, state }
    }

    /// `ipwho.is` first, `ipapi.co` as fallback, sharing one client.
    pub fn from_client(client: IdentityClient) -> Self {
        let client = Arc::new(client);
        let primary: Arc<dyn IdentityProvider> = Arc::new(IpWhoProvider::new(Arc::clone(&client)));
        let fallback: Arc<dyn IdentityProvider> = Arc::new(IpApiProvider::new(client));
        Self::new(vec![primary, fallback])
    }

    /// Default providers over a transport built from `transport`.
    pub fn with_transport(transport: &TransportConfig) -> Result<Self, CoreError> {
        Ok(Self::from_client(IdentityClient::new(transport)?))
    }

    pub fn state(&self) -> IdentityState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<IdentityState> {
        self.state.subscribe()
    }

    /// Run the lookup again, passing through `Loading`.
    pub async fn refetch(&self) -> IdentityState {
        self.state.send_replace(IdentityState::Loading);
        let next = match lookup_first(&self.providers).await {
            Ok(identity) => IdentityState::Ready(identity),
            Err(e) => {
                debug!(error = %e, "all identity providers failed");
                IdentityState::Failed {
                    message: LOOKUP_FAILED.to_owned(),
                }
            }
        };
        self.state.send_replace(next.clone());
        next
    }
}
