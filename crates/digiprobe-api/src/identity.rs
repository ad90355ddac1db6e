// Network identity providers
//
// Two interchangeable public "who am I" services. Each method returns the
// provider's raw payload; choosing between them (primary, then fallback)
// happens in the core crate.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const IPWHO_URL: &str = "https://ipwho.is/";
const IPAPI_URL: &str = "https://ipapi.co/json/";

/// Payload from `ipwho.is`.
#[derive(Debug, Clone, Deserialize)]
pub struct IpWhoResponse {
    #[serde(default)]
    pub ip: Option<String>,
    /// `false` when the lookup failed; absent on older responses.
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub connection: Option<IpWhoConnection>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IpWhoConnection {
    #[serde(default)]
    pub asn: Option<u32>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub isp: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
}

/// Payload from `ipapi.co/json/`.
#[derive(Debug, Clone, Deserialize)]
pub struct IpApiResponse {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub country_name: Option<String>,
    #[serde(default)]
    pub org: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Set to `true` on rate limiting and other lookup failures.
    #[serde(default)]
    pub error: Option<bool>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// HTTP client for the identity providers.
pub struct IdentityClient {
    http: reqwest::Client,
    ipwho_url: Url,
    ipapi_url: Url,
}

impl IdentityClient {
    /// Create an identity client against the public provider URLs.
    pub fn new(transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            ipwho_url: Url::parse(IPWHO_URL)?,
            ipapi_url: Url::parse(IPAPI_URL)?,
        })
    }

    /// Create an identity client with explicit provider URLs.
    pub fn with_endpoints(http: reqwest::Client, ipwho_url: Url, ipapi_url: Url) -> Self {
        Self {
            http,
            ipwho_url,
            ipapi_url,
        }
    }

    /// Query `ipwho.is`. A `success: false` answer is an error.
    pub async fn ipwho(&self) -> Result<IpWhoResponse, Error> {
        let resp: IpWhoResponse = self.get_json(self.ipwho_url.clone()).await?;
        if resp.success == Some(false) {
            return Err(Error::Identity {
                provider: "ipwho.is",
                message: resp
                    .message
                    .unwrap_or_else(|| "lookup reported success=false".into()),
            });
        }
        Ok(resp)
    }

    /// Query `ipapi.co`. An `error: true` answer is an error.
    pub async fn ipapi(&self) -> Result<IpApiResponse, Error> {
        let resp: IpApiResponse = self.get_json(self.ipapi_url.clone()).await?;
        if resp.error == Some(true) {
            return Err(Error::Identity {
                provider: "ipapi.co",
                message: resp.reason.unwrap_or_else(|| "lookup failed".into()),
            });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body = resp.text().await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}
