// Raw HTTP calls behind the measurement probes.
//
// Each method performs exactly one request and reports success or failure.
// Timing and fallback values are the caller's business: the core crate
// wraps these calls with a clock and a randomness source.

use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, CONTENT_TYPE, HeaderValue};
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

const BYTES_PLACEHOLDER: &str = "{bytes}";

/// Endpoint set used by the probes.
///
/// `download` is a template: `{bytes}` is replaced with the requested
/// payload size, e.g. `https://httpbin.org/bytes/{bytes}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeEndpoints {
    pub ping: String,
    pub download: String,
    pub upload: String,
    pub browse: String,
}

impl Default for ProbeEndpoints {
    fn default() -> Self {
        Self {
            ping: "https://www.google.com/generate_204".into(),
            download: "https://httpbin.org/bytes/{bytes}".into(),
            upload: "https://httpbin.org/post".into(),
            browse: "https://httpbin.org/html".into(),
        }
    }
}

impl ProbeEndpoints {
    /// Point every endpoint at a single base URL using the httpbin layout.
    ///
    /// Handy for self-hosted probe targets and for tests.
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            ping: format!("{base}/generate_204"),
            download: format!("{base}/bytes/{BYTES_PLACEHOLDER}"),
            upload: format!("{base}/post"),
            browse: format!("{base}/html"),
        }
    }

    fn download_url(&self, bytes: usize) -> Result<Url, Error> {
        let raw = self.download.replace(BYTES_PLACEHOLDER, &bytes.to_string());
        Ok(Url::parse(&raw)?)
    }
}

/// HTTP client for the probe endpoints.
pub struct ProbeClient {
    http: reqwest::Client,
    endpoints: ProbeEndpoints,
}

impl ProbeClient {
    /// Create a probe client from a `TransportConfig`.
    pub fn new(endpoints: ProbeEndpoints, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, endpoints })
    }

    /// Create a probe client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, endpoints: ProbeEndpoints) -> Self {
        Self { http, endpoints }
    }

    /// The configured endpoints.
    pub fn endpoints(&self) -> &ProbeEndpoints {
        &self.endpoints
    }

    /// Minimal round trip to the ping endpoint.
    ///
    /// Any HTTP answer counts as a completed round trip; only transport
    /// failures are errors.
    pub async fn ping(&self) -> Result<(), Error> {
        let url = Url::parse(&self.endpoints.ping)?;
        debug!("GET {}", url);

        self.http
            .get(url)
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .send()
            .await?;
        Ok(())
    }

    /// Fetch a payload of `bytes` bytes and drain the body.
    ///
    /// Returns the number of bytes actually received.
    pub async fn download(&self, bytes: usize) -> Result<usize, Error> {
        let url = self.endpoints.download_url(bytes)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .send()
            .await?;
        let resp = check_status(resp, &url)?;
        let body = resp.bytes().await?;
        Ok(body.len())
    }

    /// POST an opaque payload to the upload endpoint.
    pub async fn upload(&self, payload: Bytes) -> Result<(), Error> {
        let url = Url::parse(&self.endpoints.upload)?;
        debug!(bytes = payload.len(), "POST {}", url);

        let resp = self
            .http
            .post(url.clone())
            .header(
                CONTENT_TYPE,
                HeaderValue::from_static("application/octet-stream"),
            )
            .body(payload)
            .send()
            .await?;
        check_status(resp, &url)?;
        Ok(())
    }

    /// Fetch the representative HTML page and drain the body.
    pub async fn browse(&self) -> Result<(), Error> {
        let url = Url::parse(&self.endpoints.browse)?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url.clone())
            .header(CACHE_CONTROL, HeaderValue::from_static("no-store"))
            .send()
            .await?;
        let resp = check_status(resp, &url)?;
        resp.bytes().await?;
        Ok(())
    }
}

fn check_status(resp: reqwest::Response, url: &Url) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        Ok(resp)
    } else {
        Err(Error::Status {
            status: status.as_u16(),
            url: url.to_string(),
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn download_template_substitutes_size() {
        let endpoints = ProbeEndpoints::default();
        let url = endpoints.download_url(500_000).unwrap();
        assert_eq!(url.as_str(), "https://httpbin.org/bytes/500000");
    }

    #[test]
    fn from_base_uses_httpbin_layout() {
        let endpoints = ProbeEndpoints::from_base("http://127.0.0.1:8080/");
        assert_eq!(endpoints.ping, "http://127.0.0.1:8080/generate_204");
        assert_eq!(endpoints.upload, "http://127.0.0.1:8080/post");
        assert_eq!(
            endpoints.download_url(100).unwrap().as_str(),
            "http://127.0.0.1:8080/bytes/100"
        );
    }
}
