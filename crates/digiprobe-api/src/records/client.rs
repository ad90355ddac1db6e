// Store HTTP client
//
// Wraps `reqwest::Client` with table URL construction, the
// `Prefer: return=representation` convention, and error-body parsing.

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::records::models::{NewResult, NewSession, ResultRow, SessionRow, StoreErrorBody};
use crate::transport::TransportConfig;

const SESSIONS_TABLE: &str = "test_sessions";
const RESULTS_TABLE: &str = "test_results";

/// Raw HTTP client for the session/result store.
///
/// All write methods ask the store to echo the written row back so callers
/// get server-assigned identifiers and timestamps.
pub struct RecordsClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RecordsClient {
    /// Create a store client authenticated with `api_key`.
    ///
    /// The key is sent both as the `apikey` header and as a bearer token.
    pub fn new(
        base_url: Url,
        api_key: &SecretString,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let mut headers = HeaderMap::new();

        let mut key = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            Error::Authentication {
                message: "API key contains characters not allowed in a header".into(),
            }
        })?;
        key.set_sensitive(true);
        headers.insert("apikey", key);

        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", api_key.expose_secret()))
            .map_err(|_| Error::Authentication {
                message: "API key contains characters not allowed in a header".into(),
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);

        let http = transport.build_client_with_headers(headers)?;
        Ok(Self { http, base_url })
    }

    /// Create a store client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The store base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Insert a session row.
    ///
    /// `POST /rest/v1/test_sessions`
    pub async fn create_session(&self, session: &NewSession) -> Result<SessionRow, Error> {
        debug!(operator = %session.operator_label, "creating session");
        self.insert(SESSIONS_TABLE, session).await
    }

    /// Mark a session inactive.
    ///
    /// `PATCH /rest/v1/test_sessions?id=eq.{id}`
    pub async fn close_session(&self, session_id: &str) -> Result<(), Error> {
        let mut url = self.table_url(SESSIONS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("id", &format!("eq.{session_id}"));
        debug!("PATCH {}", url);

        let resp = self
            .http
            .patch(url)
            .json(&serde_json::json!({ "is_active": false }))
            .send()
            .await?;
        check_response(resp).await?;
        Ok(())
    }

    /// List the most recent sessions, newest first.
    ///
    /// `GET /rest/v1/test_sessions?order=created_at.desc&limit={limit}`
    pub async fn list_sessions(&self, limit: u32) -> Result<Vec<SessionRow>, Error> {
        let mut url = self.table_url(SESSIONS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "created_at.desc")
            .append_pair("limit", &limit.to_string());
        self.get(url).await
    }

    // ── Results ──────────────────────────────────────────────────────

    /// Insert a result row.
    ///
    /// `POST /rest/v1/test_results`
    pub async fn append_result(&self, result: &NewResult) -> Result<ResultRow, Error> {
        debug!(session = %result.session_id, "appending result");
        self.insert(RESULTS_TABLE, result).await
    }

    /// List a session's results in recording order.
    ///
    /// `GET /rest/v1/test_results?session_id=eq.{id}&order=created_at.asc`
    pub async fn list_results(&self, session_id: &str) -> Result<Vec<ResultRow>, Error> {
        let mut url = self.table_url(RESULTS_TABLE)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("session_id", &format!("eq.{session_id}"))
            .append_pair("order", "created_at.asc");
        self.get(url).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn table_url(&self, table: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(&format!("rest/v1/{table}"))?)
    }

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);

        let resp = self.http.get(url).send().await?;
        let body = check_response(resp).await?;
        parse_body(body)
    }

    /// POST a row and return the echoed representation.
    async fn insert<B, T>(&self, table: &'static str, row: &B) -> Result<T, Error>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.table_url(table)?;
        debug!("POST {}", url);

        let resp = self
            .http
            .post(url)
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;
        let body = check_response(resp).await?;

        let rows: Vec<T> = parse_body(body)?;
        rows.into_iter()
            .next()
            .ok_or(Error::EmptyResponse { table })
    }
}

/// Map auth and error statuses, returning the body text on success.
async fn check_response(resp: reqwest::Response) -> Result<String, Error> {
    let status = resp.status();

    if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
        return Err(Error::Authentication {
            message: format!("store rejected credentials (HTTP {})", status.as_u16()),
        });
    }

    let body = resp.text().await?;

    if status.is_success() {
        return Ok(body);
    }

    let parsed: Option<StoreErrorBody> = serde_json::from_str(&body).ok();
    let (message, code) = match parsed {
        Some(err) => {
            let message = match (err.message, err.details) {
                (Some(m), Some(d)) => format!("{m} ({d})"),
                (Some(m), None) => m,
                (None, Some(d)) => d,
                (None, None) => format!("HTTP {}", status.as_u16()),
            };
            (message, err.code)
        }
        None => (format!("HTTP {}", status.as_u16()), None),
    };

    Err(Error::Store {
        message,
        code,
        status: status.as_u16(),
    })
}

fn parse_body<T: DeserializeOwned>(body: String) -> Result<T, Error> {
    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
