// Integration tests for `ProbeClient` and `IdentityClient` using wiremock.
#![allow(clippy::unwrap_used)]

use bytes::Bytes;
use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use digiprobe_api::{Error, IdentityClient, ProbeClient, ProbeEndpoints};

// ── Helpers ─────────────────────────────────────────────────────────

async fn probe_setup() -> (MockServer, ProbeClient) {
    let server = MockServer::start().await;
    let client = ProbeClient::with_client(
        reqwest::Client::new(),
        ProbeEndpoints::from_base(&server.uri()),
    );
    (server, client)
}

async fn identity_setup() -> (MockServer, IdentityClient) {
    let server = MockServer::start().await;
    let base = server.uri();
    let client = IdentityClient::with_endpoints(
        reqwest::Client::new(),
        format!("{base}/ipwho/").parse().unwrap(),
        format!("{base}/ipapi/json/").parse().unwrap(),
    );
    (server, client)
}

// ── Probes ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ping_accepts_any_status() {
    let (server, client) = probe_setup().await;

    Mock::given(method("GET"))
        .and(path("/generate_204"))
        .and(header("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.ping().await.unwrap();
}

#[tokio::test]
async fn test_download_drains_requested_size() {
    let (server, client) = probe_setup().await;

    Mock::given(method("GET"))
        .and(path("/bytes/100000"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0_u8; 100_000]))
        .mount(&server)
        .await;

    let received = client.download(100_000).await.unwrap();
    assert_eq!(received, 100_000);
}

#[tokio::test]
async fn test_download_error_status_is_reported() {
    let (server, client) = probe_setup().await;

    Mock::given(method("GET"))
        .and(path("/bytes/500000"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client.download(500_000).await.unwrap_err();
    assert!(matches!(err, Error::Status { status: 503, .. }), "got {err:?}");
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_upload_posts_octet_stream() {
    let (server, client) = probe_setup().await;

    Mock::given(method("POST"))
        .and(path("/post"))
        .and(header("content-type", "application/octet-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    client
        .upload(Bytes::from(vec![0_u8; 50_000]))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_browse_fetches_html() {
    let (server, client) = probe_setup().await;

    Mock::given(method("GET"))
        .and(path("/html"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>ok</body></html>"))
        .mount(&server)
        .await;

    client.browse().await.unwrap();
}

// ── Identity ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ipwho_parses_connection() {
    let (server, client) = identity_setup().await;

    Mock::given(method("GET"))
        .and(path("/ipwho/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ip": "203.0.113.7",
            "success": true,
            "country": "Indonesia",
            "region": "Special Region of Yogyakarta",
            "city": "Yogyakarta",
            "connection": { "asn": 7713, "org": "Telkomnet", "isp": "PT Telekomunikasi Indonesia" }
        })))
        .mount(&server)
        .await;

    let resp = client.ipwho().await.unwrap();
    assert_eq!(resp.ip.as_deref(), Some("203.0.113.7"));
    let conn = resp.connection.unwrap();
    assert_eq!(conn.isp.as_deref(), Some("PT Telekomunikasi Indonesia"));
    assert_eq!(conn.asn, Some(7713));
}

#[tokio::test]
async fn test_ipwho_success_false_is_an_error() {
    let (server, client) = identity_setup().await;

    Mock::given(method("GET"))
        .and(path("/ipwho/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "message": "Reserved range"
        })))
        .mount(&server)
        .await;

    let err = client.ipwho().await.unwrap_err();
    match err {
        Error::Identity { provider, message } => {
            assert_eq!(provider, "ipwho.is");
            assert_eq!(message, "Reserved range");
        }
        other => panic!("expected Identity error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ipapi_error_flag_is_an_error() {
    let (server, client) = identity_setup().await;

    Mock::given(method("GET"))
        .and(path("/ipapi/json/"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": true,
            "reason": "RateLimited"
        })))
        .mount(&server)
        .await;

    let err = client.ipapi().await.unwrap_err();
    assert!(matches!(err, Error::Identity { provider: "ipapi.co", .. }));
}

#[tokio::test]
async fn test_identity_garbage_body_is_deserialization_error() {
    let (server, client) = identity_setup().await;

    Mock::given(method("GET"))
        .and(path("/ipapi/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>captcha</html>"))
        .mount(&server)
        .await;

    let err = client.ipapi().await.unwrap_err();
    match err {
        Error::Deserialization { body, .. } => assert!(body.contains("captcha")),
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}
