// Integration tests for `RecordsClient` using wiremock.
#![allow(clippy::unwrap_used)]

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use digiprobe_api::{Error, NewResult, NewSession, RecordsClient, TransportConfig};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, RecordsClient) {
    let server = MockServer::start().await;
    let client = RecordsClient::new(
        server.uri().parse().unwrap(),
        &SecretString::from("anon-key".to_string()),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

fn new_session() -> NewSession {
    NewSession {
        user_id: None,
        isp_name: Some("PT Telkomsel".into()),
        public_ip: Some("203.0.113.7".into()),
        operator_label: "Telkomsel".into(),
        test_mode: "static".into(),
        activity: Some("Coverage Survey".into()),
        remark: None,
        poi_name: Some("Tugu Station".into()),
    }
}

fn session_row(id: &str) -> serde_json::Value {
    json!({
        "id": id,
        "isp_name": "PT Telkomsel",
        "public_ip": "203.0.113.7",
        "operator_label": "Telkomsel",
        "test_mode": "static",
        "activity": "Coverage Survey",
        "remark": null,
        "poi_name": "Tugu Station",
        "is_active": true,
        "created_at": "2026-10-18T08:00:00Z",
        "updated_at": "2026-10-18T08:00:00Z"
    })
}

// ── Happy-path tests ────────────────────────────────────────────────

#[tokio::test]
async fn test_create_session_sends_credentials_and_returns_row() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/test_sessions"))
        .and(header("apikey", "anon-key"))
        .and(header("authorization", "Bearer anon-key"))
        .and(header("prefer", "return=representation"))
        .and(body_partial_json(json!({
            "operator_label": "Telkomsel",
            "test_mode": "static",
            "poi_name": "Tugu Station"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([session_row("s-1")])))
        .mount(&server)
        .await;

    let row = client.create_session(&new_session()).await.unwrap();

    assert_eq!(row.id, "s-1");
    assert_eq!(row.operator_label, "Telkomsel");
    assert!(row.is_active);
}

#[tokio::test]
async fn test_append_result_returns_server_id() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/test_results"))
        .and(body_partial_json(json!({
            "session_id": "s-1",
            "category_color": "green",
            "lat": -7.78
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": "r-9",
            "session_id": "s-1",
            "lat": -7.78,
            "lng": 110.36,
            "ping": 32.0,
            "download_speed": 3.2,
            "upload_speed": 1.1,
            "browsing_time": 640.0,
            "video_mos": 3.4,
            "category_color": "green",
            "created_at": "2026-10-18T08:01:00Z"
        }])))
        .mount(&server)
        .await;

    let row = client
        .append_result(&NewResult {
            session_id: "s-1".into(),
            lat: Some(-7.78),
            lng: Some(110.36),
            ping: 32.0,
            download_speed: 3.2,
            upload_speed: 1.1,
            browsing_time: 640.0,
            video_mos: 3.4,
            category_color: "green".into(),
        })
        .await
        .unwrap();

    assert_eq!(row.id, "r-9");
    assert_eq!(row.category_color.as_deref(), Some("green"));
}

#[tokio::test]
async fn test_close_session_patches_is_active() {
    let (server, client) = setup().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/test_sessions"))
        .and(query_param("id", "eq.s-1"))
        .and(body_partial_json(json!({ "is_active": false })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    client.close_session("s-1").await.unwrap();
}

#[tokio::test]
async fn test_list_results_filters_by_session() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/test_results"))
        .and(query_param("session_id", "eq.s-1"))
        .and(query_param("order", "created_at.asc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": "r-1", "session_id": "s-1", "ping": 12.0, "created_at": "2026-10-18T08:01:00Z" },
            { "id": "r-2", "session_id": "s-1", "ping": null, "created_at": "2026-10-18T08:02:00Z" }
        ])))
        .mount(&server)
        .await;

    let rows = client.list_results("s-1").await.unwrap();

    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].ping, Some(12.0));
    assert_eq!(rows[1].ping, None);
    assert_eq!(rows[1].lat, None);
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_authentication() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/test_sessions"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "message": "Invalid API key"
        })))
        .mount(&server)
        .await;

    let err = client.create_session(&new_session()).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }), "got {err:?}");
}

#[tokio::test]
async fn test_store_error_body_is_parsed() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/test_results"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "message": "insert or update violates foreign key constraint",
            "code": "23503",
            "details": "Key is not present in table \"test_sessions\"."
        })))
        .mount(&server)
        .await;

    let err = client
        .append_result(&NewResult {
            session_id: "missing".into(),
            lat: None,
            lng: None,
            ping: 1.0,
            download_speed: 1.0,
            upload_speed: 1.0,
            browsing_time: 1.0,
            video_mos: 1.0,
            category_color: "red".into(),
        })
        .await
        .unwrap_err();

    match err {
        Error::Store {
            status,
            code,
            message,
        } => {
            assert_eq!(status, 409);
            assert_eq!(code.as_deref(), Some("23503"));
            assert!(message.contains("foreign key"));
        }
        other => panic!("expected Store error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_empty_representation_is_an_error() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/test_sessions"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .mount(&server)
        .await;

    let err = client.create_session(&new_session()).await.unwrap_err();
    assert!(matches!(err, Error::EmptyResponse { table: "test_sessions" }));
}
