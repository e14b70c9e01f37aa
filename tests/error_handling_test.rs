//! Integration tests for error mapping.

mod common;

use std::time::Duration;

use common::*;
use serde_json::json;
use test_case::test_case;
use watson_client::{ProfileParams, ToneAnalyzerV3, ToneParams, WatsonError, WatsonService};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[test_case(400, "api" ; "bad request")]
#[test_case(401, "authentication" ; "unauthorized")]
#[test_case(403, "authentication" ; "forbidden")]
#[test_case(413, "api" ; "payload too large")]
#[test_case(500, "api" ; "internal server error")]
#[tokio::test]
async fn test_status_maps_to_error_kind(status: u16, kind: &str) {
    let server = MockServer::start().await;
    let body = json!({"code": status, "error": "Something went wrong"});

    Mock::given(method("POST"))
        .and(path("/v3/tone"))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(body.clone())
                .insert_header("X-Global-Transaction-Id", "txn-123"),
        )
        .expect(1)
        .mount(&server)
        .await;

    let error = tone_analyzer(&server)
        .tone(ToneParams::new("Text"))
        .await
        .unwrap_err();

    assert_eq!(error.kind(), kind);
    assert_eq!(error.status(), Some(status));
    let returned: serde_json::Value =
        serde_json::from_str(error.body().expect("body kept")).expect("body is json");
    assert_eq!(returned, body);
}

#[tokio::test]
async fn test_api_error_carries_transaction_id() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/profile"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({
                    "code": 400,
                    "sub_code": "S00014",
                    "error": "The number of words 12 is less than the minimum number of words required for analysis: 100"
                }))
                .insert_header("X-Global-Transaction-Id", "txn-456"),
        )
        .mount(&server)
        .await;

    let error = personality_insights(&server)
        .profile(ProfileParams::new("Too short to analyze."))
        .await
        .unwrap_err();

    match error {
        WatsonError::Api {
            message,
            transaction_id,
            ..
        } => {
            assert!(message.starts_with("The number of words 12"));
            assert_eq!(transaction_id.as_deref(), Some("txn-456"));
        }
        other => panic!("Expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_non_json_error_body_is_verbatim() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/tone"))
        .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
        .mount(&server)
        .await;

    let error = tone_analyzer(&server)
        .tone(ToneParams::new("Text"))
        .await
        .unwrap_err();

    assert_eq!(error.body(), Some("<html>Bad Gateway</html>"));
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/tone"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let service = ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .service_url(server.uri())
        .credentials("username", "password")
        .timeout(Duration::from_millis(100))
        .build()
        .expect("Failed to build Tone Analyzer");

    let error = service.tone(ToneParams::new("Text")).await.unwrap_err();
    assert!(matches!(error, WatsonError::Timeout { .. }));
}

#[tokio::test]
async fn test_connection_failure() {
    let service = ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .service_url("http://127.0.0.1:1")
        .credentials("username", "password")
        .build()
        .expect("Failed to build Tone Analyzer");

    let error = service.tone(ToneParams::new("Text")).await.unwrap_err();
    assert!(matches!(error, WatsonError::Transport { .. }));
}

#[tokio::test]
async fn test_failures_are_counted() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/tone"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"code": 401, "error": "Unauthorized"})))
        .mount(&server)
        .await;

    let service = tone_analyzer(&server);
    let _ = service.tone(ToneParams::new("Text")).await;

    let metrics = service.client().observability().metrics().get_metrics();
    assert_eq!(metrics.failed_requests, 1);
    assert_eq!(metrics.errors.get("authentication"), Some(&1));
    assert_eq!(metrics.operations.get("tone"), Some(&1));
}
