//! Integration tests for the authentication modes.

mod common;

use std::time::Duration;

use common::*;
use serde_json::json;
use watson_client::{AuthenticationType, ToneAnalyzerV3, ToneParams, WatsonError, WatsonService};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// `base64("bx:bx")`
const DEFAULT_IAM_CLIENT: &str = "Basic Yng6Yng=";

async fn mount_tone(server: &MockServer, authorization: &str, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v3/tone"))
        .and(header("Authorization", authorization))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"document_tone": {}})))
        .expect(expected_calls)
        .mount(server)
        .await;
}

fn iam_service(server: &MockServer) -> ToneAnalyzerV3 {
    ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .service_url(server.uri())
        .iam_apikey("my-api-key")
        .iam_url(format!("{}/identity/token", server.uri()))
        .build()
        .expect("Failed to build Tone Analyzer")
}

#[tokio::test]
async fn test_basic_authentication() {
    let server = MockServer::start().await;
    mount_tone(&server, BASIC_USERNAME_PASSWORD, 1).await;

    let service = tone_analyzer(&server);
    assert_eq!(service.client().authentication_type(), AuthenticationType::Basic);

    service
        .tone(ToneParams::new("Text"))
        .await
        .expect("tone failed");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_iam_token_is_fetched_once_for_concurrent_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(header("Authorization", DEFAULT_IAM_CLIENT))
        .and(header("Content-Type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("apikey=my-api-key"))
        .and(body_string_contains("response_type=cloud_iam"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({
                    "access_token": "iam-access-token",
                    "refresh_token": "refresh",
                    "token_type": "Bearer",
                    "expires_in": 3600
                }))
                .set_delay(Duration::from_millis(200)),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_tone(&server, "Bearer iam-access-token", 16).await;

    let service = iam_service(&server);
    let calls = (0..16).map(|_| service.tone(ToneParams::new("Text")));
    let results = futures::future::join_all(calls).await;

    assert!(results.iter().all(Result::is_ok));
}

#[tokio::test]
async fn test_iam_token_is_reused_across_sequential_calls() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "iam-access-token",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_tone(&server, "Bearer iam-access-token", 3).await;

    let service = iam_service(&server);
    for _ in 0..3 {
        service.tone(ToneParams::new("Text")).await.expect("tone failed");
    }
}

#[tokio::test]
async fn test_iam_token_failure_is_authentication_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errorCode": "BXNIM0415E",
            "errorMessage": "Provided API key could not be found"
        })))
        .mount(&server)
        .await;

    let error = iam_service(&server)
        .tone(ToneParams::new("Text"))
        .await
        .unwrap_err();

    match error {
        WatsonError::Authentication { status, message, .. } => {
            assert_eq!(status, Some(400));
            assert!(message.contains("Provided API key could not be found"));
        }
        other => panic!("Expected Authentication error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_apikey_username_uses_iam() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identity/token"))
        .and(body_string_contains("apikey=secret-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "from-password",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_tone(&server, "Bearer from-password", 1).await;

    let service = ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .service_url(server.uri())
        .credentials("apikey", "secret-key")
        .iam_url(format!("{}/identity/token", server.uri()))
        .build()
        .expect("Failed to build Tone Analyzer");

    service.tone(ToneParams::new("Text")).await.expect("tone failed");
}

#[tokio::test]
async fn test_user_managed_iam_access_token() {
    let server = MockServer::start().await;
    mount_tone(&server, "Bearer user-token", 1).await;

    let service = ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .service_url(server.uri())
        .iam_access_token("user-token")
        .build()
        .expect("Failed to build Tone Analyzer");

    service.tone(ToneParams::new("Text")).await.expect("tone failed");
}

#[tokio::test]
async fn test_icp4d_managed_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/preauth/validateAuth"))
        .and(header("Authorization", BASIC_USERNAME_PASSWORD))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "username",
            "role": "Admin",
            "accessToken": "icp4d-token",
            "_messageCode_": "success",
            "message": "success"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_tone(&server, "Bearer icp4d-token", 2).await;

    let service = ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .service_url(server.uri())
        .icp4d_url(server.uri())
        .credentials("username", "password")
        .build()
        .expect("Failed to build Tone Analyzer");

    assert_eq!(service.client().authentication_type(), AuthenticationType::Icp4d);
    service.tone(ToneParams::new("Text")).await.expect("tone failed");
    service.tone(ToneParams::new("Text")).await.expect("tone failed");
}

#[test]
fn test_credentials_with_braces_are_rejected() {
    let result = ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .credentials("{username}", "password")
        .build();

    assert!(matches!(result, Err(WatsonError::Configuration { .. })));
}
