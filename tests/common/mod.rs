//! Shared helpers for integration tests.

#![allow(dead_code)]

use watson_client::{PersonalityInsightsV3, ToneAnalyzerV3, WatsonService};
use wiremock::MockServer;

pub const TONE_VERSION: &str = "2017-09-21";
pub const PROFILE_VERSION: &str = "2017-10-13";

/// `base64("username:password")`
pub const BASIC_USERNAME_PASSWORD: &str = "Basic dXNlcm5hbWU6cGFzc3dvcmQ=";

pub fn tone_analyzer(server: &MockServer) -> ToneAnalyzerV3 {
    ToneAnalyzerV3::builder()
        .version(TONE_VERSION)
        .service_url(server.uri())
        .credentials("username", "password")
        .build()
        .expect("Failed to build Tone Analyzer")
}

pub fn personality_insights(server: &MockServer) -> PersonalityInsightsV3 {
    PersonalityInsightsV3::builder()
        .version(PROFILE_VERSION)
        .service_url(server.uri())
        .credentials("username", "password")
        .build()
        .expect("Failed to build Personality Insights")
}

pub fn profile_response() -> serde_json::Value {
    serde_json::json!({
        "word_count": 1365,
        "processed_language": "en",
        "personality": [
            {
                "trait_id": "big5_openness",
                "name": "Openness",
                "category": "personality",
                "percentile": 0.8,
                "raw_score": 0.77
            }
        ],
        "warnings": []
    })
}
