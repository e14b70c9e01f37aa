//! Personality Insights V3.

use tracing::instrument;

use crate::client::{ServiceClient, WatsonService};
use crate::errors::{WatsonError, WatsonResult};
use crate::transport::{DetailedResponse, HttpMethod};
use crate::types::profile::{ProfileAccept, ProfileParams};

/// Personality Insights V3 client.
///
/// Infers personality characteristics from authored text.
#[derive(Debug, Clone)]
pub struct PersonalityInsightsV3 {
    client: ServiceClient,
}

impl WatsonService for PersonalityInsightsV3 {
    const SERVICE_NAME: &'static str = "personality_insights";
    const DISPLAY_NAME: &'static str = "Personality Insights";
    const DEFAULT_SERVICE_URL: &'static str =
        "https://gateway.watsonplatform.net/personality-insights/api";

    fn from_client(client: ServiceClient) -> Self {
        Self { client }
    }

    fn client(&self) -> &ServiceClient {
        &self.client
    }
}

impl PersonalityInsightsV3 {
    /// Generates a personality profile.
    ///
    /// `POST /v3/profile`. The response is JSON unless
    /// [`ProfileAccept::Csv`] is requested, in which case the body is text.
    #[instrument(skip(self, params), fields(operation = "profile"))]
    pub async fn profile(&self, params: ProfileParams) -> WatsonResult<DetailedResponse> {
        params.validate()?;
        let ProfileParams {
            content,
            accept,
            content_type,
            content_language,
            accept_language,
            raw_scores,
            csv_headers,
            consumption_preferences,
            headers,
        } = params;
        let content = content.ok_or_else(|| WatsonError::missing_param("content"))?;

        let request = self
            .client
            .request(HttpMethod::Post, "/v3/profile", "profile")
            .header("Accept", accept.as_ref().map(ProfileAccept::as_str))
            .header("Content-Language", content_language)
            .header("Accept-Language", accept_language)
            .custom_headers(&headers)
            .query("raw_scores", raw_scores)
            .query("csv_headers", csv_headers)
            .query("consumption_preferences", consumption_preferences)
            .payload(content, content_type.as_deref())
            .build()?;

        self.client.send("profile", request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{MockAuthenticator, MockResponse, MockTransport};
    use crate::transport::{HttpTransport, ResponseBody};
    use crate::types::profile::{Content, ContentItem};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use std::sync::Arc;

    fn service(transport: &Arc<MockTransport>) -> PersonalityInsightsV3 {
        PersonalityInsightsV3::builder()
            .version("2017-10-13")
            .transport(Arc::clone(transport) as Arc<dyn HttpTransport>)
            .authenticator(Arc::new(MockAuthenticator::default()))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_profile_plain_text() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_json(&json!({"word_count": 1365, "processed_language": "en"}));
        let text = "Call me Ishmael. Some years ago, never mind how long precisely...";

        let response = service(&transport)
            .profile(ProfileParams::new(text).content_type("text/plain;charset=utf-8"))
            .await
            .unwrap();

        assert_eq!(response.json_value().unwrap()["word_count"], json!(1365));
        let request = transport.last_request().unwrap();
        assert_eq!(request.path, "/v3/profile");
        assert_eq!(request.query, vec![("version".to_string(), "2017-10-13".to_string())]);
        assert_eq!(request.header("Content-Type"), Some("text/plain;charset=utf-8"));
        assert_eq!(request.body.as_deref(), Some(text.as_bytes()));
    }

    #[tokio::test]
    async fn test_profile_json_with_raw_scores() {
        let transport = Arc::new(MockTransport::new());
        transport.queue_json(&json!({"word_count": 15223}));
        let content = Content {
            content_items: vec![ContentItem::new("Wow, I liked @TheRock before, now I really SMELL what he's cooking!")],
        };

        service(&transport)
            .profile(
                ProfileParams::new(content.clone())
                    .content_type("application/json")
                    .raw_scores(true)
                    .consumption_preferences(true),
            )
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.query_param("raw_scores"), Some("true"));
        assert_eq!(request.query_param("consumption_preferences"), Some("true"));
        assert_eq!(request.query_param("csv_headers"), None);
        let body: Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body, serde_json::to_value(&content).unwrap());
    }

    #[tokio::test]
    async fn test_profile_csv_accept() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(
            MockResponse::text("big5_agreeableness,big5_conscientiousness\n0.1,0.2\n")
                .with_header("content-type", "text/csv"),
        );

        let response = service(&transport)
            .profile(
                ProfileParams::new(json!({"contentItems": []}))
                    .content_type("application/json")
                    .accept(ProfileAccept::Csv)
                    .csv_headers(true),
            )
            .await
            .unwrap();

        assert!(matches!(response.body(), ResponseBody::Text(_)));
        let request = transport.last_request().unwrap();
        assert_eq!(request.header("Accept"), Some("text/csv"));
        assert_eq!(request.query_param("csv_headers"), Some("true"));
    }

    #[tokio::test]
    async fn test_profile_missing_content_makes_no_request() {
        let transport = Arc::new(MockTransport::new());

        let error = service(&transport)
            .profile(ProfileParams::default())
            .await
            .unwrap_err();

        assert!(error.is_client_error());
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_profile_api_error_keeps_body() {
        let transport = Arc::new(MockTransport::new());
        transport.queue(
            MockResponse::json(&json!({"code": 400, "error": "Not enough words", "help": "https://cloud.ibm.com"}))
                .with_status(400)
                .with_header("X-Global-Transaction-Id", "tx-1"),
        );

        let error = service(&transport)
            .profile(ProfileParams::new("too short"))
            .await
            .unwrap_err();

        match error {
            WatsonError::Api {
                status,
                message,
                body,
                transaction_id,
            } => {
                assert_eq!(status, 400);
                assert_eq!(message, "Not enough words");
                assert!(body.unwrap().contains("\"help\""));
                assert_eq!(transaction_id.as_deref(), Some("tx-1"));
            }
            other => panic!("Expected Api error, got {other:?}"),
        }
    }
}
