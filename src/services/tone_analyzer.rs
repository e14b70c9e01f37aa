//! Tone Analyzer V3.

use tracing::instrument;

use crate::client::{ServiceClient, WatsonService};
use crate::errors::{WatsonError, WatsonResult};
use crate::transport::{DetailedResponse, HttpMethod};
use crate::types::tone::{ToneChatParams, ToneParams};

/// Tone Analyzer V3 client.
///
/// Detects emotional and language tones in written text, and customer
/// engagement tones in conversations.
///
/// # Example
///
/// ```rust,no_run
/// use watson_client::{ToneAnalyzerV3, ToneInput, ToneParams, WatsonService};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let tone_analyzer = ToneAnalyzerV3::builder()
///     .version("2017-09-21")
///     .iam_apikey("my-api-key")
///     .build()?;
///
/// let response = tone_analyzer
///     .tone(ToneParams::new(ToneInput::new("I am very happy today!")).content_type("application/json"))
///     .await?;
/// println!("{}", response.status());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToneAnalyzerV3 {
    client: ServiceClient,
}

impl WatsonService for ToneAnalyzerV3 {
    const SERVICE_NAME: &'static str = "tone_analyzer";
    const DISPLAY_NAME: &'static str = "Tone Analyzer";
    const DEFAULT_SERVICE_URL: &'static str =
        "https://gateway.watsonplatform.net/tone-analyzer/api";

    fn from_client(client: ServiceClient) -> Self {
        Self { client }
    }

    fn client(&self) -> &ServiceClient {
        &self.client
    }
}

impl ToneAnalyzerV3 {
    /// Analyzes general-purpose tone.
    ///
    /// `POST /v3/tone`. JSON input is serialized when `content_type` is a
    /// JSON type; text and HTML are sent unchanged.
    #[instrument(skip(self, params), fields(operation = "tone"))]
    pub async fn tone(&self, params: ToneParams) -> WatsonResult<DetailedResponse> {
        params.validate()?;
        let ToneParams {
            tone_input,
            content_type,
            sentences,
            tones,
            content_language,
            accept_language,
            headers,
        } = params;
        let tone_input = tone_input.ok_or_else(|| WatsonError::missing_param("tone_input"))?;

        if let Some(tones) = &tones {
            tracing::debug!(?tones, "tones filter forwarded as given");
        }

        let request = self
            .client
            .request(HttpMethod::Post, "/v3/tone", "tone")
            .header("Content-Language", content_language)
            .header("Accept-Language", accept_language)
            .custom_headers(&headers)
            .query("sentences", sentences)
            .query("tones", tones)
            .payload(tone_input, content_type.as_deref())
            .build()?;

        self.client.send("tone", request).await
    }

    /// Analyzes customer-engagement tone in a conversation.
    ///
    /// `POST /v3/tone_chat` with body `{"utterances": [...]}`. Every
    /// utterance is sent; limits are enforced by the service.
    #[instrument(skip(self, params), fields(operation = "tone_chat"))]
    pub async fn tone_chat(&self, params: ToneChatParams) -> WatsonResult<DetailedResponse> {
        params.validate()?;
        let ToneChatParams {
            utterances,
            content_language,
            accept_language,
            headers,
        } = params;
        let utterances = utterances.ok_or_else(|| WatsonError::missing_param("utterances"))?;

        let request = self
            .client
            .request(HttpMethod::Post, "/v3/tone_chat", "tone_chat")
            .header("Content-Language", content_language)
            .header("Accept-Language", accept_language)
            .custom_headers(&headers)
            .wrapped_json("utterances", &utterances)?
            .build()?;

        self.client.send("tone_chat", request).await
    }
}
