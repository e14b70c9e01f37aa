//! Parameter types for Tone Analyzer operations.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::errors::{WatsonError, WatsonResult};
use crate::request::Payload;

/// JSON input for the tone operation: `{"text": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToneInput {
    /// The text to analyze.
    pub text: String,
}

impl ToneInput {
    /// Creates a new tone input.
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl From<ToneInput> for Payload {
    fn from(input: ToneInput) -> Self {
        Payload::Json(serde_json::json!({ "text": input.text }))
    }
}

/// One turn of a conversation sent to `tone_chat`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    /// The text of the utterance.
    pub text: String,
    /// The speaker.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
}

impl Utterance {
    /// Creates an utterance without a speaker.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            user: None,
        }
    }

    /// Sets the speaker.
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }
}

/// Parameters for `ToneAnalyzerV3::tone`.
///
/// `tone_input` is required. It may be a [`ToneInput`], any JSON value, or
/// plain text or HTML; `content_type` decides how it is encoded.
#[derive(Debug, Clone, Default)]
pub struct ToneParams {
    /// The content to analyze.
    pub tone_input: Option<Payload>,
    /// Content type of `tone_input`: `application/json`, `text/plain` or `text/html`.
    pub content_type: Option<String>,
    /// Whether to analyze individual sentences.
    pub sentences: Option<bool>,
    /// Tone categories to return. Deprecated by the service for newer
    /// versions; sent as given.
    pub tones: Option<Vec<String>>,
    /// Language of the input.
    pub content_language: Option<String>,
    /// Language of the response.
    pub accept_language: Option<String>,
    /// Extra headers for this call.
    pub headers: HashMap<String, String>,
}

impl ToneParams {
    /// Creates parameters for `tone_input`.
    pub fn new(tone_input: impl Into<Payload>) -> Self {
        Self {
            tone_input: Some(tone_input.into()),
            ..Self::default()
        }
    }

    /// Sets the content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Enables or disables sentence-level analysis.
    pub fn sentences(mut self, sentences: bool) -> Self {
        self.sentences = Some(sentences);
        self
    }

    /// Restricts the tone categories.
    pub fn tones<I, S>(mut self, tones: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tones = Some(tones.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the input language.
    pub fn content_language(mut self, language: impl Into<String>) -> Self {
        self.content_language = Some(language.into());
        self
    }

    /// Sets the response language.
    pub fn accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    /// Adds a header for this call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Checks required fields.
    pub fn validate(&self) -> WatsonResult<()> {
        if self.tone_input.is_none() {
            return Err(WatsonError::missing_param("tone_input"));
        }
        Ok(())
    }
}

/// Parameters for `ToneAnalyzerV3::tone_chat`.
#[derive(Debug, Clone, Default)]
pub struct ToneChatParams {
    /// The conversation, sent in full.
    pub utterances: Option<Vec<Utterance>>,
    /// Language of the input.
    pub content_language: Option<String>,
    /// Language of the response.
    pub accept_language: Option<String>,
    /// Extra headers for this call.
    pub headers: HashMap<String, String>,
}

impl ToneChatParams {
    /// Creates parameters for `utterances`.
    pub fn new(utterances: Vec<Utterance>) -> Self {
        Self {
            utterances: Some(utterances),
            ..Self::default()
        }
    }

    /// Sets the input language.
    pub fn content_language(mut self, language: impl Into<String>) -> Self {
        self.content_language = Some(language.into());
        self
    }

    /// Sets the response language.
    pub fn accept_language(mut self, language: impl Into<String>) -> Self {
        self.accept_language = Some(language.into());
        self
    }

    /// Adds a header for this call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Checks required fields. An empty list is forwarded; the service decides.
    pub fn validate(&self) -> WatsonResult<()> {
        if self.utterances.is_none() {
            return Err(WatsonError::missing_param("utterances"));
        }
        Ok(())
    }
}
