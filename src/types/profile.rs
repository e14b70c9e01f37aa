//! Parameter types for Personality Insights operations.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::errors::{WatsonError, WatsonResult};
use crate::request::{Payload, APPLICATION_JSON};

/// A single piece of authored content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentItem {
    /// The content to analyze.
    pub content: String,
    /// Unique identifier of the item.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Creation time in milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<i64>,
    /// Last update time in milliseconds since the epoch.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated: Option<i64>,
    /// MIME type of the content: `text/plain` or `text/html`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contenttype: Option<String>,
    /// Language of the content.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Identifier of the item this one replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parentid: Option<String>,
    /// Whether the item is a reply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply: Option<bool>,
    /// Whether the item was forwarded or copied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward: Option<bool>,
}

impl ContentItem {
    /// Creates an item with only its text set.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            id: None,
            created: None,
            updated: None,
            contenttype: None,
            language: None,
            parentid: None,
            reply: None,
            forward: None,
        }
    }
}

/// JSON input for the profile operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Content {
    /// The authored items.
    #[serde(rename = "contentItems")]
    pub content_items: Vec<ContentItem>,
}

impl From<ContentItem> for Value {
    fn from(item: ContentItem) -> Self {
        let mut fields = Map::new();
        fields.insert("content".to_string(), Value::from(item.content));
        let optional = [
            ("id", item.id.map(Value::from)),
            ("created", item.created.map(Value::from)),
            ("updated", item.updated.map(Value::from)),
            ("contenttype", item.contenttype.map(Value::from)),
            ("language", item.language.map(Value::from)),
            ("parentid", item.parentid.map(Value::from)),
            ("reply", item.reply.map(Value::from)),
            ("forward", item.forward.map(Value::from)),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.insert(name.to_string(), value);
            }
        }
        Value::Object(fields)
    }
}

impl From<Content> for Payload {
    fn from(content: Content) -> Self {
        let items = content.content_items.into_iter().map(Value::from).collect();
        let mut body = Map::new();
        body.insert("contentItems".to_string(), Value::Array(items));
        Payload::Json(Value::Object(body))
    }
}

/// Response format of a profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProfileAccept {
    /// `application/json`
    #[default]
    Json,
    /// `text/csv`
    Csv,
}

impl ProfileAccept {
    /// The `Accept` header value.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileAccept::Json => APPLICATION_JSON,
            ProfileAccept::Csv => "text/csv",
        }
    }
}

/// Parameters for `PersonalityInsightsV3::profile`.
#[derive(Debug, Clone, Default)]
pub struct ProfileParams {
    /// The content to analyze, as [`Content`], any JSON value, or text.
    pub content: Option<Payload>,
    /// Requested response format.
    pub accept: Option<ProfileAccept>,
    /// Content type of `content`.
    pub content_type: Option<String>,
    /// Language of the input.
    pub content_language: Option<String>,
    /// Language of the response.
    pub accept_language: Option<String>,
    /// Include raw scores alongside normalized percentiles.
    pub raw_scores: Option<bool>,
    /// Include column headers in CSV output.
    pub csv_headers: Option<bool>,
    /// Include consumption preferences.
    pub consumption_preferences: Option<bool>,
    /// Extra headers for this call.
    pub headers: HashMap<String, String>,
}

impl ProfileParams {
    /// Creates parameters for `content`.
    pub fn new(content: impl Into<Payload>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    /// Sets the response format.
    pub fn accept(mut self, accept: ProfileAccept) -> Self {
        self.accept = Some(accept);
        self
    }

    /// Sets the content type.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
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

    /// Requests raw scores.
    pub fn raw_scores(mut self, raw_scores: bool) -> Self {
        self.raw_scores = Some(raw_scores);
        self
    }

    /// Requests CSV column headers.
    pub fn csv_headers(mut self, csv_headers: bool) -> Self {
        self.csv_headers = Some(csv_headers);
        self
    }

    /// Requests consumption preferences.
    pub fn consumption_preferences(mut self, consumption_preferences: bool) -> Self {
        self.consumption_preferences = Some(consumption_preferences);
        self
    }

    /// Adds a header for this call.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Checks required fields.
    pub fn validate(&self) -> WatsonResult<()> {
        if self.content.is_none() {
            return Err(WatsonError::missing_param("content"));
        }
        Ok(())
    }
}
