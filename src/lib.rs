//! IBM Watson Client Library
//!
//! An async Rust client for the IBM Watson **Tone Analyzer V3** and
//! **Personality Insights V3** APIs. Each operation turns a typed parameter
//! struct into an HTTP request, attaches credentials and returns the raw
//! response envelope.
//!
//! # Features
//!
//! - **Authentication**: basic, IAM API key with managed token refresh,
//!   ICP4D, and user-managed bearer tokens
//! - **Request building**: header layering, query encoding and JSON or
//!   verbatim bodies chosen from the declared content type
//! - **Observability**: tracing spans, redacted debug logs, request metrics
//! - **Testability**: pluggable transport and authenticator, mocks behind
//!   the `mocks` feature
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use watson_client::{ToneAnalyzerV3, ToneInput, ToneParams, WatsonService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tone_analyzer = ToneAnalyzerV3::builder()
//!         .version("2017-09-21")
//!         .iam_apikey("your-api-key")
//!         .build()?;
//!
//!     let params = ToneParams::new(ToneInput::new("I am thrilled with the results!"))
//!         .content_type("application/json");
//!
//!     let response = tone_analyzer.tone(params).await?;
//!     println!("{:?}", response.json_value());
//!     Ok(())
//! }
//! ```
//!
//! # Profile Example
//!
//! ```rust,no_run
//! use watson_client::{PersonalityInsightsV3, ProfileAccept, ProfileParams, WatsonService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let personality_insights = PersonalityInsightsV3::builder()
//!         .version("2017-10-13")
//!         .credentials("username", "password")
//!         .build()?;
//!
//!     let text = std::fs::read_to_string("profile.txt")?;
//!     let response = personality_insights
//!         .profile(
//!             ProfileParams::new(text)
//!                 .content_type("text/plain;charset=utf-8")
//!                 .accept(ProfileAccept::Csv)
//!                 .csv_headers(true),
//!         )
//!         .await?;
//!     println!("{}", response.text().unwrap_or_default());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod auth;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod request;
pub mod services;
pub mod transport;
pub mod types;

// Re-exports for convenience
pub use auth::{AuthenticationType, Authenticator};
pub use client::{ServiceClient, ServiceClientBuilder, WatsonService};
pub use config::{ServiceConfig, ServiceConfigBuilder};
pub use errors::{WatsonError, WatsonResult};
pub use request::{ContentEncoding, Payload, QueryValue, RequestBuilder};
pub use services::{PersonalityInsightsV3, ToneAnalyzerV3};
pub use transport::{DetailedResponse, ResponseBody};

// Type re-exports
pub use types::profile::{Content, ContentItem, ProfileAccept, ProfileParams};
pub use types::tone::{ToneChatParams, ToneInput, ToneParams, Utterance};

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
