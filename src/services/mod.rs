//! Watson service clients.
//!
//! Each service is a thin set of operation adapters over a shared
//! [`ServiceClient`](crate::client::ServiceClient); they differ only in
//! their endpoint tables.

mod personality_insights;
mod tone_analyzer;

pub use personality_insights::PersonalityInsightsV3;
pub use tone_analyzer::ToneAnalyzerV3;
