//! Parameter types for Watson operations.
//!
//! One parameter struct per operation, with typed optional fields and a
//! `validate()` that runs before any request is built.

pub mod profile;
pub mod tone;

pub use profile::{Content, ContentItem, ProfileAccept, ProfileParams};
pub use tone::{ToneChatParams, ToneInput, ToneParams, Utterance};
