//! # scribe-openai
//!
//! OpenAI client used by scribe:
//! - Audio transcription (multipart upload to the transcription endpoint)
//! - Transcript summaries via chat completions
//! - Model listing and a silent-clip probe for diagnostics
//!
//! Every call runs through the retry engine from `scribe-core`, under the
//! retry policy named after the operation.

mod client;
mod error;
mod models;
mod predicate;
pub mod prompts;

pub use client::OpenAiClient;
pub use error::{OpenAiError, OpenAiResult};
pub use models::{AudioUpload, ChatMessage};
pub use predicate::OpenAiRetryPredicate;
