//! Command implementations

pub mod check;
pub mod config;
pub mod serve;
pub mod summarize;
pub mod transcribe;

use anyhow::{anyhow, Error};
use scribe_core::retry::RetryError;
use scribe_core::RuntimeConfig;
use scribe_openai::{OpenAiClient, OpenAiError};

use crate::output;

/// Client for commands that cannot run without an API key
fn client(runtime: &RuntimeConfig) -> anyhow::Result<OpenAiClient> {
    OpenAiClient::new(runtime).map_err(|err| match err {
        OpenAiError::MissingApiKey => anyhow!(
            "{}. Set OPENAI_API_KEY or openai.api-key in ~/.scribe/config.yaml",
            err
        ),
        other => Error::new(other).context("Failed to create OpenAI client"),
    })
}

fn failure(err: RetryError<OpenAiError>) -> Error {
    anyhow!(output::describe_failure(&err))
}
