//! Check command: verify the key and the transcription endpoint

use anyhow::{bail, Result};
use scribe_core::RuntimeConfig;

use crate::output;

pub async fn run(runtime: &RuntimeConfig) -> Result<()> {
    let client = super::client(runtime)?;

    output::header("OpenAI");
    output::kv("Base URL", &client.config().base_url);
    output::kv(
        "API key",
        client.config().masked_api_key().as_deref().unwrap_or("missing"),
    );

    let mut failed = false;

    match client.list_models().await {
        Ok(models) => {
            output::success(&format!("API key working ({} models available)", models.len()));
        }
        Err(err) => {
            failed = true;
            output::error(&format!("Model listing failed: {}", output::describe_failure(&err)));
        }
    }

    match client.probe_whisper().await {
        Ok(_) => output::success(&format!(
            "Transcription endpoint working ({})",
            client.config().transcription_model
        )),
        Err(err) => {
            failed = true;
            output::error(&format!(
                "Transcription probe failed: {}",
                output::describe_failure(&err)
            ));
        }
    }

    if failed {
        bail!("OpenAI check failed");
    }
    Ok(())
}
