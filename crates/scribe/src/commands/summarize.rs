//! Summarize command

use anyhow::{bail, Context, Result};
use scribe_core::RuntimeConfig;

use crate::cli::SummarizeArgs;
use crate::output;

pub async fn run(args: SummarizeArgs, runtime: &RuntimeConfig) -> Result<()> {
    let transcription = match (args.text, args.file) {
        (Some(text), _) => text,
        (None, Some(file)) => {
            std::fs::read_to_string(&file).with_context(|| format!("Failed to read {}", file))?
        }
        (None, None) => bail!("Provide a transcript file or --text"),
    };
    if transcription.trim().is_empty() {
        bail!("Transcript is empty");
    }

    let client = super::client(runtime)?;
    let summary = client
        .summarize(&transcription)
        .await
        .map_err(super::failure)?;

    output::header("Summary");
    println!("{}", summary);
    Ok(())
}
