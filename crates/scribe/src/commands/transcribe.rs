//! Transcribe command

use anyhow::{Context, Result};
use camino::Utf8Path;
use scribe_core::RuntimeConfig;
use scribe_openai::AudioUpload;
use serde_json::json;

use crate::cli::TranscribeArgs;
use crate::output;

pub async fn run(args: TranscribeArgs, runtime: &RuntimeConfig) -> Result<()> {
    let client = super::client(runtime)?;

    let bytes = std::fs::read(&args.file).with_context(|| format!("Failed to read {}", args.file))?;
    let filename = args.file.file_name().unwrap_or("audio").to_string();
    let audio = AudioUpload::new(bytes, filename, content_type_for(&args.file));

    if !args.json {
        output::info(&format!(
            "Transcribing {} ({} bytes)",
            args.file,
            audio.bytes.len()
        ));
    }

    let text = client.transcribe(&audio).await.map_err(super::failure)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&json!({ "text": text }))?);
    } else {
        println!("{}", text);
    }
    Ok(())
}

/// MIME type guessed from the file extension
fn content_type_for(path: &Utf8Path) -> &'static str {
    match path.extension().map(str::to_ascii_lowercase).as_deref() {
        Some("mp3" | "mpga" | "mpeg") => "audio/mpeg",
        Some("m4a" | "mp4") => "audio/mp4",
        Some("wav") => "audio/wav",
        Some("webm") => "audio/webm",
        Some("ogg" | "oga") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}
