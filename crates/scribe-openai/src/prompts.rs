//! Prompt text for transcript summaries

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are a professional summarizer. Create a clear, concise summary of the provided audio transcription. Focus on the main points, key insights, and important details while maintaining the original meaning.";

/// User message asking for a summary of `transcription`
pub fn summary_request(transcription: &str) -> String {
    format!(
        "Please provide a summary of this audio transcription:\n\n{}",
        transcription
    )
}
