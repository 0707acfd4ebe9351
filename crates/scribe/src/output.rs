//! Styled terminal output for CLI commands

use console::style;
use scribe_core::retry::RetryError;
use scribe_openai::OpenAiError;

pub fn success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

pub fn error(msg: &str) {
    eprintln!("{} {}", style("✗").red().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("{} {}", style("⚠").yellow().bold(), msg);
}

pub fn info(msg: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Underlined section title
pub fn header(msg: &str) {
    println!("\n{}", style(msg).bold().underlined());
}

/// Indented `key: value` line with a dimmed key
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", style(key).dim(), value);
}

/// One-line explanation of why a retried OpenAI call gave up
pub fn describe_failure(err: &RetryError<OpenAiError>) -> String {
    match err {
        RetryError::Exhausted { source, .. } if source.is_rate_limited() => format!(
            "rate limited by OpenAI after {} attempts; wait a moment and try again",
            err.attempts()
        ),
        RetryError::Exhausted { source, .. } => {
            format!("{} (gave up after {} attempts)", source, err.attempts())
        }
        RetryError::NonRetryable { source, .. } => source.to_string(),
        RetryError::Cancelled { .. } => format!(
            "request deadline reached after {} attempts",
            err.attempts()
        ),
    }
}
