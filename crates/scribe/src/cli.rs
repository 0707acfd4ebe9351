//! CLI argument parsing with clap

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

/// Scribe - transcribe audio and summarize it with OpenAI
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a config file layered over ~/.scribe/config.yaml
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the HTTP proxy server
    Serve(ServeArgs),

    /// Transcribe an audio file
    Transcribe(TranscribeArgs),

    /// Summarize a transcript
    Summarize(SummarizeArgs),

    /// Check the API key and the transcription endpoint
    Check,

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Interface to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long)]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
pub struct TranscribeArgs {
    /// Audio file to upload
    pub file: Utf8PathBuf,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct SummarizeArgs {
    /// File containing the transcript
    #[arg(conflicts_with = "text", required_unless_present = "text")]
    pub file: Option<Utf8PathBuf>,

    /// Transcript text given inline
    #[arg(short, long)]
    pub text: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration
    Show(ConfigShowArgs),
}

#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
