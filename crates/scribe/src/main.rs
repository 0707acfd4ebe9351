//! Scribe CLI - audio transcription and summaries backed by OpenAI
//!
//! Runs the HTTP proxy (`scribe serve`) or talks to OpenAI directly from the
//! terminal.

mod cli;
mod commands;
mod output;
mod server;

use anyhow::Result;
use clap::Parser;
use scribe_core::ConfigLoader;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Install the rustls crypto provider before any TLS connection is made
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    // A local .env is optional
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let runtime = ConfigLoader::new()?.load(cli.config.as_deref())?;

    match cli.command {
        Commands::Serve(args) => commands::serve::run(args, runtime).await,
        Commands::Transcribe(args) => commands::transcribe::run(args, &runtime).await,
        Commands::Summarize(args) => commands::summarize::run(args, &runtime).await,
        Commands::Check => commands::check::run(&runtime).await,
        Commands::Config(args) => commands::config::run(args, &runtime),
    }
}

/// Initialize tracing with appropriate verbosity
fn init_tracing(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("info"),
            1 => EnvFilter::new("debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
