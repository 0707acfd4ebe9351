//! Config command

use anyhow::Result;
use scribe_core::RuntimeConfig;

use crate::cli::{ConfigCommands, ConfigShowArgs};
use crate::output;

pub fn run(cmd: ConfigCommands, runtime: &RuntimeConfig) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, runtime),
    }
}

fn show(args: ConfigShowArgs, runtime: &RuntimeConfig) -> Result<()> {
    let display = masked(runtime);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&display)?);
        return Ok(());
    }

    if display.openai.api_key.is_none() {
        output::warning("No OpenAI API key configured");
    }
    output::header("Resolved configuration");
    print!("{}", serde_yaml_ng::to_string(&display)?);
    Ok(())
}

/// Copy of the config that is safe to print
fn masked(runtime: &RuntimeConfig) -> RuntimeConfig {
    let mut display = runtime.clone();
    display.openai.api_key = runtime.openai.masked_api_key();
    display
}
