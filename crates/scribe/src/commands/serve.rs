//! Serve command

use anyhow::Result;
use scribe_core::RuntimeConfig;

use crate::cli::ServeArgs;
use crate::server;

pub async fn run(args: ServeArgs, mut runtime: RuntimeConfig) -> Result<()> {
    if let Some(host) = args.host {
        runtime.server.host = host;
    }
    if let Some(port) = args.port {
        runtime.server.port = port;
    }
    server::serve(&runtime).await
}
