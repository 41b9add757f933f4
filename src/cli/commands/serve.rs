//! Implementation of the `proofloop serve` command.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;

use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::logging;
use crate::infrastructure::mcp;

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Port to bind; overrides the configured port
    #[arg(long)]
    pub port: Option<u16>,
}

pub async fn execute(args: ServeArgs, config_path: Option<PathBuf>) -> Result<()> {
    let config = match config_path {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    let _guard = logging::init(&config.logging)?;

    let optimizer = Arc::new(super::build_optimizer(&config)?);
    let port = args.port.unwrap_or(config.server.port);
    mcp::serve(optimizer, port).await
}
