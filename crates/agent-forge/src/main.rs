//! agent-forge - MCP server for generating and role-playing expert personas
//!
//! Serves over stdio by default; `--http` serves Streamable HTTP on the
//! configured host and port instead.

use std::path::PathBuf;

use agent_forge::{serve, telemetry, ForgeHandler};
use anyhow::{Context, Result};
use clap::Parser;
use forgeconf::ForgeConfig;
use tracing::info;

#[derive(Parser)]
#[command(name = "agent-forge")]
#[command(about = "MCP server for generating and role-playing expert personas")]
#[command(version)]
struct Cli {
    /// Config file to load instead of searching the default locations
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Serve Streamable HTTP on server.host:server.port instead of stdio
    #[arg(long)]
    http: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sources) = ForgeConfig::load_with_sources_from(cli.config.as_deref())
        .context("Failed to load configuration")?;

    if cli.print_config {
        match &sources.file {
            Some(path) => println!("# Loaded from {}", path.display()),
            None => println!("# No config file found, compiled defaults"),
        }
        for var in &sources.env_overrides {
            println!("# Overridden by ${}", var);
        }
        print!("{}", config.to_yaml());
        return Ok(());
    }

    if sources.file.is_none() {
        eprintln!("warning: no config file found, using defaults. Create one at:");
        for path in &sources.searched {
            eprintln!("  - {}", path.display());
        }
    }

    telemetry::init(&config.log)?;

    if let Err(e) = config.validate() {
        tracing::error!(error = %e, "Refusing to start");
        return Err(e.into());
    }

    info!(
        host = %config.server.host,
        port = config.server.port,
        rate_limit = config.server.rate_limit,
        model = %config.deepseek.model,
        "agent-forge {} starting",
        env!("CARGO_PKG_VERSION")
    );

    let handler = ForgeHandler::from_config(&config).context("Failed to set up LLM gateway")?;

    if cli.http {
        serve::run_http(handler, &config.server).await
    } else {
        serve::run_stdio(handler).await
    }
}
