//! wa-gateway - WhatsApp REST facade with admission control and webhook delivery

#![allow(missing_docs)]

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use wa_gateway::server::{self, ServerOverrides};

/// Command line arguments
#[derive(Debug, Parser)]
#[command(name = "wa-gateway", version, about)]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, env = "GATEWAY_CONFIG", default_value = "config/gateway.yaml")]
    config: PathBuf,

    /// Bind address, overrides the configuration file
    #[arg(long)]
    host: Option<String>,

    /// Bind port, overrides the configuration file
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let overrides = ServerOverrides {
        host: args.host,
        port: args.port,
    };

    match server::run_server(Some(&args.config), overrides).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // Print error using Display (not Debug) to preserve newlines
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
