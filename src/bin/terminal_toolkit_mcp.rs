//! terminal-toolkit-mcp
//!
//! Serves the terminal toolkit to MCP clients over stdio.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use terminal_toolkit_mcp::config::{get_settings, ServerSettings};
use terminal_toolkit_mcp::mcp::lifecycle::ServerInfo;
use terminal_toolkit_mcp::mcp::transport::TransportKind;
use terminal_toolkit_mcp::{
    init_telemetry, McpServer, TelemetryConfig, TerminalToolkitFactory, ToolkitRegistry,
};

#[derive(Parser, Debug)]
#[command(name = "terminal-toolkit-mcp")]
#[command(about = "MCP server exposing a terminal toolkit", long_about = None)]
struct Args {
    /// Directory commands run in
    #[arg(long)]
    working_directory: Option<PathBuf>,

    /// Timeout for terminal operations, in seconds
    #[arg(long)]
    timeout: Option<f64>,

    /// Reject dangerous commands
    #[arg(long, overrides_with = "no_safe_mode")]
    safe_mode: bool,

    /// Allow dangerous commands
    #[arg(long, overrides_with = "safe_mode")]
    no_safe_mode: bool,

    /// Allow interactive use
    #[arg(long)]
    interactive: bool,

    /// Transport to serve on
    #[arg(long, value_enum)]
    transport: Option<TransportKind>,

    /// YAML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn apply(self, settings: &mut ServerSettings) {
        if let Some(dir) = self.working_directory {
            settings.toolkit.working_directory = Some(dir);
        }
        if let Some(timeout) = self.timeout {
            settings.toolkit.timeout = timeout;
        }
        if self.safe_mode {
            settings.toolkit.safe_mode = true;
        }
        if self.no_safe_mode {
            settings.toolkit.safe_mode = false;
        }
        if self.interactive {
            settings.toolkit.interactive = true;
        }
        if let Some(transport) = self.transport {
            settings.transport = transport;
        }
        if let Some(level) = self.log_level {
            settings.log_level = level;
        }
    }
}

async fn run(settings: ServerSettings) -> Result<()> {
    let registry = Arc::new(ToolkitRegistry::new(
        Arc::new(TerminalToolkitFactory),
        settings.toolkit,
    ));
    let server = McpServer::new(registry, ServerInfo::default()).await;
    server.serve(settings.transport).await?;
    info!("Input closed, shutting down");
    Ok(())
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let settings = get_settings(args.config.as_deref()).context("Failed to load settings");
    let mut settings = match settings {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    };
    args.apply(&mut settings);

    if let Err(e) = init_telemetry(TelemetryConfig {
        log_level: settings.log_level.clone(),
        ..TelemetryConfig::default()
    }) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(settings).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}
