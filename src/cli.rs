//! Command-line interface definition for the bridge
//!
//! This module defines the CLI structure using clap's derive API. The
//! bridge is a single-purpose server, so there are no subcommands; the
//! flags override configuration file values.

use clap::Parser;

/// MCP identity bridge
///
/// Terminates MCP over streamable HTTP, multiplexes concurrent client
/// sessions, and forwards each caller's bearer credential to a downstream
/// identity API.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-identity-bridge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the listen port from config
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Override the downstream identity API base URL from config
    #[arg(long, env = "BRIDGE_IDENTITY_URL")]
    pub identity_url: Option<String>,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
