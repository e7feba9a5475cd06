//! Transport layer for the MCP protocol.
//!
//! Only the stdio transport is supported: newline-delimited JSON-RPC
//! messages on stdin, responses on stdout.

pub mod stdio;

pub use stdio::StdioTransport;

use serde::{Deserialize, Serialize};
use std::fmt;

/// Transports the server can speak
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Newline-delimited JSON-RPC over stdin/stdout
    #[default]
    Stdio,
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportKind::Stdio => write!(f, "stdio"),
        }
    }
}
