use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::mcp::transport::TransportKind;
use crate::utils::error::{McpError, McpResult};

/// Settings for the MCP server process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Options forwarded to the toolkit factory
    #[serde(default)]
    pub toolkit: ToolkitConfig,

    /// Transport the server speaks
    #[serde(default)]
    pub transport: TransportKind,

    /// Log level used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            toolkit: ToolkitConfig::default(),
            transport: TransportKind::default(),
            log_level: default_log_level(),
        }
    }
}

/// Options the toolkit is built with.
///
/// Captured once at startup and never reloaded. The adapter itself does
/// not enforce `timeout` or `safe_mode`; it forwards them to the toolkit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolkitConfig {
    /// Directory commands run in
    #[serde(default)]
    pub working_directory: Option<PathBuf>,

    /// Timeout for terminal operations, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: f64,

    /// Reject dangerous commands
    #[serde(default = "default_safe_mode")]
    pub safe_mode: bool,

    /// Allow interactive use
    #[serde(default)]
    pub interactive: bool,
}

impl Default for ToolkitConfig {
    fn default() -> Self {
        Self {
            working_directory: None,
            timeout: default_timeout(),
            safe_mode: default_safe_mode(),
            interactive: false,
        }
    }
}

fn default_timeout() -> f64 {
    20.0
}

fn default_safe_mode() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load settings from a YAML file
pub fn load_settings<P: AsRef<Path>>(path: P) -> McpResult<ServerSettings> {
    let mut file = File::open(path.as_ref())
        .map_err(|e| McpError::Config(format!("Failed to open config file: {}", e)))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)
        .map_err(|e| McpError::Config(format!("Failed to read config file: {}", e)))?;

    serde_yaml::from_str(&contents)
        .map_err(|e| McpError::Config(format!("Failed to parse config file: {}", e)))
}

/// Get settings, optionally from a specific file
///
/// Without an explicit path, `terminal_toolkit_mcp.yaml` in the current
/// directory is used when present; otherwise defaults apply.
pub fn get_settings(config_path: Option<&Path>) -> McpResult<ServerSettings> {
    match config_path {
        Some(path) => load_settings(path),
        None => {
            let default_path = Path::new("terminal_toolkit_mcp.yaml");
            if default_path.exists() {
                load_settings(default_path)
            } else {
                Ok(ServerSettings::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_toolkit_defaults() {
        let config = ToolkitConfig::default();
        assert_eq!(config.timeout, 20.0);
        assert!(config.safe_mode);
        assert!(!config.interactive);
        assert!(config.working_directory.is_none());
    }

    #[test]
    fn test_load_partial_yaml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "toolkit:\n  working_directory: /tmp/work\n  safe_mode: false\ntransport: stdio"
        )
        .unwrap();

        let settings = load_settings(file.path()).unwrap();
        assert_eq!(
            settings.toolkit.working_directory,
            Some(PathBuf::from("/tmp/work"))
        );
        assert!(!settings.toolkit.safe_mode);
        assert_eq!(settings.toolkit.timeout, 20.0);
        assert_eq!(settings.transport, TransportKind::Stdio);
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_unsupported_transport_is_config_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "transport: sse").unwrap();

        let err = load_settings(file.path()).unwrap_err();
        assert!(matches!(err, McpError::Config(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_settings("/definitely/not/here.yaml").unwrap_err();
        assert!(err.is_fatal());
    }
}
