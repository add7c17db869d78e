//! Configuration management for the bridge
//!
//! This module handles loading, parsing, validating, and merging
//! configuration from a YAML file, environment variables, and CLI
//! overrides. Precedence is file < environment < CLI.

use crate::error::{BridgeError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for the bridge
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP listener configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Downstream identity API configuration
    #[serde(default)]
    pub identity: IdentityConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Path of the MCP endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_endpoint() -> String {
    "/mcp".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            endpoint: default_endpoint(),
        }
    }
}

/// Downstream identity API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Base URL of the identity API
    #[serde(default = "default_identity_base_url")]
    pub base_url: String,

    /// Per-request timeout for identity calls (seconds)
    #[serde(default = "default_identity_timeout")]
    pub timeout_seconds: u64,
}

fn default_identity_base_url() -> String {
    "http://localhost:8080/".to_string()
}

fn default_identity_timeout() -> u64 {
    10
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            base_url: default_identity_base_url(),
            timeout_seconds: default_identity_timeout(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| BridgeError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| BridgeError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(host) = std::env::var("BRIDGE_HOST") {
            self.server.host = host;
        }

        if let Ok(port) = std::env::var("BRIDGE_PORT") {
            if let Ok(value) = port.parse() {
                self.server.port = value;
            } else {
                tracing::warn!("Invalid BRIDGE_PORT: {}", port);
            }
        }

        if let Ok(endpoint) = std::env::var("BRIDGE_ENDPOINT") {
            self.server.endpoint = endpoint;
        }

        if let Ok(base_url) = std::env::var("BRIDGE_IDENTITY_URL") {
            self.identity.base_url = base_url;
        }

        if let Ok(timeout) = std::env::var("BRIDGE_IDENTITY_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.identity.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid BRIDGE_IDENTITY_TIMEOUT_SECONDS: {}", timeout);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(port) = cli.port {
            self.server.port = port;
        }
        if let Some(identity_url) = &cli.identity_url {
            self.identity.base_url = identity_url.clone();
        }
    }

    /// Validate the merged configuration
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Config`] describing the first invalid field
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(BridgeError::Config("server.port must be non-zero".to_string()).into());
        }

        if !self.server.endpoint.starts_with('/') {
            return Err(BridgeError::Config(format!(
                "server.endpoint must start with '/': {}",
                self.server.endpoint
            ))
            .into());
        }

        url::Url::parse(&self.identity.base_url).map_err(|e| {
            BridgeError::Config(format!(
                "identity.base_url is not a valid URL ({}): {}",
                self.identity.base_url, e
            ))
        })?;

        if self.identity.timeout_seconds == 0 {
            return Err(
                BridgeError::Config("identity.timeout_seconds must be non-zero".to_string()).into(),
            );
        }

        Ok(())
    }
}
