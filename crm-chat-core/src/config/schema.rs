//! Configuration schema definitions

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Root configuration for crm-chat
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name of the environment used when the CLI does not select one
    #[serde(default = "default_environment_name")]
    pub environment: String,
    /// Deployment environments, keyed by name
    #[serde(default)]
    pub environments: HashMap<String, EnvironmentConfig>,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: default_environment_name(),
            environments: HashMap::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Resolve a deployment environment by name, falling back to the
    /// configured default when no name is given.
    pub fn resolve_environment(
        &self,
        name: Option<&str>,
    ) -> crate::Result<(&str, &EnvironmentConfig)> {
        let name = name.unwrap_or(&self.environment);
        match self.environments.get_key_value(name) {
            Some((key, env)) => Ok((key.as_str(), env)),
            None => Err(crate::Error::NotFound(format!(
                "environment '{}' is not configured",
                name
            ))),
        }
    }
}

fn default_environment_name() -> String {
    "default".to_string()
}

/// One deployment environment of the managed agent service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Base URL of the agent runtime endpoint
    #[serde(default)]
    pub endpoint: String,
    /// Identifier of the deployed agent
    #[serde(default)]
    pub agent_id: String,
    /// Bearer credential for the endpoint; empty means unauthenticated
    #[serde(default)]
    pub api_key: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for EnvironmentConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            agent_id: String::new(),
            api_key: String::new(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
    /// Directory for log files
    #[serde(default = "default_log_dir")]
    pub dir: String,
    /// Module-specific overrides
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            dir: default_log_dir(),
            overrides: HashMap::new(),
        }
    }
}
