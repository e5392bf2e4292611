//! Environment-based server configuration.
//!
//! # Example
//!
//! ```no_run
//! use formulaic_web::config::ServerConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! // Reads CONFIG_ENV (defaults to development) and the EXPOSE_* settings
//! let config = ServerConfig::from_env()?;
//! let groups = config.exposure_groups();
//! # Ok(())
//! # }
//! ```
//!
//! # Variables
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `CONFIG_ENV` | `development`, `staging` or `production` | `development` |
//! | `SERVICE_NAME` | reported in internal error responses | `formulaic` |
//! | `SERVICE_VERSION` | reported in internal error responses | crate version |
//! | `BIND_ADDRESS` | listen address | `0.0.0.0:3000` |
//! | `LOG_LEVEL` | default log filter when `RUST_LOG` is unset | per environment |
//! | `EXPOSE_INFO` | expose the `info` group | `true` |
//! | `EXPOSE_DEBUG` | expose the `debug` group | development only |
//! | `EXPOSE_GROUPS` | comma-separated groups replacing the defaults | unset |
//! | `EXPOSE_ADDITIONAL_GROUPS` | comma-separated groups added to the defaults | unset |

use formulaic_core::{ExposureGroups, group};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

/// Configuration error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid environment value
    #[error("Invalid environment: {0}")]
    InvalidEnvironment(String),
    /// A variable could not be parsed
    #[error("Failed to parse {variable}: {value:?}")]
    Parse {
        /// Variable name
        variable: String,
        /// Offending value
        value: String,
    },
    /// Configuration validation failed
    #[error("Configuration validation failed: {0}")]
    Validation(String),
}

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment (local)
    #[default]
    Development,
    /// Staging environment (pre-production)
    Staging,
    /// Production environment
    Production,
}

impl Environment {
    /// Check if this is production environment
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if this is development environment
    #[must_use]
    pub const fn is_development(self) -> bool {
        matches!(self, Self::Development)
    }

    const fn default_log_level(self) -> &'static str {
        match self {
            Self::Development => "debug",
            Self::Staging => "info",
            Self::Production => "warn",
        }
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" | "development" => Ok(Self::Development),
            "staging" | "stage" => Ok(Self::Staging),
            "prod" | "production" => Ok(Self::Production),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Staging => write!(f, "staging"),
            Self::Production => write!(f, "production"),
        }
    }
}

/// Which exposure groups responses are rendered with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureConfig {
    /// Expose the `info` group
    pub info: bool,
    /// Expose the `debug` group
    pub debug: bool,
    /// Groups replacing `info`/`debug` entirely
    pub groups: Option<Vec<String>>,
    /// Groups added on top
    pub additional_groups: Vec<String>,
}

impl ExposureConfig {
    /// Defaults for `environment`: `info` always, `debug` in development.
    #[must_use]
    pub const fn for_environment(environment: Environment) -> Self {
        Self {
            info: true,
            debug: environment.is_development(),
            groups: None,
            additional_groups: Vec::new(),
        }
    }

    /// Resolve the configured groups.
    #[must_use]
    pub fn groups(&self) -> ExposureGroups {
        let mut groups = match &self.groups {
            Some(explicit) => explicit.iter().cloned().collect(),
            None => {
                let mut defaults = ExposureGroups::new();
                if self.info {
                    defaults.insert(group::INFO);
                }
                if self.debug {
                    defaults.insert(group::DEBUG);
                }
                defaults
            }
        };
        groups.extend(self.additional_groups.iter().cloned());
        groups
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Deployment environment
    pub environment: Environment,
    /// Service name reported in internal error responses
    pub service_name: String,
    /// Service version reported in internal error responses
    pub service_version: String,
    /// Listen address
    pub bind_address: SocketAddr,
    /// Default log filter (trace, debug, info, warn, error)
    pub log_level: String,
    /// Exposure settings
    pub exposure: ExposureConfig,
}

impl ServerConfig {
    /// Defaults for `environment`.
    #[must_use]
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            service_name: "formulaic".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            log_level: environment.default_log_level().to_string(),
            exposure: ExposureConfig::for_environment(environment),
        }
    }

    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or the result is invalid
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|variable| std::env::var(variable).ok())
    }

    /// Load configuration reading variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns error if a variable is malformed or the result is invalid
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = lookup("CONFIG_ENV")
            .map(|value| value.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();
        let mut config = Self::for_environment(environment);

        if let Some(name) = lookup("SERVICE_NAME") {
            config.service_name = name;
        }
        if let Some(version) = lookup("SERVICE_VERSION") {
            config.service_version = version;
        }
        if let Some(address) = lookup("BIND_ADDRESS") {
            config.bind_address = address.parse().map_err(|_| ConfigError::Parse {
                variable: "BIND_ADDRESS".to_string(),
                value: address.clone(),
            })?;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(info) = lookup("EXPOSE_INFO") {
            config.exposure.info = parse_flag("EXPOSE_INFO", &info)?;
        }
        if let Some(debug) = lookup("EXPOSE_DEBUG") {
            config.exposure.debug = parse_flag("EXPOSE_DEBUG", &debug)?;
        }
        if let Some(groups) = lookup("EXPOSE_GROUPS") {
            config.exposure.groups = Some(split_list(&groups));
        }
        if let Some(groups) = lookup("EXPOSE_ADDITIONAL_GROUPS") {
            config.exposure.additional_groups = split_list(&groups);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any setting is invalid
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::Validation("service_name cannot be empty".to_string()));
        }
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::Validation(format!(
                "invalid log_level: {}. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            )));
        }
        if self.environment.is_production() && self.exposure_groups().contains(group::DEBUG) {
            return Err(ConfigError::Validation(
                "the debug exposure group cannot be enabled in production".to_string(),
            ));
        }
        Ok(())
    }

    /// Exposure groups responses are rendered with
    #[must_use]
    pub fn exposure_groups(&self) -> ExposureGroups {
        self.exposure.groups()
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::for_environment(Environment::Development)
    }
}

fn parse_flag(variable: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Parse {
            variable: variable.to_string(),
            value: value.to_string(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
