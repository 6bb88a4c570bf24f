//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$CTSYNC_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ctsync/config.toml`
//! 3. `~/.ctsync/config.toml` (canonical write location)
//!
//! # Project Config
//!
//! `ctsync.toml` in the project directory, declaring content types by
//! address.
//!
//! # Validation
//!
//! Config values are validated after parsing (API base must be an http(s)
//! URL, environment names must be non-empty, addresses must be plain
//! identifiers).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// api_base = "https://api.contentful.com"
/// token = "CFPAT-..."
/// default_environment = "master"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Base URL of the content management API
    pub api_base: Option<String>,

    /// Personal access token
    pub token: Option<String>,

    /// Environment used when a content type does not name one
    pub default_environment: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.api_base {
            validate_api_base(base)?;
        }

        if let Some(env) = &self.default_environment {
            if env.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_environment cannot be empty".to_string(),
                ));
            }
        }

        if let Some(token) = &self.token {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "token cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Check that an API base is an absolute http(s) URL.
pub fn validate_api_base(base: &str) -> Result<(), ConfigError> {
    let rest = base
        .strip_prefix("https://")
        .or_else(|| base.strip_prefix("http://"));
    match rest {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(ConfigError::InvalidValue(format!(
            "invalid api_base '{}', must start with http:// or https://",
            base
        ))),
    }
}

/// Project configuration.
///
/// # Example
///
/// ```toml
/// default_environment = "staging"
///
/// [content_types.author]
/// space_id = "abc123"
/// name = "Author"
/// display_field = "name"
///
/// [[content_types.author.fields]]
/// id = "name"
/// name = "Name"
/// type = "Symbol"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Overrides the global default environment for this project
    pub default_environment: Option<String>,

    /// Declared content types, keyed by address
    pub content_types: BTreeMap<String, toml::Table>,
}

impl ProjectConfig {
    /// Validate the configuration values.
    ///
    /// Only the envelope is checked here; content type bodies go through the
    /// resource schema.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(env) = &self.default_environment {
            if env.trim().is_empty() {
                return Err(ConfigError::InvalidValue(
                    "default_environment cannot be empty".to_string(),
                ));
            }
        }

        for address in self.content_types.keys() {
            if !is_valid_address(address) {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid content type address '{}', use letters, digits, '_' or '-'",
                    address
                )));
            }
        }

        Ok(())
    }
}

fn is_valid_address(address: &str) -> bool {
    !address.is_empty()
        && address
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
