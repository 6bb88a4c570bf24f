//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! ctsync has two configuration scopes:
//! - **Global**: User-level settings (API base, token, default environment)
//! - **Project**: `ctsync.toml`, declaring the content types to reconcile
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Project config file (default environment only)
//! 4. `CONTENTFUL_MANAGEMENT_TOKEN` (token only)
//! 5. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$CTSYNC_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/ctsync/config.toml`
//! 3. `~/.ctsync/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use ctsync::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/project"))).unwrap();
//! let config = result.config;
//!
//! println!("API: {}", config.api_base());
//! println!("Environment: {}", config.default_environment());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, ProjectConfig};

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::schema::DEFAULT_ENVIRONMENT;

/// Default content management API base.
pub const DEFAULT_API_BASE: &str = "https://api.contentful.com";

/// Name of the project file.
pub const PROJECT_FILE: &str = "ctsync.toml";

/// Environment variable that overrides the configured token.
pub const TOKEN_ENV: &str = "CONTENTFUL_MANAGEMENT_TOKEN";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("project file not found: {0}")]
    NoProject(PathBuf),
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Project configuration (if a project file was found)
    pub project: Option<ProjectConfig>,
    /// Token taken from the environment, if set
    env_token: Option<String>,
    global_path: Option<PathBuf>,
    project_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `project_dir` is provided, also loads `ctsync.toml` from it.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(project_dir: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let env_token = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
        Self::load_from(Self::locate_global(), project_dir, env_token)
    }

    /// Load from an explicit global config path.
    pub fn load_from(
        global_path: Option<PathBuf>,
        project_dir: Option<&Path>,
        env_token: Option<String>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global = match &global_path {
            Some(path) => read_toml::<GlobalConfig>(path)?,
            None => GlobalConfig::default(),
        };

        let (project, project_path) = match project_dir {
            Some(dir) => {
                let path = dir.join(PROJECT_FILE);
                if path.exists() {
                    (Some(read_toml::<ProjectConfig>(&path)?), Some(path))
                } else {
                    (None, None)
                }
            }
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref p) = project {
            p.validate()?;
            if p.content_types.is_empty() {
                if let Some(path) = &project_path {
                    warnings.push(ConfigWarning {
                        message: "project file declares no content types".to_string(),
                        path: path.clone(),
                    });
                }
            }
        }

        if env_token.is_some() && global.token.is_some() {
            if let Some(path) = &global_path {
                warnings.push(ConfigWarning {
                    message: format!("{} overrides the token in the config file", TOKEN_ENV),
                    path: path.clone(),
                });
            }
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                project,
                env_token,
                global_path,
                project_path,
            },
            warnings,
        })
    }

    /// Find the global config file, if any.
    fn locate_global() -> Option<PathBuf> {
        // 1. Check $CTSYNC_CONFIG
        if let Ok(path) = std::env::var("CTSYNC_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/ctsync/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("ctsync/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.ctsync/config.toml
        if let Some(home) = dirs::home_dir() {
            let path = home.join(".ctsync/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        None
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Base URL of the API.
    ///
    /// Defaults to `https://api.contentful.com`.
    pub fn api_base(&self) -> &str {
        self.global
            .api_base
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    /// Access token: environment first, then the global file.
    pub fn token(&self) -> Option<&str> {
        self.env_token
            .as_deref()
            .or(self.global.token.as_deref())
    }

    /// Environment used when a content type does not name one.
    ///
    /// Project overrides global; defaults to `master`.
    pub fn default_environment(&self) -> &str {
        self.project
            .as_ref()
            .and_then(|p| p.default_environment.as_deref())
            .or(self.global.default_environment.as_deref())
            .unwrap_or(DEFAULT_ENVIRONMENT)
    }

    /// The project, or an error naming where it was expected.
    pub fn require_project(&self, project_dir: &Path) -> Result<&ProjectConfig, ConfigError> {
        self.project
            .as_ref()
            .ok_or_else(|| ConfigError::NoProject(project_dir.join(PROJECT_FILE)))
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded project file.
    pub fn project_loaded_from(&self) -> Option<&Path> {
        self.project_path.as_deref()
    }
}

/// Read and parse a TOML config file.
fn read_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
