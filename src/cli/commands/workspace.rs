//! cli::commands::workspace
//!
//! Shared setup for commands: project directory, configuration, state, and
//! the API client.

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use crate::api::HttpContentApi;
use crate::core::config::schema::validate_api_base;
use crate::core::config::{Config, ProjectConfig};
use crate::core::lock::StateLock;
use crate::core::schema::TypeRegistry;
use crate::core::state::{StateFile, StatePaths};
use crate::core::value::ConfigValue;
use crate::engine::{Context, Planner};

/// Everything a command needs from the project directory.
pub(crate) struct Workspace {
    pub dir: PathBuf,
    pub config: Config,
    pub paths: StatePaths,
    pub planner: Planner,
}

impl Workspace {
    /// Load configuration for the project directory and report warnings.
    pub fn open(ctx: &Context) -> Result<Self> {
        let dir = ctx.project_dir().context("cannot determine project directory")?;
        let loaded = Config::load(Some(&dir)).context("failed to load configuration")?;
        for warning in &loaded.warnings {
            tracing::warn!(path = %warning.path.display(), "{}", warning.message);
        }

        let config = loaded.config;
        let planner = Planner::new(TypeRegistry::default(), config.default_environment())?;
        Ok(Self {
            paths: StatePaths::new(&dir),
            dir,
            config,
            planner,
        })
    }

    pub fn project(&self) -> Result<&ProjectConfig> {
        Ok(self.config.require_project(&self.dir)?)
    }

    /// Declared content types as configuration trees, optionally just one.
    pub fn declared(&self, only: Option<&str>) -> Result<Vec<(String, ConfigValue)>> {
        let project = self.project()?;
        if let Some(address) = only {
            if !project.content_types.contains_key(address) {
                bail!("'{}' is not declared in the project file", address);
            }
        }

        project
            .content_types
            .iter()
            .filter(|(address, _)| only.map_or(true, |a| a == address.as_str()))
            .map(|(address, table)| {
                let tree = ConfigValue::from_toml(toml::Value::Table(table.clone()))
                    .with_context(|| format!("content type '{}'", address))?;
                Ok((address.clone(), tree))
            })
            .collect()
    }

    pub fn load_state(&self) -> Result<StateFile> {
        Ok(StateFile::load(&self.paths)?)
    }

    /// Lock project state for the rest of `command`.
    pub fn lock(&self, command: &str) -> Result<StateLock> {
        StateLock::acquire(&self.paths, command).context("cannot lock project state")
    }

    /// HTTP client from flags, environment, and config, in that order.
    pub fn api(&self, ctx: &Context) -> Result<HttpContentApi> {
        let api_base = ctx
            .api_base
            .as_deref()
            .unwrap_or_else(|| self.config.api_base());
        validate_api_base(api_base)?;

        let token = ctx
            .token
            .clone()
            .or_else(|| self.config.token().map(str::to_string));
        if token.is_none() {
            bail!("{}", crate::api::ApiError::AuthRequired);
        }
        Ok(HttpContentApi::new(api_base, token))
    }
}

/// Runtime for the async engine calls of one command.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Runtime::new().context("failed to start async runtime")
}
