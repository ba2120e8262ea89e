//! Host configuration.
//!
//! Looked up in this order: an explicit `--config <path>`, the `BREW_CONFIG`
//! environment variable, `./brew.toml`, then built-in defaults.
//!
//! ```toml
//! log_filter = "info,brew::runner=debug"
//! color = true
//! max_concurrency = 4
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BrewConfig {
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    pub color: bool,
    /// Upper bound on brews executing at once in run-all. `None` starts every
    /// brew immediately.
    pub max_concurrency: Option<usize>,
}

impl Default for BrewConfig {
    fn default() -> Self {
        Self {
            log_filter: "info".to_string(),
            color: true,
            max_concurrency: None,
        }
    }
}

impl BrewConfig {
    pub const FILE_NAME: &'static str = "brew.toml";
    pub const ENV_VAR: &'static str = "BREW_CONFIG";

    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let from_env = std::env::var_os(Self::ENV_VAR).map(PathBuf::from);
        Self::resolve(explicit, from_env.as_deref(), Path::new(Self::FILE_NAME))
    }

    /// A named file (flag or env var) must exist; the default file is optional.
    fn resolve(
        explicit: Option<&Path>,
        from_env: Option<&Path>,
        default_path: &Path,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = explicit.or(from_env) {
            return Self::from_file(path);
        }

        if default_path.is_file() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: BrewConfig = toml::from_str(content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::invalid_value(
                "max_concurrency",
                "must be at least 1 (omit it to start every brew at once)",
            ));
        }
        if self.log_filter.trim().is_empty() {
            return Err(ConfigError::invalid_value("log_filter", "must not be empty"));
        }
        Ok(())
    }

    pub fn use_colors(&self) -> bool {
        self.color && std::env::var_os("NO_COLOR").is_none()
    }
}
