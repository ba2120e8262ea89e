use itertools::Itertools;
use std::path::PathBuf;
use thiserror::Error;

pub type BrewResult<T> = Result<T, BrewError>;

// =============================================================================
// Host errors
// =============================================================================

#[derive(Error, Debug)]
pub enum BrewError {
    #[error("No brews found matching '{pattern}'")]
    NotFound { pattern: String },

    #[error("Multiple brews match '{pattern}': {}", candidates.iter().join(", "))]
    Ambiguous {
        pattern: String,
        candidates: Vec<String>,
    },

    #[error("Brew '{identity}' failed: {message}")]
    ModuleFailure { identity: String, message: String },

    #[error("Brew '{identity}' could not be loaded: {message}")]
    DiscoveryFailure { identity: String, message: String },

    #[error("Operation was cancelled")]
    Cancelled,

    #[error("No service registered for type {type_name}")]
    ServiceNotRegistered { type_name: &'static str },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl BrewError {
    pub fn not_found(pattern: impl Into<String>) -> Self {
        Self::NotFound {
            pattern: pattern.into(),
        }
    }

    pub fn ambiguous(pattern: impl Into<String>, candidates: Vec<String>) -> Self {
        Self::Ambiguous {
            pattern: pattern.into(),
            candidates,
        }
    }

    pub fn module_failure(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ModuleFailure {
            identity: identity.into(),
            message: message.into(),
        }
    }

    pub fn discovery_failure(identity: impl Into<String>, message: impl Into<String>) -> Self {
        Self::DiscoveryFailure {
            identity: identity.into(),
            message: message.into(),
        }
    }

    /// True when the error was caused by the shared cancellation signal,
    /// including when it was wrapped in an `anyhow::Error` by a brew.
    pub fn is_cancellation(err: &anyhow::Error) -> bool {
        matches!(err.downcast_ref::<BrewError>(), Some(BrewError::Cancelled))
    }

    /// Selector errors are fixed by the user; everything else is not.
    pub fn is_user_correctable(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Ambiguous { .. })
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panicked with a non-string payload".to_string()
    }
}

// =============================================================================
// Configuration errors
// =============================================================================

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
