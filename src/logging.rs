//! Structured logging for the host and the brews.
//!
//! The subscriber writes to stderr so stdout stays reserved for listings and
//! progress markers. Brews never touch a global logger; they receive a
//! [`Logger`] bound to their identity through the run context.

use crate::config::BrewConfig;
use std::fmt::Display;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over the configured
/// filter. Calling this twice is harmless.
pub fn init(config: &BrewConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(config.use_colors())
        .with_target(false);

    let _ = tracing_subscriber::registry().with(filter).with(layer).try_init();
}

/// Leveled logger handed to a brew. Every event carries a `brew` field with
/// the owning identity.
#[derive(Debug, Clone)]
pub struct Logger {
    brew: Arc<str>,
}

impl Logger {
    pub fn new(brew: impl Into<Arc<str>>) -> Self {
        Self { brew: brew.into() }
    }

    pub fn brew(&self) -> &str {
        &self.brew
    }

    pub fn debug(&self, message: impl Display) {
        tracing::debug!(brew = %self.brew, "{message}");
    }

    pub fn info(&self, message: impl Display) {
        tracing::info!(brew = %self.brew, "{message}");
    }

    pub fn warn(&self, message: impl Display) {
        tracing::warn!(brew = %self.brew, "{message}");
    }

    pub fn error(&self, message: impl Display) {
        tracing::error!(brew = %self.brew, "{message}");
    }

    /// Derived logger for a collaborator inside a brew, e.g. `factory/sms`.
    pub fn scoped(&self, component: &str) -> Logger {
        Logger::new(format!("{}/{}", self.brew, component))
    }
}
