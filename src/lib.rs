//! # brew
//!
//! A catalog of small, isolated demonstrations ("brews") of language features
//! and design patterns, plus the runtime that discovers and runs them.
//!
//! ## Pieces
//!
//! 1. **Brew contract** - [`Brew`] with `before` / `execute` / `after` phases
//! 2. **Registry** - explicit registration table, deduplicated and ordered
//! 3. **Selector** - name fragment to exactly one brew
//! 4. **Runner** - one, named or all brews with failure isolation
//! 5. **Services** - per-run dependency injection scope
//! 6. **Host** - CLI, console progress, configuration and Ctrl-C handling
//!
//! ## Running
//!
//! ```bash
//! brew list                 # every brew with its description
//! brew run factory          # one brew by short name or fragment
//! brew                      # every brew in parallel
//! ```

pub mod cli;
pub mod config;
pub mod console;
pub mod error;
pub mod features;
pub mod logging;
pub mod module;
pub mod registry;
pub mod runner;
pub mod selector;
pub mod services;
pub mod shutdown;

#[cfg(test)]
mod testing;

pub use config::BrewConfig;
pub use error::{BrewError, BrewResult, ConfigError};
pub use logging::Logger;
pub use module::{Brew, BrewContext, Descriptor};
pub use registry::{BrewEntry, Registration, Registry};
pub use runner::{Progress, RunOutcome, RunReport, RunStatus, Runner};
pub use services::{ServiceCollection, ServiceProvider};
