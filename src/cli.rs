//! Command-line surface of the `brew` host.
//!
//! Parsing is done by clap; [`execute`] dispatches an already-parsed command
//! against a registry and returns the process exit code, so the whole host
//! can be driven in-process from tests.

use crate::console::Console;
use crate::error::BrewError;
use crate::registry::{BrewEntry, Registry};
use crate::runner::{RunStatus, Runner};
use crate::selector;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

pub const SUCCESS: u8 = 0;
pub const FAILURE: u8 = 1;

#[derive(Parser, Debug)]
#[command(name = "brew", version, about = "Discover and run self-contained demos")]
pub struct Cli {
    /// Configuration file (defaults to $BREW_CONFIG, then ./brew.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List every discovered brew with its description
    List,
    /// Run the brew matching PATTERN, or every brew when no pattern is given
    Run {
        /// Short name or fragment of a brew identity (case-insensitive)
        pattern: Option<String>,
    },
    /// Run every brew in parallel
    All,
}

impl Cli {
    /// No subcommand means "run everything".
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::All)
    }
}

pub async fn execute(command: Command, registry: &Registry, runner: &Runner, console: &Console) -> u8 {
    match command {
        Command::List => list(registry, console),
        Command::Run { pattern: Some(pattern) } => run_named(registry, runner, console, &pattern).await,
        Command::Run { pattern: None } | Command::All => run_all(registry, runner, console).await,
    }
}

// ===== list =====

fn list(registry: &Registry, console: &Console) -> u8 {
    console.println(console.paint("Available Brews:", |s| s.bold()));
    console.println("================");
    console.println("");

    for entry in registry {
        let descriptor = entry.descriptor();
        console.println(format!("  {}", descriptor.identity()));
        console.println(format!(
            "    {}",
            descriptor.description().unwrap_or("No description available")
        ));
        console.println("");
    }

    SUCCESS
}

// ===== run <pattern> =====

async fn run_named(registry: &Registry, runner: &Runner, console: &Console, pattern: &str) -> u8 {
    let entry = match selector::select(registry, pattern) {
        Ok(entry) => entry,
        Err(err) => {
            report_selection_error(console, &err);
            return FAILURE;
        }
    };

    announce(console, entry);
    let outcome = runner.quiet().run_one(entry).await;

    match outcome.status() {
        RunStatus::Completed => SUCCESS,
        RunStatus::Failed(message) => {
            let line = format!("Error running {}: {}", entry.descriptor().short_name(), message);
            console.eprintln(console.paint(line, |s| s.red()));
            FAILURE
        }
        RunStatus::Cancelled => {
            console.eprintln(console.paint(format!("Cancelled: {}", entry.identity()), |s| s.yellow()));
            FAILURE
        }
    }
}

fn announce(console: &Console, entry: &BrewEntry) {
    let descriptor = entry.descriptor();
    console.println(console.paint(format!("Running: {}", descriptor.identity()), |s| s.bold()));
    console.println(format!("Description: {}", descriptor.description().unwrap_or("N/A")));
    console.println("");
}

fn report_selection_error(console: &Console, err: &BrewError) {
    match err {
        BrewError::NotFound { pattern } => {
            console.eprintln(console.paint(format!("Error: No brews found matching '{pattern}'"), |s| s.red()));
            console.eprintln("Use 'list' command to see available brews");
        }
        BrewError::Ambiguous { pattern, candidates } => {
            console.eprintln(console.paint(format!("Error: Multiple brews match '{pattern}':"), |s| s.red()));
            for candidate in candidates {
                console.eprintln(format!("  - {candidate}"));
            }
            console.eprintln("");
            console.eprintln("Please provide a more specific pattern.");
        }
        other => console.eprintln(console.paint(format!("Error: {other}"), |s| s.red())),
    }
}

// ===== run (all) =====

async fn run_all(registry: &Registry, runner: &Runner, console: &Console) -> u8 {
    if registry.is_empty() {
        console.println("No brews registered.");
        return SUCCESS;
    }

    let banner = format!("Running all {} brews in parallel...", registry.len());
    console.println(console.paint(banner, |s| s.bold()));
    console.println("");

    let report = runner.run_all(registry.entries()).await;

    console.println("");
    console.summary(&report);

    // Individual failures were already reported; a batch run itself succeeds.
    SUCCESS
}
