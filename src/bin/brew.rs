use brew::cli::{self, Cli};
use brew::console::Console;
use brew::{features, logging, shutdown, BrewConfig, Registry, Runner};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Cli::parse();

    let mut config = match BrewConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{} {err}", "Error:".red().bold());
            return ExitCode::from(cli::FAILURE);
        }
    };
    if args.no_color {
        config.color = false;
    }
    colored::control::set_override(config.use_colors());
    logging::init(&config);

    let token = CancellationToken::new();
    shutdown::cancel_on_interrupt(token.clone());

    let registry = Registry::discover(features::catalog());
    tracing::debug!(brews = registry.len(), "registry ready");

    let console = Arc::new(Console::stdio(config.use_colors()));
    let runner = Runner::new(token, console.clone()).with_max_concurrency(config.max_concurrency);

    let code = cli::execute(args.command(), &registry, &runner, &console).await;
    ExitCode::from(code)
}
