#![allow(clippy::print_stderr, clippy::print_stdout)]

pub mod args;
pub mod handlers;

use crate::args::{Cli, Commands};
use anyhow::{Context, Result};
use carve::Project;
use carve_logger::{LevelFilter, Logger};
use clap::Parser;

#[carve_runtime::main(parallel_builds)]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log = init_logger(&cli)?;

    let project = Project::load(&cli.config)
        .with_context(|| format!("Cannot load project {}", cli.config.display()))?;

    match cli.command {
        Commands::Build { distributions, out, flags } => {
            handlers::build(&project, &distributions, out, flags).await?;
        }
        Commands::Check { distributions, flags } => handlers::check(&project, &distributions, flags)?,
        Commands::Inspect { distribution, flags } => handlers::inspect(&project, &distribution, flags)?,
        Commands::Catalog { prefix } => handlers::catalog(&project, prefix.as_deref())?,
    }

    Ok(())
}

fn init_logger(cli: &Cli) -> Result<Logger> {
    let level = if cli.verbose { LevelFilter::DEBUG } else { LevelFilter::INFO };
    let builder = Logger::builder().name(env!("CARGO_BIN_NAME")).console(true).level(level);

    let logger = match &cli.log_dir {
        Some(dir) => builder.path(dir).init(),
        None => builder.init(),
    };
    logger.context("Failed to initialize logging")
}
