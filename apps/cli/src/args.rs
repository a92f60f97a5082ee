//! # CLI Argument Definitions

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "carve")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Composes reduced-footprint framework distributions from a component catalog")]
pub struct Cli {
    /// Project configuration file
    #[arg(short, long, global = true, default_value = "carve.toml")]
    pub config: PathBuf,

    /// Log at DEBUG level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write rolling log files into this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compose, package and write distributions (all configured ones by default)
    Build {
        /// Distribution to build; repeatable
        #[arg(short, long = "distribution", value_name = "NAME")]
        distributions: Vec<String>,

        /// Output directory, replacing `output.dir`
        #[arg(long, value_name = "DIR")]
        out: Option<PathBuf>,

        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Compose distributions without writing anything
    Check {
        /// Distribution to check; repeatable
        #[arg(short, long = "distribution", value_name = "NAME")]
        distributions: Vec<String>,

        #[command(flatten)]
        flags: FlagArgs,
    },
    /// Print one composed namespace as JSON
    Inspect {
        #[arg(short, long, value_name = "NAME")]
        distribution: String,

        #[command(flatten)]
        flags: FlagArgs,
    },
    /// List catalog leaves with their module specifiers
    Catalog {
        /// Only leaves under this dotted path (e.g. `GameObjects`)
        prefix: Option<String>,
    },
}

/// Flag overrides applied on top of the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct FlagArgs {
    /// Force a feature flag on; repeatable
    #[arg(long, value_name = "FLAG")]
    pub enable: Vec<String>,

    /// Force a feature flag off; repeatable, wins over --enable
    #[arg(long, value_name = "FLAG")]
    pub disable: Vec<String>,
}
