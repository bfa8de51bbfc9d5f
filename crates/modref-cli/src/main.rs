#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::needless_pass_by_value)]

mod commands;
mod logging;

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use modref_core::Config;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "modref")]
#[command(author, version, about = "Inspect server-side reference stubs and import boundaries", long_about = None)]
struct Cli {
    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Emit JSON formatted output (stable, machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Override the working directory
    #[arg(long, global = true, value_name = "PATH")]
    cwd: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Print version information
    Version,

    /// List the export names discovered for a module
    Exports {
        /// Module specifier, resolved from the working directory
        file: String,

        /// Extra export conditions the host resolves with
        #[arg(short = 'C', long = "conditions", value_name = "NAME")]
        conditions: Vec<String>,
    },

    /// Print a module as the server loader emits it
    Stub {
        /// Module specifier, resolved from the working directory
        file: String,

        /// Extra export conditions the host resolves with
        #[arg(short = 'C', long = "conditions", value_name = "NAME")]
        conditions: Vec<String>,
    },

    /// Check whether an import crosses the server-only boundary
    Check {
        /// Import specifier to resolve
        target: String,

        /// Importing file (omit for an entry point)
        #[arg(long, value_name = "FILE")]
        from: Option<String>,
    },

    /// Load a module through the stubbing registry
    Require {
        /// Module specifier, resolved from the working directory
        file: String,

        /// Property to read off the stub (repeatable)
        #[arg(long = "prop", value_name = "NAME")]
        props: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cwd = cli
        .cwd
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));

    let config = Config::load(cwd.clone())
        .into_diagnostic()?
        .with_verbosity(cli.verbose)
        .with_json_logs(cli.json);

    logging::init(config.verbosity, config.json_logs);

    let span = tracing::info_span!("modref", cwd = %cwd.display());
    let _guard = span.enter();

    match cli.command {
        Some(Commands::Version) | None => commands::version::run(),
        Some(Commands::Exports { file, conditions }) => {
            commands::exports::run(&config, &file, &conditions, cli.json)
        }
        Some(Commands::Stub { file, conditions }) => {
            commands::stub::run(&config, &file, &conditions, cli.json)
        }
        Some(Commands::Check { target, from }) => {
            commands::check::run(&config, &target, from.as_deref(), cli.json)
        }
        Some(Commands::Require { file, props }) => {
            commands::require::run(&config, &file, &props, cli.json)
        }
    }
}
