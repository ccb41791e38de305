// SPDX-License-Identifier: Apache-2.0

mod controls;
mod devices;
mod error;
mod info;
mod link;
mod topology;
mod utils;

use clap::{Parser, Subcommand};
use error::result_to_exit_code;
use std::process::ExitCode;

/// Media Controller CLI - topology inspection and pipeline configuration
#[derive(Parser)]
#[command(name = "mediactl")]
#[command(version)]
#[command(about = "Media Controller CLI - topology inspection and pipeline configuration")]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging (use RUST_LOG=debug for more)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List media controller devices
    Devices(devices::Args),

    /// Display device information for one media device
    Info(info::Args),

    /// Print the topology graph of a media device
    Topology(topology::Args),

    /// Enable or disable a data link between two pads
    Link(link::Args),

    /// Enumerate V4L2 controls of an entity's device node
    Controls(controls::Args),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Devices(args) => devices::execute(args, cli.json),
        Commands::Info(args) => info::execute(args, cli.json),
        Commands::Topology(args) => topology::execute(args, cli.json),
        Commands::Link(args) => link::execute(args, cli.json),
        Commands::Controls(args) => controls::execute(args, cli.json),
    };

    result_to_exit_code(result)
}

/// Initialize env_logger based on verbosity flags
fn init_logging(verbose: bool, quiet: bool) {
    let env = env_logger::Env::default();

    let env = if quiet {
        env.default_filter_or("error")
    } else if verbose {
        env.default_filter_or("debug")
    } else {
        env.default_filter_or("info")
    };

    env_logger::Builder::from_env(env)
        .format_timestamp(None) // Disable timestamps for cleaner CLI output
        .format_target(false) // Disable target (module path) for cleaner output
        .init();

    log::debug!("Logging initialized");
}
