//! Command line diagnostics for glaze materials.

use base::cli;
use std::path::PathBuf;

mod cmd;

/// Arguments for the `glaze-check` command.
#[derive(clap::Parser, Debug)]
#[clap(
    author,
    version,
    about = "Checks the energy balance and the lobes of glaze materials."
)]
pub struct CheckArgs {
    /// Whether to show the timestamp in the log.
    #[clap(
        long,
        help = "Show timestamp for each log message in seconds since\nprogram starts"
    )]
    pub log_timestamp: bool,

    /// Verbosity level for the log.
    #[clap(
        long,
        help = "Setting logging verbosity level (higher for more\ndetails)\n  0 - error\n  1 - \
                warn + error\n  2 - info + warn + error\n  3 - debug + info + warn + error\n  4 - \
                trace + debug + info + warn + error\n\x08",
        default_value_t = 1
    )]
    pub log_level: u8,

    /// Command to execute.
    #[clap(subcommand)]
    pub command: SubCommand,
}

/// `glaze-check` command.
#[derive(clap::Subcommand, Debug)]
pub enum SubCommand {
    /// Compares the sampled directional albedo against its quadrature.
    Albedo(cmd::albedo::AlbedoOptions),
    /// Writes an in-plane slice of the lobe.
    Slice(cmd::slice::SliceOptions),
}

/// Options shared by every command.
#[derive(clap::Args, Debug)]
pub struct MaterialOptions {
    #[clap(short, long, help = "Path to the material file (.toml)")]
    pub config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, launch_time) = cli::parse_args::<CheckArgs>("glaze-check");

    cli::setup_logging(
        args.log_timestamp.then_some(launch_time),
        args.log_level,
        &[],
    );

    match args.command {
        SubCommand::Albedo(opts) => cmd::albedo::run(opts)?,
        SubCommand::Slice(opts) => cmd::slice::run(opts)?,
    }

    Ok(())
}
