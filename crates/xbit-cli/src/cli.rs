use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Florian Staub, Jie Ren",
    version,
    about = "xBIT CLI - Parallel parameter scans driving spectrum generators and HEP tools.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scan described by a TOML scan file.
    Run(RunArgs),
    /// List the scan types known to this build.
    ScanTypes,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the scan file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Read the points from a whitespace-separated file instead of sampling them.
    #[arg(long, value_name = "PATH")]
    pub points_file: Option<PathBuf>,

    // --- Setup Overrides ---
    /// Override the scan name; it names the temporary and output directories.
    #[arg(short, long, value_name = "NAME")]
    pub name: Option<String>,

    /// Override the number of points per iteration.
    #[arg(short, long, value_name = "INT")]
    pub points: Option<usize>,

    /// Override the number of parallel workers.
    #[arg(short = 'j', long, value_name = "INT")]
    pub cores: Option<usize>,

    /// Override the number of iterations.
    #[arg(short, long, value_name = "INT")]
    pub iterations: Option<usize>,

    /// Seed for the built-in point sampler.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Record one compact line per valid point instead of the full spectrum.
    #[arg(long)]
    pub short: bool,

    /// Remove this scan's directory under the temporary root before starting.
    #[arg(long)]
    pub clean: bool,

    /// Override the root directory for temporary worker directories.
    #[arg(long, value_name = "PATH")]
    pub temp_dir: Option<PathBuf>,

    /// Override the root directory for results.
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Set a specific configuration value, overriding the scan file.
    /// Can be used multiple times. Example: -S setup.early-stop.threshold=0.01
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
