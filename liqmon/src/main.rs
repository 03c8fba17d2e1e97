//! Liquidity data-quality monitor.
//!
//! This binary reads a sources document (one array of JSON rows per data
//! source), scores each source's quality, scans it for anomalies, and writes
//! the reports as JSON.

mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use liqmon_core::logging::init_logging;

#[derive(Parser)]
#[command(name = "liqmon")]
#[command(about = "Data-quality and anomaly reports for liquidity time series")]
#[command(version)]
#[command(long_about = "
Liqmon - data-quality scoring and anomaly detection

Reads a JSON document mapping source names to arrays of rows:
  {\"ecb_data\": [{\"date\": \"2024-06-10\", \"rate_type\": \"MRO\", \"value\": 4.25}]}

and produces:
- a quality report: completeness, freshness and duplicate scores per source
- an anomaly report: Z-score outliers, temporal gaps, sudden changes and
  business rule violations per source

EXAMPLES:
  liqmon quality --input sources.json
  liqmon -v anomalies --input sources.json --output anomalies.json
  liqmon --config monitor.json report --input sources.json
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Score data quality per source
    Quality(RunArgs),
    /// Detect anomalies per source
    Anomalies(RunArgs),
    /// Produce both reports in one document
    Report(RunArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Sources document path
    #[arg(short, long, help = "JSON document of sources to analyze")]
    pub input: PathBuf,

    /// Output file path
    #[arg(short, long, help = "Write the report here instead of stdout")]
    pub output: Option<PathBuf>,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        global = true,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true, help = "Suppress all output except errors")]
    pub quiet: bool,

    /// Monitor configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "LIQMON_CONFIG",
        help = "JSON monitor configuration (defaults apply when omitted)"
    )]
    pub config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    let config = run::load_config(cli.global.config.as_deref())?;

    match &cli.command {
        Command::Quality(args) => run::quality(&config, &args.input, args.output.as_deref()),
        Command::Anomalies(args) => run::anomalies(&config, &args.input, args.output.as_deref()),
        Command::Report(args) => run::report(&config, &args.input, args.output.as_deref()),
    }
}
