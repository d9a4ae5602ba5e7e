mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::convert::ConvertArgs;

#[derive(Parser)]
#[command(name = "plan2ical")]
#[command(about = "Convert an event plan (CSV, ODS, XLSX) into an iCalendar file")]
struct Cli {
    /// Show skipped rows and other debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a plan into <input>.ics
    Convert {
        /// Plan file (.csv, .tsv, .txt, .ods, .xlsx, .xls)
        input: PathBuf,

        /// Field delimiter for delimited text (e.g. ";" or "tab")
        delimiter: Option<String>,

        /// Maximum number of events to read
        #[arg(long)]
        max: Option<usize>,

        /// Config file (default: ~/.config/plan2ical/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Where derived labels go
        #[arg(long, value_parser = ["description", "categories"])]
        categories: Option<String>,

        /// Zone for events with a time of day (e.g. "Europe/Berlin")
        #[arg(long)]
        timezone: Option<String>,

        /// Fixed location for every event
        #[arg(long)]
        venue: Option<String>,

        /// Output file (default: <input>.ics)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show the config file location and the effective configuration
    Config {
        /// Config file (default: ~/.config/plan2ical/config.toml)
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    match cli.command {
        Commands::Convert {
            input,
            delimiter,
            max,
            config,
            categories,
            timezone,
            venue,
            output,
        } => commands::convert::run(ConvertArgs {
            input,
            delimiter,
            max,
            config,
            categories,
            timezone,
            venue,
            output,
        }),
        Commands::Config { config } => commands::config::run(config.as_deref()),
    }
}

fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .format_target(false)
        .init();
}
