mod commands;
mod output;

use clap::{Parser, Subcommand};
use slipmatch_core::config::{load_config, Config};
use slipmatch_core::error::SlipmatchError;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "slipmatch",
    version,
    about = "Pair packing slips with shipping labels printed to a watched folder"
)]
struct Cli {
    /// TOML config file (defaults are used when omitted)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Append logs to this file instead of stderr
    #[arg(long, global = true, value_name = "FILE")]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the printer folder and pair every two PDFs that arrive
    Watch {
        /// Output format: table (default) or json (one record per line)
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Pair two PDFs directly, in either order
    Match {
        first: PathBuf,
        second: PathBuf,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,

        /// Write the records to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Tell whether a PDF is a packing slip or a shipping label
    Classify { pdf: PathBuf },
    /// Print the effective configuration as TOML
    Config,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), SlipmatchError> {
    init_tracing(cli.log_file.as_deref())?;

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };

    match cli.command {
        Commands::Watch { output } => commands::watch::run(&config, &output),
        Commands::Match {
            first,
            second,
            output,
            out,
        } => commands::pair::run(&config, &first, &second, &output, out),
        Commands::Classify { pdf } => commands::classify::run(&config, &pdf),
        Commands::Config => commands::config::run(&config),
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<(), SlipmatchError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact();

    match log_file {
        Some(path) => {
            let file = File::options().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => builder.with_writer(std::io::stderr).init(),
    }
    Ok(())
}
