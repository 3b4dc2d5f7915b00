mod commands;
mod core;
mod error;
mod types;
mod utils;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(
    name = "arcindex",
    version,
    about = "Catalog directories and ZIP/TAR archives into SQLite file listings"
)]
struct Cli {
    /// Log debug detail
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log errors and hide progress
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Catalog a directory or archive into a timestamped output directory
    Catalog {
        #[arg(short = 'i', long)]
        input: String,

        #[arg(short = 'o', long, default_value = ".")]
        output: String,

        /// Also catalog ZIP/TAR archives found inside a directory input
        #[arg(long)]
        embedded: bool,
    },

    /// Show a summary of a listing database
    Inspect {
        listing: String,

        /// Print every entry as a JSON line on stdout
        #[arg(long)]
        json: bool,

        /// Print a single entry, matched case-insensitively, as JSON
        #[arg(short = 'e', long)]
        entry: Option<String>,
    },
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Catalog {
            input,
            output,
            embedded,
        } => {
            let report = commands::catalog::catalog(
                &types::CatalogOptions {
                    input,
                    output,
                    embedded,
                },
                cli.quiet,
            )?;
            let failed = report.failures();
            if failed > 0 {
                bail!(
                    "{} of {} artifacts failed (manifest: {})",
                    failed,
                    report.artifacts.len(),
                    report.manifest_path.display()
                );
            }
            Ok(())
        }
        Commands::Inspect {
            listing,
            json,
            entry,
        } => commands::inspect::inspect(&listing, json, entry.as_deref()).map(|_| ()),
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
