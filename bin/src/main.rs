//! tickwell CLI - resumable Dukascopy tick ingestion.

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tickwell_lib::Verbosity;

mod commands;
mod display;
mod logging;

use commands::download::DownloadArgs;

#[derive(Parser)]
#[command(name = "tickwell")]
#[command(about = "Resumable Dukascopy tick ingestion", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download hourly tick windows and persist ticks or bars
    Download(DownloadArgs),

    /// List known instruments and their price scale
    List {
        /// Filter by category (forex, crypto, index, commodity)
        #[arg(short, long)]
        category: Option<String>,

        /// Search pattern
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Commands::Download(args) => commands::download::download(args, cli.log_json).await,
        Commands::List { category, search } => {
            logging::init(Verbosity::default(), cli.log_json)?;
            commands::list::list_instruments(category.as_deref(), search.as_deref())
        }
    }
}
