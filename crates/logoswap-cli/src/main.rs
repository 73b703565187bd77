//! `logoswap` command line tool.
//!
//! Reads a PDF and a detections file (boxes found by an upstream logo
//! detector), clears each box out of the page content and draws a new logo
//! in its place. Diagnostics go to stderr so reports can be piped from stdout.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, inspect, replace};

/// Replace detected logos in PDF documents with a new image.
///
/// Detections are JSON boxes `{page, x, y, width, height}` measured from the
/// top-left of the page as displayed. Boxes without a size take the size of
/// the replacement logo.
#[derive(Parser)]
#[command(name = "logoswap")]
#[command(author, version, about, long_about)]
struct Cli {
    /// Log more detail to stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of the user config
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace detected logos in a single PDF
    Replace(replace::ReplaceArgs),

    /// Replace logos in every PDF matching a glob, using sibling detection files
    Batch(batch::BatchArgs),

    /// Show page sizes, rotations and which pages can only be overlaid
    Inspect(inspect::InspectArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn init_logging(verbose: u8) -> anyhow::Result<()> {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // stdout carries output paths and reports
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Replace(args) => replace::run(args, config_path).await,
        Commands::Batch(args) => batch::run(args, config_path).await,
        Commands::Inspect(args) => inspect::run(args).await,
        Commands::Config(args) => config::run(args).await,
    }
}
