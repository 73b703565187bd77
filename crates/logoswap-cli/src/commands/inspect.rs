//! Inspect command - show page geometry of a PDF.

use std::fs;
use std::path::PathBuf;

use clap::Args;
use console::style;
use serde::Serialize;

use logoswap_core::pdf::ContentProfile;
use logoswap_core::Document;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

/// Geometry of one page as detectors see it.
#[derive(Debug, Serialize)]
struct PageInfo {
    index: usize,
    width: f64,
    height: f64,
    rotation: u16,
    visible_width: f64,
    visible_height: f64,
    /// Why regions on this page are overlaid instead of clipped.
    #[serde(skip_serializing_if = "Option::is_none")]
    unsupported_content: Option<String>,
}

pub async fn run(args: InspectArgs) -> anyhow::Result<()> {
    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let document = Document::load(&fs::read(&args.input)?)?;
    let pages: Vec<PageInfo> = document
        .pages()
        .iter()
        .map(|page| {
            let (visible_width, visible_height) = page.geometry().visible_size();
            PageInfo {
                index: page.index(),
                width: page.native_width(),
                height: page.native_height(),
                rotation: page.rotation().degrees(),
                visible_width,
                visible_height,
                unsupported_content: match page.content() {
                    ContentProfile::Wrappable { .. } => None,
                    ContentProfile::Unsupported { reason } => Some(reason.clone()),
                },
            }
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&pages)?),
        OutputFormat::Text => print_text(&args.input, &pages),
    }

    Ok(())
}

fn print_text(input: &std::path::Path, pages: &[PageInfo]) {
    println!(
        "{} {} ({} pages)",
        style("ℹ").blue(),
        input.display(),
        pages.len()
    );
    for page in pages {
        print!(
            "  page {:>3}: {:.1} x {:.1} pt, rotate {:>3}",
            page.index, page.width, page.height, page.rotation
        );
        if page.rotation % 180 != 0 {
            print!(" (shown {:.1} x {:.1})", page.visible_width, page.visible_height);
        }
        match &page.unsupported_content {
            Some(reason) => println!(" {}", style(format!("overlay only: {}", reason)).yellow()),
            None => println!(),
        }
    }
}
