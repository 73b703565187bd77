//! Replace command - swap detected logos in a single PDF.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use logoswap_core::{
    parse_detections_with_default_size, Background, FitPolicy, LogoReplacer, LogoswapConfig,
    ReplacementImage, ReplacementReport, ReplacementSet, ReportingSpace,
};

use super::config::load_config;

/// Arguments for the replace command.
#[derive(Args)]
pub struct ReplaceArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Detections JSON file
    #[arg(short, long)]
    detections: PathBuf,

    #[command(flatten)]
    logo: LogoSource,

    /// Output PDF file (default: <input>_replaced.pdf)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write the replacement report as JSON
    #[arg(long)]
    report: Option<PathBuf>,

    #[command(flatten)]
    options: ReplaceOptions,
}

/// Where the replacement logo comes from.
#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct LogoSource {
    /// Replacement logo image (PNG, JPEG, ...)
    #[arg(short, long)]
    logo: Option<PathBuf>,

    /// File containing the logo as base64 or a data URL
    #[arg(long)]
    logo_base64: Option<PathBuf>,
}

/// Settings that override the configuration file.
#[derive(Args)]
pub struct ReplaceOptions {
    /// How the logo is scaled into each region
    #[arg(long, value_enum)]
    fit: Option<FitArg>,

    /// Region background: transparent, white, or #rrggbb
    #[arg(long, value_parser = parse_background)]
    background: Option<Background>,

    /// Detections are pixels of pages rendered at this resolution
    #[arg(long, conflicts_with = "fraction")]
    dpi: Option<f64>,

    /// Detections are fractions of the page size
    #[arg(long)]
    fraction: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FitArg {
    /// Fill the region exactly, ignoring proportions
    Stretch,
    /// Fit inside the region, keeping proportions
    Contain,
    /// Fill the region, keeping proportions and cropping overflow
    Cover,
}

impl From<FitArg> for FitPolicy {
    fn from(arg: FitArg) -> Self {
        match arg {
            FitArg::Stretch => FitPolicy::Stretch,
            FitArg::Contain => FitPolicy::Contain,
            FitArg::Cover => FitPolicy::Cover,
        }
    }
}

impl ReplaceOptions {
    /// Apply command line overrides on top of the loaded configuration.
    pub fn apply(&self, config: &mut LogoswapConfig) {
        if let Some(fit) = self.fit {
            config.replace.fit_policy = fit.into();
        }
        if let Some(background) = self.background {
            config.replace.background = background;
        }
        if let Some(dpi) = self.dpi {
            config.replace.reporting_space = ReportingSpace::Dpi { dpi };
        } else if self.fraction {
            config.replace.reporting_space = ReportingSpace::Fraction;
        }
    }
}

impl LogoSource {
    pub fn load(&self) -> anyhow::Result<ReplacementImage> {
        let image = match (&self.logo, &self.logo_base64) {
            (Some(path), _) => ReplacementImage::decode(&fs::read(path)?)?,
            (None, Some(path)) => ReplacementImage::from_base64(&fs::read_to_string(path)?)?,
            (None, None) => anyhow::bail!("No replacement logo given"),
        };
        debug!(
            "Loaded {}x{} replacement logo (alpha: {})",
            image.width(),
            image.height(),
            image.has_alpha()
        );
        Ok(image)
    }
}

/// Parse `transparent`, `white` or a `#rrggbb` color.
pub fn parse_background(value: &str) -> Result<Background, String> {
    match value.to_lowercase().as_str() {
        "transparent" | "none" => Ok(Background::Transparent),
        "white" => Ok(Background::White),
        hex => {
            let digits = hex.strip_prefix('#').unwrap_or(hex);
            if digits.len() != 6 || !digits.is_ascii() {
                return Err(format!("expected transparent, white or #rrggbb, got {}", value));
            }
            let channel = |i: usize| {
                u8::from_str_radix(&digits[i..i + 2], 16)
                    .map(|c| c as f32 / 255.0)
                    .map_err(|_| format!("invalid color {}", value))
            };
            Ok(Background::Rgb {
                r: channel(0)?,
                g: channel(2)?,
                b: channel(4)?,
            })
        }
    }
}

/// Output path used when none is given.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    input.with_file_name(format!("{}_replaced.pdf", stem))
}

/// Size given to detections that leave out `width` or `height`.
pub(super) fn logo_size(images: &ReplacementSet) -> (f64, f64) {
    let logo = images.default_image();
    (logo.width() as f64, logo.height() as f64)
}

pub async fn run(args: ReplaceArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = load_config(config_path)?;
    args.options.apply(&mut config);

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] {bar:40.cyan/blue} {msg}")?
            .progress_chars("##-"),
    );

    pb.set_message("Loading inputs...");
    pb.set_position(10);

    let pdf = fs::read(&args.input)?;
    let images = ReplacementSet::single(args.logo.load()?);
    let detections = parse_detections_with_default_size(
        &fs::read_to_string(&args.detections)?,
        logo_size(&images),
    )?;
    debug!("Read {} detections", detections.len());

    pb.set_message("Replacing logos...");
    pb.set_position(40);

    let output = LogoReplacer::new(config).replace(&pdf, &detections, &images)?;

    pb.set_message("Writing output...");
    pb.set_position(90);

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&args.input));
    fs::write(&output_path, &output.pdf)?;

    if let Some(report_path) = &args.report {
        fs::write(report_path, serde_json::to_string_pretty(&output.report)?)?;
        debug!("Wrote report to {}", report_path.display());
    }

    pb.finish_and_clear();

    println!(
        "{} Output written to {}",
        style("✓").green(),
        output_path.display()
    );
    print_report(&output.report);

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

/// Print applied, skipped and warning counts with details for problems.
pub fn print_report(report: &ReplacementReport) {
    println!(
        "   {} replaced, {} skipped, {} warnings",
        style(report.applied.len()).green(),
        style(report.skipped.len()).red(),
        style(report.warnings.len()).yellow()
    );

    for skipped in &report.skipped {
        eprintln!(
            "  {} detection {} (page {}): {} [{}]",
            style("skipped").red(),
            skipped.detection_index,
            skipped.page_index,
            skipped.reason,
            skipped.code
        );
    }
    for warning in &report.warnings {
        eprintln!(
            "  {} detection {} (page {}): {} [{}]",
            style("warning").yellow(),
            warning.detection_index,
            warning.page_index,
            warning.message,
            warning.code
        );
    }
}
