//! Configuration structures for the replacement pipeline.

use serde::{Deserialize, Serialize};

use crate::geometry::ReportingSpace;

/// Main configuration for the logoswap pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LogoswapConfig {
    /// Region replacement configuration.
    pub replace: ReplaceConfig,

    /// Output document configuration.
    pub output: OutputConfig,
}

/// How a replacement image is scaled into its region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitPolicy {
    /// Scale each axis independently to fill the region exactly.
    #[default]
    Stretch,
    /// Scale uniformly to fit inside the region, centered.
    Contain,
    /// Scale uniformly to fill the region, cropping overflow.
    Cover,
}

/// What is left behind in an erased region.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Background {
    /// Nothing is painted; the region shows the page background.
    Transparent,
    /// Opaque white fill.
    #[default]
    White,
    /// Opaque fill with an RGB color, components in 0.0 - 1.0.
    Rgb { r: f32, g: f32, b: f32 },
}

impl Background {
    /// Fill color, if the background is opaque.
    pub fn fill_color(&self) -> Option<[f32; 3]> {
        match *self {
            Self::Transparent => None,
            Self::White => Some([1.0, 1.0, 1.0]),
            Self::Rgb { r, g, b } => Some([r, g, b]),
        }
    }

    /// Color used by the overlay fallback, which must always be opaque.
    pub fn overlay_color(&self) -> [f32; 3] {
        self.fill_color().unwrap_or([1.0, 1.0, 1.0])
    }
}

/// Handling of detections that overlap one already replaced on the same page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlapPolicy {
    /// Later detections are drawn over earlier ones.
    #[default]
    LastWriteWins,
    /// Later overlapping detections are skipped and reported.
    KeepFirst,
}

/// Region replacement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplaceConfig {
    /// Scaling rule for replacement images.
    pub fit_policy: FitPolicy,

    /// Fill left in erased regions.
    pub background: Background,

    /// Overlapping detection handling.
    pub overlap: OverlapPolicy,

    /// Reporting space for detections without their own.
    pub reporting_space: ReportingSpace,

    /// Aspect ratio difference under which contain/cover behave like stretch (0 = never).
    pub aspect_tolerance: f64,
}

impl Default for ReplaceConfig {
    fn default() -> Self {
        Self {
            fit_policy: FitPolicy::Stretch,
            background: Background::White,
            overlap: OverlapPolicy::LastWriteWins,
            reporting_space: ReportingSpace::Points,
            aspect_tolerance: 0.0,
        }
    }
}

/// Output document configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Flate-compress streams that are stored uncompressed.
    pub compress: bool,

    /// Drop objects no longer reachable from the trailer.
    pub prune_unused: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            compress: true,
            prune_unused: true,
        }
    }
}

impl LogoswapConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }
}
