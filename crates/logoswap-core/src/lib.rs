//! Core library for replacing detected logos in PDF documents.
//!
//! This crate provides:
//! - PDF loading with inherited page boxes and rotation
//! - Mapping of detection boxes from pixel, fraction or point space onto pages
//! - Region erasure by clipping the original page content
//! - Replacement image placement with stretch, contain and cover fitting
//! - Serialization back to standard PDF bytes with a per-call report

pub mod edit;
pub mod error;
pub mod geometry;
pub mod models;
pub mod pdf;
pub mod pipeline;
pub mod replacement;

pub use error::{LogoswapError, Result};
pub use geometry::{map_detection, NativeRegion, PageGeometry, ReportingSpace, Rotation};
pub use models::config::{Background, FitPolicy, LogoswapConfig, OverlapPolicy};
pub use models::detection::{parse_detections, parse_detections_with_default_size, Detection};
pub use models::report::ReplacementReport;
pub use pdf::{Document, Page};
pub use pipeline::{LogoReplacer, ReplaceOutput};
pub use replacement::{ReplacementImage, ReplacementSet};
