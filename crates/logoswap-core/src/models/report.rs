//! Per-call report of what happened to each detection.

use serde::{Deserialize, Serialize};

use crate::geometry::{NativeRegion, Rect};

/// Outcome of one replacement call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplacementReport {
    /// Number of pages in the document.
    pub page_count: usize,

    /// Detections whose region was replaced.
    pub applied: Vec<AppliedRegion>,

    /// Detections that were skipped.
    pub skipped: Vec<SkippedDetection>,

    /// Recovered problems (content fallbacks).
    pub warnings: Vec<ReportWarning>,
}

/// A detection whose region was erased and filled with the replacement image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedRegion {
    pub detection_index: usize,
    pub page_index: usize,
    /// Cleared region in the native frame.
    pub region: NativeRegion,
    /// Where the image was drawn, in the visible frame.
    pub placed: Rect,
}

/// A detection that could not be processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedDetection {
    pub detection_index: usize,
    pub page_index: usize,
    /// Stable error code.
    pub code: String,
    pub reason: String,
}

/// A recovered problem that still produced output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportWarning {
    pub detection_index: usize,
    pub page_index: usize,
    pub code: String,
    pub message: String,
}

impl ReplacementReport {
    /// Report for a document with no work done yet.
    pub fn new(page_count: usize) -> Self {
        Self {
            page_count,
            ..Self::default()
        }
    }

    /// Fold another partial report in, keeping entries ordered by detection.
    pub fn merge(&mut self, other: ReplacementReport) {
        self.applied.extend(other.applied);
        self.skipped.extend(other.skipped);
        self.warnings.extend(other.warnings);
        self.applied.sort_by_key(|a| a.detection_index);
        self.skipped.sort_by_key(|s| s.detection_index);
        self.warnings.sort_by_key(|w| w.detection_index);
    }

    /// True when every detection was applied without warnings.
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty() && self.warnings.is_empty()
    }
}
