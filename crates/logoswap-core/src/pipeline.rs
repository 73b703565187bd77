//! End-to-end replacement: load, map, erase, composite, serialize.

use std::collections::BTreeMap;
use std::time::Instant;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::edit::{composite, erase_region};
use crate::error::{RegionError, Result};
use crate::geometry::{map_detection, NativeRegion};
use crate::models::config::{LogoswapConfig, OverlapPolicy};
use crate::models::detection::Detection;
use crate::models::report::{AppliedRegion, ReplacementReport, ReportWarning, SkippedDetection};
use crate::pdf::{serialize, Document, Page};
use crate::replacement::{ReplacementImage, ReplacementSet};

/// Output of a replacement call.
#[derive(Debug, Clone)]
pub struct ReplaceOutput {
    /// The modified document.
    pub pdf: Vec<u8>,
    /// What happened to each detection.
    pub report: ReplacementReport,
    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

/// Replaces detected logo regions in PDF documents.
#[derive(Debug, Clone, Default)]
pub struct LogoReplacer {
    config: LogoswapConfig,
}

impl LogoReplacer {
    pub fn new(config: LogoswapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LogoswapConfig {
        &self.config
    }

    /// Replace every detected region with a single encoded logo.
    pub fn replace_encoded(
        &self,
        pdf: &[u8],
        detections: &[Detection],
        logo: &[u8],
    ) -> Result<ReplaceOutput> {
        let image = ReplacementImage::decode(logo)?;
        self.replace(pdf, detections, &ReplacementSet::single(image))
    }

    /// Replace every detected region with its image from `images`.
    ///
    /// Detections that cannot be placed are skipped and reported; the
    /// document is still produced. Malformed input, undecodable images and
    /// serialization failures abort the call.
    pub fn replace(
        &self,
        pdf: &[u8],
        detections: &[Detection],
        images: &ReplacementSet,
    ) -> Result<ReplaceOutput> {
        let start = Instant::now();
        let mut document = Document::load(pdf)?;
        let page_count = document.page_count();
        let mut report = ReplacementReport::new(page_count);

        let mut groups: BTreeMap<usize, Vec<(usize, &Detection)>> = BTreeMap::new();
        for (detection_index, detection) in detections.iter().enumerate() {
            if detection.page_index >= page_count {
                let err = RegionError::PageOutOfRange {
                    page_index: detection.page_index,
                    page_count,
                };
                warn!("Skipping detection {}: {}", detection_index, err);
                report.skipped.push(skipped(detection_index, detection.page_index, &err));
                continue;
            }
            groups
                .entry(detection.page_index)
                .or_default()
                .push((detection_index, detection));
        }

        let jobs: Vec<(&mut Page, Vec<(usize, &Detection)>)> = document
            .pages_mut()
            .iter_mut()
            .filter_map(|page| groups.remove(&page.index()).map(|group| (page, group)))
            .collect();
        debug!(
            "Processing {} detections on {} pages",
            detections.len(),
            jobs.len()
        );

        #[cfg(feature = "parallel")]
        let partials: Vec<ReplacementReport> = jobs
            .into_par_iter()
            .map(|(page, group)| self.process_page(page, &group, images))
            .collect();
        #[cfg(not(feature = "parallel"))]
        let partials: Vec<ReplacementReport> = jobs
            .into_iter()
            .map(|(page, group)| self.process_page(page, &group, images))
            .collect();

        for partial in partials {
            report.merge(partial);
        }

        let pdf = serialize(document, &self.config.output)?;
        let processing_time_ms = start.elapsed().as_millis() as u64;

        info!(
            "Replaced {} of {} regions across {} pages in {}ms",
            report.applied.len(),
            detections.len(),
            page_count,
            processing_time_ms
        );

        Ok(ReplaceOutput {
            pdf,
            report,
            processing_time_ms,
        })
    }

    /// Apply one page's detections in input order.
    fn process_page(
        &self,
        page: &mut Page,
        group: &[(usize, &Detection)],
        images: &ReplacementSet,
    ) -> ReplacementReport {
        let settings = &self.config.replace;
        let mut report = ReplacementReport::default();
        let mut placed: Vec<(usize, NativeRegion)> = Vec::new();

        for &(detection_index, detection) in group {
            let space = detection.space.unwrap_or(settings.reporting_space);
            let region = match map_detection(detection, page.geometry(), &space) {
                Ok(region) => region,
                Err(err) => {
                    warn!("Skipping detection {}: {}", detection_index, err);
                    report.skipped.push(skipped(detection_index, page.index(), &err));
                    continue;
                }
            };

            if settings.overlap == OverlapPolicy::KeepFirst {
                if let Some(&(other, _)) = placed.iter().find(|(_, r)| r.overlaps(&region)) {
                    let err = RegionError::Overlapping { other };
                    warn!("Skipping detection {}: {}", detection_index, err);
                    report.skipped.push(skipped(detection_index, page.index(), &err));
                    continue;
                }
            }

            let outcome = erase_region(page, &region, settings.background);
            if let Some(err) = outcome.fallback_error() {
                report.warnings.push(ReportWarning {
                    detection_index,
                    page_index: page.index(),
                    code: err.code().to_string(),
                    message: err.to_string(),
                });
            }

            let placement = composite(
                page,
                &region,
                images.image_for(detection_index),
                settings.fit_policy,
                settings.aspect_tolerance,
            );
            report.applied.push(AppliedRegion {
                detection_index,
                page_index: page.index(),
                region,
                placed: placement.target,
            });
            placed.push((detection_index, region));
        }

        report
    }
}

fn skipped(detection_index: usize, page_index: usize, err: &RegionError) -> SkippedDetection {
    SkippedDetection {
        detection_index,
        page_index,
        code: err.code().to_string(),
        reason: err.to_string(),
    }
}
