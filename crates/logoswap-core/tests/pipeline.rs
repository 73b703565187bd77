//! End-to-end replacement tests on documents built in memory.

mod common;

use std::sync::Arc;

use common::*;
use logoswap_core::edit::erase_region;
use logoswap_core::models::config::OutputConfig;
use logoswap_core::pdf::serialize;
use logoswap_core::{
    Background, Detection, Document, FitPolicy, LogoReplacer, LogoswapConfig, NativeRegion,
    ReplacementImage, ReplacementSet, ReportingSpace,
};
use pretty_assertions::assert_eq;

fn uncompressed() -> LogoswapConfig {
    let mut config = LogoswapConfig::default();
    config.output = OutputConfig {
        compress: false,
        prune_unused: true,
    };
    config
}

fn logo_detection(page_index: usize) -> Detection {
    // blue rectangle of LOGO_CONTENT, in visible points from the top
    Detection::new(page_index, 50.0, 42.0, 100.0, 50.0)
}

#[test]
fn test_no_detections_returns_input_unchanged() {
    let pdf = letter_pdf(2);
    let output = LogoReplacer::default()
        .replace_encoded(&pdf, &[], &png_logo(8, 4))
        .unwrap();
    assert_eq!(output.pdf, pdf);
    assert!(output.report.applied.is_empty());
    assert_eq!(output.report.page_count, 2);
}

#[test]
fn test_replaces_region_and_keeps_original_content() {
    let pdf = letter_pdf(1);
    let output = LogoReplacer::new(uncompressed())
        .replace_encoded(&pdf, &[logo_detection(0)], &png_logo(8, 4))
        .unwrap();

    assert!(output.report.is_clean());
    let applied = &output.report.applied[0];
    assert_eq!(
        applied.region,
        NativeRegion { x0: 50.0, y0: 42.0, x1: 150.0, y1: 92.0 }
    );

    let ops = page_operators(&output.pdf, 1);
    // original fill and stroke survive inside the clipped wrapper
    assert!(ops.iter().any(|op| op == "S"));
    assert!(ops.iter().any(|op| op == "W*"));
    assert_eq!(ops.iter().filter(|op| *op == "Do").count(), 1);
    assert_eq!(image_streams(&output.pdf).len(), 1);
}

#[test]
fn test_erasing_twice_matches_erasing_once() {
    let pdf = letter_pdf(1);
    let region = NativeRegion { x0: 50.0, y0: 42.0, x1: 150.0, y1: 92.0 };
    let options = OutputConfig {
        compress: false,
        prune_unused: false,
    };

    let mut once = Document::load(&pdf).unwrap();
    erase_region(once.page_mut(0).unwrap(), &region, Background::White);

    let mut twice = Document::load(&pdf).unwrap();
    erase_region(twice.page_mut(0).unwrap(), &region, Background::White);
    erase_region(twice.page_mut(0).unwrap(), &region, Background::White);

    assert_eq!(
        serialize(once, &options).unwrap(),
        serialize(twice, &options).unwrap()
    );
}

#[test]
fn test_degenerate_detection_is_isolated() {
    let pdf = letter_pdf(2);
    let detections = vec![
        logo_detection(0),
        Detection::new(0, 300.0, 300.0, 0.0, 20.0),
        logo_detection(1),
    ];
    let output = LogoReplacer::default()
        .replace_encoded(&pdf, &detections, &png_logo(8, 4))
        .unwrap();

    let applied: Vec<_> = output.report.applied.iter().map(|a| a.detection_index).collect();
    assert_eq!(applied, vec![0, 2]);
    assert_eq!(output.report.skipped.len(), 1);
    assert_eq!(output.report.skipped[0].detection_index, 1);
    assert_eq!(output.report.skipped[0].code, "invalid_region");
}

#[test]
fn test_page_count_and_order_preserved() {
    let pdf = build_pdf(&[
        PageSpec::letter(LOGO_CONTENT),
        PageSpec {
            media_box: [0, 0, 842, 595],
            rotate: None,
            content: LOGO_CONTENT.to_vec(),
        },
        PageSpec::letter(b"0 0 m 10 10 l S"),
    ]);
    let output = LogoReplacer::default()
        .replace_encoded(&pdf, &[logo_detection(1)], &png_logo(8, 4))
        .unwrap();

    let doc = lopdf::Document::load_mem(&output.pdf).unwrap();
    let pages = doc.get_pages();
    assert_eq!(pages.len(), 3);
    let second = doc.get_dictionary(pages[&2]).unwrap();
    let media_box = second.get(b"MediaBox").unwrap().as_array().unwrap();
    assert_eq!(media_box[2].as_i64().unwrap(), 842);
}

#[test]
fn test_untouched_pages_keep_their_content() {
    let pdf = build_pdf(&[
        PageSpec::letter(LOGO_CONTENT),
        PageSpec::letter(b"0 0 m 10 10 l S"),
    ]);
    let output = LogoReplacer::new(uncompressed())
        .replace_encoded(&pdf, &[logo_detection(0)], &png_logo(8, 4))
        .unwrap();
    assert_eq!(page_operators(&output.pdf, 2), vec!["m", "l", "S"]);
}

#[test]
fn test_zero_page_document() {
    let pdf = build_pdf(&[]);
    let output = LogoReplacer::default()
        .replace_encoded(&pdf, &[logo_detection(0)], &png_logo(8, 4))
        .unwrap();
    assert_eq!(output.report.page_count, 0);
    assert_eq!(output.report.skipped[0].code, "page_out_of_range");
    assert_eq!(output.pdf, pdf);
}

#[test]
fn test_malformed_document_is_fatal() {
    let err = LogoReplacer::default()
        .replace_encoded(b"definitely not a pdf", &[logo_detection(0)], &png_logo(8, 4))
        .unwrap_err();
    assert_eq!(err.code(), "malformed_document");
    assert!(err.is_fatal());
}

#[test]
fn test_rotated_page_region_reflects_through_center() {
    let pdf = build_pdf(&[PageSpec::letter(LOGO_CONTENT).rotated(180)]);
    let output = LogoReplacer::default()
        .replace_encoded(
            &pdf,
            &[Detection::new(0, 0.0, 0.0, 100.0, 50.0)],
            &png_logo(8, 4),
        )
        .unwrap();
    assert_eq!(
        output.report.applied[0].region,
        NativeRegion { x0: 512.0, y0: 742.0, x1: 612.0, y1: 792.0 }
    );
}

#[test]
fn test_pixel_space_detection() {
    let mut config = uncompressed();
    // page rendered at 1224x1584, twice the point size
    config.replace.reporting_space = ReportingSpace::Pixels {
        width: 1224.0,
        height: 1584.0,
    };
    let detections = vec![
        Detection::new(0, 100.0, 84.0, 200.0, 100.0),
        Detection::new(0, 0.0, 0.0, 0.5, 0.5).with_space(ReportingSpace::Fraction),
    ];
    let output = LogoReplacer::new(config)
        .replace_encoded(&letter_pdf(1), &detections, &png_logo(8, 4))
        .unwrap();

    assert_eq!(
        output.report.applied[0].region,
        NativeRegion { x0: 50.0, y0: 42.0, x1: 150.0, y1: 92.0 }
    );
    assert_eq!(
        output.report.applied[1].region,
        NativeRegion { x0: 0.0, y0: 0.0, x1: 306.0, y1: 396.0 }
    );
}

#[test]
fn test_per_detection_override_embeds_each_image_once() {
    let default = ReplacementImage::decode(&png_logo(8, 4)).unwrap();
    let special = Arc::new(ReplacementImage::decode(&translucent_png_logo(6, 6)).unwrap());
    let images = ReplacementSet::single(default).with_override(1, special);

    let detections = vec![
        logo_detection(0),
        Detection::new(0, 300.0, 300.0, 60.0, 60.0),
        logo_detection(1),
    ];
    let output = LogoReplacer::new(uncompressed())
        .replace(&letter_pdf(2), &detections, &images)
        .unwrap();

    assert_eq!(output.report.applied.len(), 3);
    let streams = image_streams(&output.pdf);
    assert_eq!(streams.len(), 2);
    assert_eq!(
        streams.iter().filter(|s| s.dict.get(b"SMask").is_ok()).count(),
        1
    );
}

#[test]
fn test_jpeg_logo_is_embedded_without_recompression() {
    let output = LogoReplacer::new(uncompressed())
        .replace_encoded(&letter_pdf(1), &[logo_detection(0)], &jpeg_logo(16, 8))
        .unwrap();

    let streams = image_streams(&output.pdf);
    assert_eq!(streams.len(), 1);
    let filter = streams[0].dict.get(b"Filter").unwrap().as_name().unwrap();
    assert_eq!(filter, b"DCTDecode");
}

#[test]
fn test_unbalanced_content_falls_back_to_overlay() {
    let pdf = build_pdf(&[PageSpec::letter(b"Q 0 0 1 rg 50 700 100 50 re f")]);
    let output = LogoReplacer::new(uncompressed())
        .replace_encoded(&pdf, &[logo_detection(0)], &png_logo(8, 4))
        .unwrap();

    assert_eq!(output.report.applied.len(), 1);
    assert_eq!(output.report.warnings.len(), 1);
    assert_eq!(output.report.warnings[0].code, "unsupported_content");
    assert!(!page_operators(&output.pdf, 1).iter().any(|op| op == "W*"));
}

#[test]
fn test_fit_policy_is_deterministic() {
    let mut config = uncompressed();
    config.replace.fit_policy = FitPolicy::Contain;
    let replacer = LogoReplacer::new(config);
    let pdf = letter_pdf(1);
    let logo = png_logo(30, 10);

    let first = replacer.replace_encoded(&pdf, &[logo_detection(0)], &logo).unwrap();
    let second = replacer.replace_encoded(&pdf, &[logo_detection(0)], &logo).unwrap();
    assert_eq!(first.report, second.report);
    // 3:1 logo in a 2:1 region: full width, centered vertically
    let placed = first.report.applied[0].placed;
    assert!((placed.width - 100.0).abs() < 1e-9);
    assert!((placed.height - 100.0 / 3.0).abs() < 1e-9);
    assert!((placed.y - (42.0 + (50.0 - 100.0 / 3.0) / 2.0)).abs() < 1e-9);
}
