//! Translation of detection boxes into the page's native frame.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::{NativeRegion, PageGeometry, Point};
use crate::error::RegionError;
use crate::models::detection::Detection;

/// Coordinate space a detection box is reported in.
///
/// All spaces describe the visible (rotated) page with a top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportingSpace {
    /// PDF points on the visible page.
    #[default]
    Points,
    /// Fractions (0..1) of the visible page width and height.
    Fraction,
    /// Pixels of a rendering with the given dimensions.
    Pixels { width: f64, height: f64 },
    /// Pixels of a rendering at a known resolution.
    Dpi { dpi: f64 },
}

impl ReportingSpace {
    /// Per-axis factors converting reported units into visible-frame points.
    pub fn scale(&self, visible_width: f64, visible_height: f64) -> Result<(f64, f64), RegionError> {
        match *self {
            Self::Points => Ok((1.0, 1.0)),
            Self::Fraction => Ok((visible_width, visible_height)),
            Self::Pixels { width, height } => {
                if !(width.is_finite() && height.is_finite()) || width <= 0.0 || height <= 0.0 {
                    return Err(RegionError::InvalidReference(format!(
                        "rendered size {width}x{height}"
                    )));
                }
                Ok((visible_width / width, visible_height / height))
            }
            Self::Dpi { dpi } => {
                if !dpi.is_finite() || dpi <= 0.0 {
                    return Err(RegionError::InvalidReference(format!("dpi {dpi}")));
                }
                let factor = 72.0 / dpi;
                Ok((factor, factor))
            }
        }
    }
}

/// Map a detection box onto its page.
///
/// The box is scaled into visible-frame points, rotated back into the native
/// frame and clamped to the page. Fails when the box is unusable or nothing
/// of it remains on the page.
pub fn map_detection(
    detection: &Detection,
    geometry: &PageGeometry,
    space: &ReportingSpace,
) -> Result<NativeRegion, RegionError> {
    let values = [detection.x, detection.y, detection.width, detection.height];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(RegionError::NonFinite);
    }
    if detection.width <= 0.0 || detection.height <= 0.0 {
        return Err(RegionError::EmptyBox {
            width: detection.width,
            height: detection.height,
        });
    }

    let (visible_width, visible_height) = geometry.visible_size();
    let (sx, sy) = space.scale(visible_width, visible_height)?;

    let top_left = Point::new(detection.x * sx, detection.y * sy);
    let bottom_right = Point::new(
        (detection.x + detection.width) * sx,
        (detection.y + detection.height) * sy,
    );

    let region = NativeRegion::from_corners(
        geometry.visible_to_native(top_left),
        geometry.visible_to_native(bottom_right),
    )
    .clamp_to(geometry.width, geometry.height);

    trace!(
        "Mapped box ({}, {}, {}, {}) via {:?} to {:?}",
        detection.x, detection.y, detection.width, detection.height, space, region
    );

    if region.width() <= 0.0 || region.height() <= 0.0 {
        return Err(RegionError::Degenerate {
            width: region.width(),
            height: region.height(),
        });
    }

    Ok(region)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Rotation;
    use pretty_assertions::assert_eq;

    fn page(rotation: Rotation) -> PageGeometry {
        PageGeometry::from_box([0.0, 0.0, 600.0, 800.0], rotation)
    }

    fn region(x0: f64, y0: f64, x1: f64, y1: f64) -> NativeRegion {
        NativeRegion { x0, y0, x1, y1 }
    }

    #[test]
    fn test_pixel_space_scales_each_axis() {
        // 600x800 page rendered at 1200x400: x doubles down, y doubles up
        let space = ReportingSpace::Pixels { width: 1200.0, height: 400.0 };
        let det = Detection::new(0, 120.0, 40.0, 60.0, 20.0);
        let mapped = map_detection(&det, &page(Rotation::Deg0), &space).unwrap();
        assert_eq!(mapped, region(60.0, 80.0, 90.0, 120.0));
    }

    #[test]
    fn test_dpi_space() {
        let space = ReportingSpace::Dpi { dpi: 144.0 };
        let det = Detection::new(0, 200.0, 100.0, 100.0, 50.0);
        let mapped = map_detection(&det, &page(Rotation::Deg0), &space).unwrap();
        assert_eq!(mapped, region(100.0, 50.0, 150.0, 75.0));
    }

    #[test]
    fn test_fraction_space() {
        let det = Detection::new(0, 0.5, 0.25, 0.25, 0.125);
        let mapped = map_detection(&det, &page(Rotation::Deg0), &ReportingSpace::Fraction).unwrap();
        assert_eq!(mapped, region(300.0, 200.0, 450.0, 300.0));
    }

    #[test]
    fn test_rotated_180_reflects_through_center() {
        let det = Detection::new(0, 10.0, 20.0, 100.0, 50.0);
        let mapped = map_detection(&det, &page(Rotation::Deg180), &ReportingSpace::Points).unwrap();
        assert_eq!(mapped, region(490.0, 730.0, 590.0, 780.0));
    }

    #[test]
    fn test_rotated_90_uses_visible_dimensions() {
        // visible page is 800 wide, 600 tall; box in its top-left corner
        let det = Detection::new(0, 0.0, 0.0, 100.0, 50.0);
        let mapped = map_detection(&det, &page(Rotation::Deg90), &ReportingSpace::Points).unwrap();
        // visible top-left is the native bottom-left
        assert_eq!(mapped, region(0.0, 700.0, 50.0, 800.0));
    }

    #[test]
    fn test_rotated_270() {
        let det = Detection::new(0, 0.0, 0.0, 100.0, 50.0);
        let mapped = map_detection(&det, &page(Rotation::Deg270), &ReportingSpace::Points).unwrap();
        // visible top-left is the native top-right
        assert_eq!(mapped, region(550.0, 0.0, 600.0, 100.0));
    }

    #[test]
    fn test_clamps_to_page() {
        let det = Detection::new(0, -50.0, 700.0, 1000.0, 500.0);
        let mapped = map_detection(&det, &page(Rotation::Deg0), &ReportingSpace::Points).unwrap();
        assert_eq!(mapped, region(0.0, 700.0, 600.0, 800.0));
    }

    #[test]
    fn test_full_page_region_is_valid() {
        let det = Detection::new(0, 0.0, 0.0, 600.0, 800.0);
        let mapped = map_detection(&det, &page(Rotation::Deg0), &ReportingSpace::Points).unwrap();
        assert_eq!(mapped, page(Rotation::Deg0).bounds());
    }

    #[test]
    fn test_box_off_page_is_degenerate() {
        let det = Detection::new(0, 700.0, 10.0, 50.0, 50.0);
        let err = map_detection(&det, &page(Rotation::Deg0), &ReportingSpace::Points).unwrap_err();
        assert!(matches!(err, RegionError::Degenerate { .. }));
    }

    #[test]
    fn test_rejects_bad_boxes() {
        let geometry = page(Rotation::Deg0);
        let zero = Detection::new(0, 10.0, 10.0, 0.0, 5.0);
        assert!(matches!(
            map_detection(&zero, &geometry, &ReportingSpace::Points),
            Err(RegionError::EmptyBox { .. })
        ));

        let nan = Detection::new(0, f64::NAN, 10.0, 5.0, 5.0);
        assert_eq!(
            map_detection(&nan, &geometry, &ReportingSpace::Points),
            Err(RegionError::NonFinite)
        );

        let space = ReportingSpace::Pixels { width: 0.0, height: 100.0 };
        let det = Detection::new(0, 1.0, 1.0, 5.0, 5.0);
        assert!(matches!(
            map_detection(&det, &geometry, &space),
            Err(RegionError::InvalidReference(_))
        ));
    }
}
