//! Fit policies for scaling a replacement image into a region.

use crate::geometry::Rect;
use crate::models::config::FitPolicy;

/// Rectangle the image occupies when fitted into `region`.
///
/// All quantities are in the visible frame. The result is a pure function of
/// its inputs. For [`FitPolicy::Cover`] the rectangle overflows the region
/// and the caller clips it.
pub fn fit_image(
    region: &Rect,
    image_width: f64,
    image_height: f64,
    policy: FitPolicy,
    aspect_tolerance: f64,
) -> Rect {
    if policy == FitPolicy::Stretch || image_width <= 0.0 || image_height <= 0.0 {
        return *region;
    }

    let image_aspect = image_width / image_height;
    let region_aspect = region.width / region.height;
    if aspect_tolerance > 0.0 && (image_aspect - region_aspect).abs() <= aspect_tolerance {
        return *region;
    }

    let sx = region.width / image_width;
    let sy = region.height / image_height;
    let scale = if policy == FitPolicy::Cover {
        sx.max(sy)
    } else {
        sx.min(sy)
    };

    let width = image_width * scale;
    let height = image_height * scale;
    Rect::new(
        region.x + (region.width - width) / 2.0,
        region.y + (region.height - height) / 2.0,
        width,
        height,
    )
}
