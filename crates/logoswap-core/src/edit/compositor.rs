//! Image placement into erased regions.

use std::sync::Arc;

use tracing::debug;

use super::{fit_image, PageEdit};
use crate::geometry::{NativeRegion, Rect};
use crate::models::config::FitPolicy;
use crate::pdf::Page;
use crate::replacement::ReplacementImage;

/// A replacement image drawn on a page.
#[derive(Debug, Clone)]
pub struct Placement {
    /// Region the drawing is clipped to, native frame.
    pub region: NativeRegion,
    /// Rectangle the image occupies, visible frame.
    pub target: Rect,
    /// `cm` operands mapping the image unit square into PDF user space.
    pub matrix: [f64; 6],
    pub image: Arc<ReplacementImage>,
}

/// Draw `image` into `region` on `page` using the fit policy.
///
/// Fitting happens in the visible frame so the image keeps its proportions
/// and stays upright on rotated pages.
pub fn composite(
    page: &mut Page,
    region: &NativeRegion,
    image: &Arc<ReplacementImage>,
    policy: FitPolicy,
    aspect_tolerance: f64,
) -> Placement {
    let geometry = *page.geometry();
    let visible = geometry.region_to_visible(region);
    let target = fit_image(
        &visible,
        image.width() as f64,
        image.height() as f64,
        policy,
        aspect_tolerance,
    );

    let placement = Placement {
        region: *region,
        target,
        matrix: geometry.image_matrix(&target),
        image: Arc::clone(image),
    };

    debug!(
        "Placing {}x{} image on page {} at {:?} ({:?})",
        image.width(),
        image.height(),
        page.index(),
        target,
        policy
    );

    page.push_edit(PageEdit::Place(placement.clone()));
    placement
}
