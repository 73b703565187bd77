//! Region erasure.

use tracing::{debug, warn};

use super::PageEdit;
use crate::error::PdfError;
use crate::geometry::NativeRegion;
use crate::models::config::Background;
use crate::pdf::{ContentProfile, Page};

/// How a region was cleared.
#[derive(Debug, Clone, PartialEq)]
pub enum EraseOutcome {
    /// Original content is clipped out of the region.
    Cleared,
    /// The page content could not be clipped; an opaque rectangle covers the
    /// region instead.
    Overlaid { reason: String },
}

impl EraseOutcome {
    /// The content error behind an overlay fallback.
    pub fn fallback_error(&self) -> Option<PdfError> {
        match self {
            Self::Cleared => None,
            Self::Overlaid { reason } => Some(PdfError::UnsupportedContent(reason.clone())),
        }
    }
}

/// Remove all visible page content inside `region`.
///
/// Content outside the region is untouched. Erasing the same region again
/// with nothing drawn in between records nothing new, so the result is
/// identical to erasing once.
pub fn erase_region(page: &mut Page, region: &NativeRegion, background: Background) -> EraseOutcome {
    let repeated = page
        .edits()
        .iter()
        .rev()
        .take_while(|edit| !matches!(edit, PageEdit::Place(_)))
        .filter_map(PageEdit::cleared_region)
        .any(|previous| previous.approx_eq(region));

    let unsupported = match page.content() {
        ContentProfile::Wrappable { .. } => None,
        ContentProfile::Unsupported { reason } => Some(reason.clone()),
    };

    let Some(reason) = unsupported else {
        if repeated {
            debug!("Region {:?} on page {} already erased", region, page.index());
        } else {
            page.push_edit(PageEdit::Erase {
                region: *region,
                fill: background.fill_color(),
            });
        }
        return EraseOutcome::Cleared;
    };

    warn!(
        "Page {} content cannot be clipped ({}); covering region with an opaque rectangle",
        page.index(),
        reason
    );
    if !repeated {
        page.push_edit(PageEdit::Overlay {
            region: *region,
            color: background.overlay_color(),
        });
    }
    EraseOutcome::Overlaid { reason }
}
