//! Page edits: region erasure and image placement.
//!
//! Edits are recorded on the [`Page`](crate::pdf::Page) in the order they are
//! applied and turned into content operators when the document is
//! serialized. Later edits paint over earlier ones.

mod compositor;
mod eraser;
mod fit;

pub use compositor::{composite, Placement};
pub use eraser::{erase_region, EraseOutcome};
pub use fit::fit_image;

use crate::geometry::NativeRegion;

/// One recorded page modification.
#[derive(Debug, Clone)]
pub enum PageEdit {
    /// Original content is clipped away from the region, then the region is
    /// optionally filled.
    Erase {
        region: NativeRegion,
        fill: Option<[f32; 3]>,
    },
    /// Opaque rectangle painted over content that could not be clipped.
    Overlay { region: NativeRegion, color: [f32; 3] },
    /// Replacement image drawn into a region.
    Place(Placement),
}

impl PageEdit {
    /// Region cleared by this edit, if it clears anything.
    pub fn cleared_region(&self) -> Option<&NativeRegion> {
        match self {
            Self::Erase { region, .. } | Self::Overlay { region, .. } => Some(region),
            Self::Place(_) => None,
        }
    }
}
