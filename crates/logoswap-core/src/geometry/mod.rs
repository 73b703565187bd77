//! Page geometry: rotation, page boxes and regions in the native frame.
//!
//! Two frames are used throughout the crate:
//!
//! - the *visible* frame, the page as a viewer shows it after `/Rotate`,
//!   origin at the top-left, y growing downward;
//! - the *native* frame, the same page box before rotation, also with a
//!   top-left origin and y growing downward.
//!
//! PDF user space (bottom-left origin, y upward) only appears when content
//! operators are written, via [`PageGeometry::native_to_user`].

mod mapper;

pub use mapper::{map_detection, ReportingSpace};

use serde::{Deserialize, Serialize};

/// Page rotation as stored in the `/Rotate` entry (clockwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Rotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl Rotation {
    /// Normalize a `/Rotate` value. Returns `None` for non-multiples of 90.
    pub fn from_degrees(degrees: i64) -> Option<Self> {
        match degrees.rem_euclid(360) {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    pub fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// Whether the visible frame swaps width and height.
    pub fn is_quarter_turn(self) -> bool {
        matches!(self, Self::Deg90 | Self::Deg270)
    }
}

/// A point in one of the page frames.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle as origin plus size, top-left origin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Bounding rectangle of two opposite corners.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let x = a.x.min(b.x);
        let y = a.y.min(b.y);
        Self {
            x,
            y,
            width: a.x.max(b.x) - x,
            height: a.y.max(b.y) - y,
        }
    }
}

/// A region in the page's native (unrotated) frame, in points.
///
/// Coordinates are relative to the top-left corner of the visible page box
/// with y growing downward. `x0 <= x1` and `y0 <= y1` always hold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NativeRegion {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl NativeRegion {
    /// Region spanning two opposite corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            x0: a.x.min(b.x),
            y0: a.y.min(b.y),
            x1: a.x.max(b.x),
            y1: a.y.max(b.y),
        }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Clip to `[0, width] x [0, height]`.
    pub fn clamp_to(&self, width: f64, height: f64) -> Self {
        let clamp_x = |v: f64| v.clamp(0.0, width);
        let clamp_y = |v: f64| v.clamp(0.0, height);
        Self {
            x0: clamp_x(self.x0),
            y0: clamp_y(self.y0),
            x1: clamp_x(self.x1),
            y1: clamp_y(self.y1),
        }
    }

    /// True when the two regions share a non-empty area.
    pub fn overlaps(&self, other: &NativeRegion) -> bool {
        self.x0 < other.x1 && self.x1 > other.x0 && self.y0 < other.y1 && self.y1 > other.y0
    }

    /// Equality within a small tolerance, used to collapse repeated erases.
    pub fn approx_eq(&self, other: &NativeRegion) -> bool {
        const EPS: f64 = 1e-6;
        (self.x0 - other.x0).abs() < EPS
            && (self.y0 - other.y0).abs() < EPS
            && (self.x1 - other.x1).abs() < EPS
            && (self.y1 - other.y1).abs() < EPS
    }
}

/// Size, placement and rotation of a page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    /// Lower-left corner of the page box in PDF user space.
    pub origin_x: f64,
    pub origin_y: f64,
    /// Native (unrotated) page box size in points.
    pub width: f64,
    pub height: f64,
    pub rotation: Rotation,
}

impl PageGeometry {
    /// Geometry for a page box given as `[llx, lly, urx, ury]`.
    pub fn from_box(page_box: [f64; 4], rotation: Rotation) -> Self {
        let (x0, x1) = (page_box[0].min(page_box[2]), page_box[0].max(page_box[2]));
        let (y0, y1) = (page_box[1].min(page_box[3]), page_box[1].max(page_box[3]));
        Self {
            origin_x: x0,
            origin_y: y0,
            width: x1 - x0,
            height: y1 - y0,
            rotation,
        }
    }

    /// Size of the page as a viewer displays it.
    pub fn visible_size(&self) -> (f64, f64) {
        if self.rotation.is_quarter_turn() {
            (self.height, self.width)
        } else {
            (self.width, self.height)
        }
    }

    /// The whole page as a native region.
    pub fn bounds(&self) -> NativeRegion {
        NativeRegion {
            x0: 0.0,
            y0: 0.0,
            x1: self.width,
            y1: self.height,
        }
    }

    /// Map a visible-frame point back to the native frame (inverse rotation).
    pub fn visible_to_native(&self, p: Point) -> Point {
        let (w, h) = (self.width, self.height);
        match self.rotation {
            Rotation::Deg0 => p,
            Rotation::Deg90 => Point::new(p.y, h - p.x),
            Rotation::Deg180 => Point::new(w - p.x, h - p.y),
            Rotation::Deg270 => Point::new(w - p.y, p.x),
        }
    }

    /// Map a native-frame point to the visible frame.
    pub fn native_to_visible(&self, p: Point) -> Point {
        let (w, h) = (self.width, self.height);
        match self.rotation {
            Rotation::Deg0 => p,
            Rotation::Deg90 => Point::new(h - p.y, p.x),
            Rotation::Deg180 => Point::new(w - p.x, h - p.y),
            Rotation::Deg270 => Point::new(p.y, w - p.x),
        }
    }

    /// Map a native-frame point into PDF user space.
    pub fn native_to_user(&self, p: Point) -> Point {
        Point::new(self.origin_x + p.x, self.origin_y + self.height - p.y)
    }

    /// A native region as seen in the visible frame.
    pub fn region_to_visible(&self, region: &NativeRegion) -> Rect {
        Rect::from_corners(
            self.native_to_visible(Point::new(region.x0, region.y0)),
            self.native_to_visible(Point::new(region.x1, region.y1)),
        )
    }

    /// A native region as `(x, y, width, height)` in PDF user space, ready for `re`.
    pub fn region_to_user(&self, region: &NativeRegion) -> [f64; 4] {
        let bottom_left = self.native_to_user(Point::new(region.x0, region.y1));
        [bottom_left.x, bottom_left.y, region.width(), region.height()]
    }

    /// Affine matrix (`cm` operands) that maps the image unit square onto a
    /// visible-frame rectangle, keeping the image upright as displayed.
    pub fn image_matrix(&self, target: &Rect) -> [f64; 6] {
        // unit-square point (s, t), t = 1 is the top row of the image
        let map = |s: f64, t: f64| {
            let visible = Point::new(
                target.x + s * target.width,
                target.y + (1.0 - t) * target.height,
            );
            self.native_to_user(self.visible_to_native(visible))
        };
        let p0 = map(0.0, 0.0);
        let p1 = map(1.0, 0.0);
        let p2 = map(0.0, 1.0);
        [p1.x - p0.x, p1.y - p0.y, p2.x - p0.x, p2.y - p0.y, p0.x, p0.y]
    }
}
