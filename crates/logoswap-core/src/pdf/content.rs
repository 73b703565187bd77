//! Content stream analysis and generation of the edit operators.
//!
//! A modified page gets two new streams around its original content:
//!
//! ```text
//! q  <page minus erased regions> W* n     prefix
//!    ...original content...
//! Q  <fills, overlays, images>            suffix
//! ```

use std::collections::HashMap;

use lopdf::content::{Content, Operation};
use lopdf::{Object, ObjectId};

use crate::edit::{PageEdit, Placement};
use crate::geometry::{NativeRegion, PageGeometry};
use crate::replacement::ImageId;

/// Whether a page's original content can be wrapped and clipped.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentProfile {
    /// Content decodes and never restores more state than it saves.
    /// `open_depth` counts saves left open at the end of the stream.
    Wrappable { open_depth: usize },
    /// Content cannot be clipped safely.
    Unsupported { reason: String },
}

/// Inspect a page's content stream.
pub fn analyze_content(doc: &lopdf::Document, page_id: ObjectId) -> ContentProfile {
    // split streams are joined with a newline so operators never run together
    let mut data = Vec::new();
    for stream_id in doc.get_page_contents(page_id) {
        let stream = match doc.get_object(stream_id).and_then(Object::as_stream) {
            Ok(stream) => stream,
            Err(e) => {
                return ContentProfile::Unsupported {
                    reason: format!("unreadable content stream: {}", e),
                };
            }
        };
        match stream.decompressed_content() {
            Ok(decoded) => data.extend_from_slice(&decoded),
            Err(_) => data.extend_from_slice(&stream.content),
        }
        data.push(b'\n');
    }
    profile_operations(&data)
}

fn profile_operations(data: &[u8]) -> ContentProfile {
    let content = match Content::decode(data) {
        Ok(content) => content,
        Err(e) => {
            return ContentProfile::Unsupported {
                reason: format!("undecodable content stream: {}", e),
            };
        }
    };

    let mut depth = 0usize;
    for operation in &content.operations {
        match operation.operator.as_str() {
            "q" => depth += 1,
            "Q" if depth == 0 => {
                return ContentProfile::Unsupported {
                    reason: "graphics state restored without a matching save".to_string(),
                };
            }
            "Q" => depth -= 1,
            _ => {}
        }
    }
    ContentProfile::Wrappable { open_depth: depth }
}

/// Operators opening the wrapper and clipping erased regions out of the page.
pub fn prefix_operations(
    geometry: &PageGeometry,
    profile: &ContentProfile,
    edits: &[PageEdit],
) -> Content {
    let mut operations = vec![Operation::new("q", vec![])];

    if matches!(profile, ContentProfile::Wrappable { .. }) {
        let mut clipped: Vec<&NativeRegion> = Vec::new();
        for edit in edits {
            if let PageEdit::Erase { region, .. } = edit {
                if clipped.iter().any(|r| r.approx_eq(region)) {
                    continue;
                }
                clip_excluding(&mut operations, geometry, region);
                clipped.push(region);
            }
        }
    }

    Content { operations }
}

/// Operators closing the wrapper and painting fills and images in edit order.
pub fn suffix_operations(
    geometry: &PageGeometry,
    profile: &ContentProfile,
    edits: &[PageEdit],
    image_names: &HashMap<ImageId, Vec<u8>>,
) -> Content {
    let restores = match profile {
        ContentProfile::Wrappable { open_depth } => open_depth + 1,
        ContentProfile::Unsupported { .. } => 1,
    };
    let mut operations: Vec<Operation> = (0..restores).map(|_| Operation::new("Q", vec![])).collect();

    for (i, edit) in edits.iter().enumerate() {
        match edit {
            PageEdit::Erase { region, fill: Some(color) } | PageEdit::Overlay { region, color } => {
                fill_region(&mut operations, geometry, region, *color);
            }
            PageEdit::Erase { fill: None, .. } => {}
            PageEdit::Place(placement) => {
                let Some(name) = image_names.get(&placement.image.id()) else {
                    continue;
                };
                let later = edits[i + 1..].iter().filter_map(PageEdit::cleared_region);
                draw_image(&mut operations, geometry, placement, name, later);
            }
        }
    }

    Content { operations }
}

fn real(value: f64) -> Object {
    Object::Real(value as f32)
}

fn rectangle(operations: &mut Vec<Operation>, rect: [f64; 4]) {
    operations.push(Operation::new("re", rect.iter().copied().map(real).collect()));
}

/// Intersect the clip with the page minus `region` (even-odd).
fn clip_excluding(operations: &mut Vec<Operation>, geometry: &PageGeometry, region: &NativeRegion) {
    rectangle(operations, geometry.region_to_user(&geometry.bounds()));
    rectangle(operations, geometry.region_to_user(region));
    operations.push(Operation::new("W*", vec![]));
    operations.push(Operation::new("n", vec![]));
}

fn fill_region(
    operations: &mut Vec<Operation>,
    geometry: &PageGeometry,
    region: &NativeRegion,
    color: [f32; 3],
) {
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new(
        "rg",
        color.iter().map(|c| Object::Real(*c)).collect(),
    ));
    rectangle(operations, geometry.region_to_user(region));
    operations.push(Operation::new("f", vec![]));
    operations.push(Operation::new("Q", vec![]));
}

/// Draw an image clipped to its region, minus regions cleared after it.
fn draw_image<'a>(
    operations: &mut Vec<Operation>,
    geometry: &PageGeometry,
    placement: &Placement,
    name: &[u8],
    later_cleared: impl Iterator<Item = &'a NativeRegion>,
) {
    operations.push(Operation::new("q", vec![]));
    rectangle(operations, geometry.region_to_user(&placement.region));
    operations.push(Operation::new("W", vec![]));
    operations.push(Operation::new("n", vec![]));
    for region in later_cleared.filter(|r| r.overlaps(&placement.region)) {
        clip_excluding(operations, geometry, region);
    }
    operations.push(Operation::new(
        "cm",
        placement.matrix.iter().copied().map(real).collect(),
    ));
    operations.push(Operation::new("Do", vec![Object::Name(name.to_vec())]));
    operations.push(Operation::new("Q", vec![]));
}
