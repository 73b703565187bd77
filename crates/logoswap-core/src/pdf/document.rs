//! Document loading and the in-memory page collection.

use lopdf::{Dictionary, Object, ObjectId};
use tracing::{debug, warn};

use super::content::{analyze_content, ContentProfile};
use super::Result;
use crate::edit::PageEdit;
use crate::error::PdfError;
use crate::geometry::{PageGeometry, Rotation};

/// Page attributes are inherited through at most this many `Parent` links.
pub(super) const MAX_INHERITANCE_DEPTH: usize = 32;

/// US Letter, used when no page box can be found.
const DEFAULT_PAGE_BOX: [f64; 4] = [0.0, 0.0, 612.0, 792.0];

/// A loaded PDF document and its pages.
pub struct Document {
    pub(crate) inner: lopdf::Document,
    pub(crate) raw_data: Vec<u8>,
    pub(crate) pages: Vec<Page>,
}

/// One page of a loaded document.
#[derive(Debug, Clone)]
pub struct Page {
    index: usize,
    object_id: ObjectId,
    geometry: PageGeometry,
    content: ContentProfile,
    edits: Vec<PageEdit>,
}

impl Page {
    /// Zero-based position in the document.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    pub fn native_width(&self) -> f64 {
        self.geometry.width
    }

    pub fn native_height(&self) -> f64 {
        self.geometry.height
    }

    pub fn rotation(&self) -> Rotation {
        self.geometry.rotation
    }

    /// Whether the content stream can be clipped.
    pub fn content(&self) -> &ContentProfile {
        &self.content
    }

    /// Edits recorded so far, in application order.
    pub fn edits(&self) -> &[PageEdit] {
        &self.edits
    }

    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    pub(crate) fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub(crate) fn push_edit(&mut self, edit: PageEdit) {
        self.edits.push(edit);
    }

    /// A page not backed by any document, for exercising edits in isolation.
    #[cfg(test)]
    pub(crate) fn detached(index: usize, geometry: PageGeometry, content: ContentProfile) -> Self {
        Self {
            index,
            object_id: (0, 0),
            geometry,
            content,
            edits: Vec::new(),
        }
    }
}

impl Document {
    /// Parse PDF bytes into a document.
    ///
    /// Documents encrypted with an empty user password are decrypted.
    /// A document without pages loads as an empty page collection.
    pub fn load(data: &[u8]) -> Result<Self> {
        let mut inner =
            lopdf::Document::load_mem(data).map_err(|e| PdfError::Malformed(e.to_string()))?;

        let raw_data = if inner.is_encrypted() {
            if inner.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");

            let mut decrypted = Vec::new();
            inner
                .save_to(&mut decrypted)
                .map_err(|e| PdfError::Malformed(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        let pages = inner
            .get_pages()
            .into_values()
            .enumerate()
            .map(|(index, object_id)| load_page(&inner, index, object_id))
            .collect::<Vec<_>>();

        debug!("Loaded PDF with {} pages", pages.len());
        Ok(Self {
            inner,
            raw_data,
            pages,
        })
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn pages_mut(&mut self) -> &mut [Page] {
        &mut self.pages
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn page_mut(&mut self, index: usize) -> Option<&mut Page> {
        self.pages.get_mut(index)
    }

    pub fn is_modified(&self) -> bool {
        self.pages.iter().any(Page::is_modified)
    }
}

fn load_page(doc: &lopdf::Document, index: usize, object_id: ObjectId) -> Page {
    let page_box = inherited(doc, object_id, b"CropBox")
        .and_then(|obj| number_array(doc, obj))
        .or_else(|| inherited(doc, object_id, b"MediaBox").and_then(|obj| number_array(doc, obj)))
        .unwrap_or_else(|| {
            warn!("Page {} has no usable page box, assuming US Letter", index);
            DEFAULT_PAGE_BOX
        });

    let degrees = inherited(doc, object_id, b"Rotate")
        .and_then(|obj| obj.as_i64().ok())
        .unwrap_or(0);
    let rotation = Rotation::from_degrees(degrees).unwrap_or_else(|| {
        warn!("Page {} has invalid rotation {}, treating as 0", index, degrees);
        Rotation::Deg0
    });

    let geometry = PageGeometry::from_box(page_box, rotation);
    let content = analyze_content(doc, object_id);
    if let ContentProfile::Unsupported { reason } = &content {
        debug!("Page {} content is not clippable: {}", index, reason);
    }

    Page {
        index,
        object_id,
        geometry,
        content,
        edits: Vec::new(),
    }
}

/// Look up an inheritable page attribute, walking up the page tree.
fn inherited<'a>(doc: &'a lopdf::Document, page_id: ObjectId, key: &[u8]) -> Option<&'a Object> {
    let mut node_id = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let dict = doc.get_dictionary(node_id).ok()?;
        if let Ok(value) = dict.get(key) {
            return doc.dereference(value).ok().map(|(_, obj)| obj);
        }
        node_id = parent_of(dict)?;
    }
    None
}

fn parent_of(dict: &Dictionary) -> Option<ObjectId> {
    match dict.get(b"Parent") {
        Ok(Object::Reference(id)) => Some(*id),
        _ => None,
    }
}

fn number_array(doc: &lopdf::Document, obj: &Object) -> Option<[f64; 4]> {
    let values = obj
        .as_array()
        .ok()?
        .iter()
        .filter_map(|item| number(doc.dereference(item).ok()?.1))
        .collect::<Vec<_>>();
    match values.as_slice() {
        [a, b, c, d] if (c - a).abs() > 0.0 && (d - b).abs() > 0.0 => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(r) => Some(*r as f64),
        _ => None,
    }
}
