//! Output assembly: materialize page edits and save the document.

use std::collections::HashMap;

use lopdf::{dictionary, Dictionary, Object, ObjectId, Stream};
use tracing::{debug, trace};

use super::content::{prefix_operations, suffix_operations};
use super::document::MAX_INHERITANCE_DEPTH;
use super::{Document, Page, Result};
use crate::error::PdfError;
use crate::models::config::OutputConfig;
use crate::replacement::{ImageEncoding, ImageId, ReplacementImage};

/// Produce PDF bytes reflecting every page edit.
///
/// A document without edits is returned exactly as loaded.
pub fn serialize(document: Document, options: &OutputConfig) -> Result<Vec<u8>> {
    let Document {
        mut inner,
        raw_data,
        pages,
    } = document;

    if !pages.iter().any(Page::is_modified) {
        debug!("No page edits, returning document unchanged");
        return Ok(raw_data);
    }

    let mut embedded: HashMap<ImageId, ObjectId> = HashMap::new();
    for page in pages.iter().filter(|p| p.is_modified()) {
        write_page(&mut inner, page, &mut embedded)?;
    }

    let page_count = inner.get_pages().len();
    if page_count != pages.len() {
        return Err(PdfError::Serialization(format!(
            "page count changed from {} to {}",
            pages.len(),
            page_count
        )));
    }

    if options.prune_unused {
        let pruned = inner.prune_objects();
        trace!("Pruned {} unreachable objects", pruned.len());
    }
    if options.compress {
        inner.compress();
    }

    let mut output = Vec::new();
    inner
        .save_to(&mut output)
        .map_err(|e| PdfError::Serialization(e.to_string()))?;

    debug!(
        "Serialized {} pages ({} images embedded), {} bytes",
        page_count,
        embedded.len(),
        output.len()
    );
    Ok(output)
}

fn write_page(
    doc: &mut lopdf::Document,
    page: &Page,
    embedded: &mut HashMap<ImageId, ObjectId>,
) -> Result<()> {
    let page_id = page.object_id();
    let image_names = register_images(doc, page, embedded)?;

    let encode_error = |e: lopdf::Error| PdfError::Serialization(format!("page {}: {}", page.index(), e));

    // streams are joined byte for byte, so each one is delimited by newlines
    let mut prefix = prefix_operations(page.geometry(), page.content(), page.edits())
        .encode()
        .map_err(encode_error)?;
    prefix.push(b'\n');
    let mut suffix = vec![b'\n'];
    suffix.extend(
        suffix_operations(page.geometry(), page.content(), page.edits(), &image_names)
            .encode()
            .map_err(encode_error)?,
    );
    suffix.push(b'\n');

    let original = existing_contents(doc, page_id)?;
    let separator = (original.len() > 1)
        .then(|| doc.add_object(Stream::new(Dictionary::new(), b"\n".to_vec())));

    let mut contents = Vec::with_capacity(original.len() * 2 + 2);
    contents.push(Object::Reference(
        doc.add_object(Stream::new(Dictionary::new(), prefix)),
    ));
    for (i, item) in original.into_iter().enumerate() {
        if let Some(id) = separator.filter(|_| i > 0) {
            contents.push(Object::Reference(id));
        }
        contents.push(item);
    }
    contents.push(Object::Reference(
        doc.add_object(Stream::new(Dictionary::new(), suffix)),
    ));

    let page_dict = doc
        .get_dictionary_mut(page_id)
        .map_err(|e| PdfError::Serialization(format!("page {}: {}", page.index(), e)))?;
    page_dict.set("Contents", Object::Array(contents));

    trace!("Rewrote contents of page {}", page.index());
    Ok(())
}

/// References to the page's current content streams, with direct streams
/// moved into their own objects.
fn existing_contents(doc: &mut lopdf::Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let current = doc
        .get_dictionary(page_id)
        .map_err(|e| PdfError::Serialization(e.to_string()))?
        .get(b"Contents")
        .ok()
        .cloned();

    let contents = match current {
        None | Some(Object::Null) => Vec::new(),
        Some(Object::Reference(id)) => match doc.get_object(id) {
            Ok(Object::Array(items)) => items.clone(),
            _ => vec![Object::Reference(id)],
        },
        Some(Object::Array(items)) => items,
        Some(Object::Stream(stream)) => vec![Object::Reference(doc.add_object(stream))],
        Some(other) => {
            return Err(PdfError::Serialization(format!(
                "unexpected /Contents type {}",
                other.enum_variant()
            )));
        }
    };
    Ok(contents)
}

/// Embed the page's images and register them in its XObject resources.
fn register_images(
    doc: &mut lopdf::Document,
    page: &Page,
    embedded: &mut HashMap<ImageId, ObjectId>,
) -> Result<HashMap<ImageId, Vec<u8>>> {
    let mut names = HashMap::new();
    let placements: Vec<_> = page
        .edits()
        .iter()
        .filter_map(|edit| match edit {
            crate::edit::PageEdit::Place(p) => Some(p),
            _ => None,
        })
        .collect();
    if placements.is_empty() {
        return Ok(names);
    }

    let mut resources = effective_resources(doc, page.object_id());
    let mut xobjects = match resources.get(b"XObject") {
        Ok(obj) => match doc.dereference(obj) {
            Ok((_, Object::Dictionary(dict))) => dict.clone(),
            _ => Dictionary::new(),
        },
        Err(_) => Dictionary::new(),
    };

    for placement in placements {
        let image_id = placement.image.id();
        if names.contains_key(&image_id) {
            continue;
        }
        let object_id = match embedded.get(&image_id) {
            Some(id) => *id,
            None => {
                let id = embed_image(doc, &placement.image);
                embedded.insert(image_id, id);
                id
            }
        };

        let mut counter = names.len();
        let name = loop {
            let candidate = format!("LsImg{}", counter).into_bytes();
            if !xobjects.has(&candidate) {
                break candidate;
            }
            counter += 1;
        };
        xobjects.set(name.clone(), Object::Reference(object_id));
        names.insert(image_id, name);
    }

    resources.set("XObject", Object::Dictionary(xobjects));
    let page_dict = doc
        .get_dictionary_mut(page.object_id())
        .map_err(|e| PdfError::Serialization(e.to_string()))?;
    page_dict.set("Resources", Object::Dictionary(resources));

    Ok(names)
}

/// The page's resource dictionary, own or inherited, as an owned copy.
fn effective_resources(doc: &lopdf::Document, page_id: ObjectId) -> Dictionary {
    let mut node_id = page_id;
    for _ in 0..MAX_INHERITANCE_DEPTH {
        let Ok(dict) = doc.get_dictionary(node_id) else {
            break;
        };
        if let Ok(resources) = dict.get(b"Resources") {
            if let Ok((_, Object::Dictionary(res_dict))) = doc.dereference(resources) {
                return res_dict.clone();
            }
        }
        match dict.get(b"Parent") {
            Ok(Object::Reference(parent_id)) => node_id = *parent_id,
            _ => break,
        }
    }
    Dictionary::new()
}

/// Add an image XObject (and its soft mask) to the document.
fn embed_image(doc: &mut lopdf::Document, image: &ReplacementImage) -> ObjectId {
    let width = image.width() as i64;
    let height = image.height() as i64;

    match image.encoding() {
        ImageEncoding::Jpeg { data, components } => {
            let color_space = if components == 1 { "DeviceGray" } else { "DeviceRGB" };
            let dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => color_space,
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            };
            doc.add_object(Stream::new(dict, data.to_vec()).with_compression(false))
        }
        ImageEncoding::Raw { rgb, alpha } => {
            let mut dict = dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
            };
            if let Some(alpha) = alpha {
                let mask = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => width,
                    "Height" => height,
                    "ColorSpace" => "DeviceGray",
                    "BitsPerComponent" => 8,
                };
                let mask_id = doc.add_object(Stream::new(mask, alpha.to_vec()));
                dict.set("SMask", Object::Reference(mask_id));
            }
            doc.add_object(Stream::new(dict, rgb.to_vec()))
        }
    }
}
