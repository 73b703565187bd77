//! Shared fixtures: in-memory PDFs and logo images.

#![allow(dead_code)]

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use lopdf::content::Content;
use lopdf::{dictionary, Dictionary, Object, Stream};

/// One page of a fixture document.
pub struct PageSpec {
    pub media_box: [i64; 4],
    pub rotate: Option<i64>,
    pub content: Vec<u8>,
}

impl PageSpec {
    pub fn letter(content: &[u8]) -> Self {
        Self {
            media_box: [0, 0, 612, 792],
            rotate: None,
            content: content.to_vec(),
        }
    }

    pub fn rotated(mut self, degrees: i64) -> Self {
        self.rotate = Some(degrees);
        self
    }
}

/// A blue rectangle where a logo would sit, plus some text-like strokes.
pub const LOGO_CONTENT: &[u8] = b"q 0 0 1 rg 50 700 100 50 re f Q 0 0 0 RG 50 600 m 500 600 l S";

pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for spec in pages {
        let content_id = doc.add_object(Stream::new(Dictionary::new(), spec.content.clone()));
        let mut page = dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "MediaBox" => spec.media_box.iter().map(|v| Object::Integer(*v)).collect::<Vec<_>>(),
        };
        if let Some(degrees) = spec.rotate {
            page.set("Rotate", degrees);
        }
        kids.push(Object::Reference(doc.add_object(page)));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut data = Vec::new();
    doc.save_to(&mut data).unwrap();
    data
}

pub fn letter_pdf(page_count: usize) -> Vec<u8> {
    let pages: Vec<_> = (0..page_count).map(|_| PageSpec::letter(LOGO_CONTENT)).collect();
    build_pdf(&pages)
}

fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
    let mut data = Cursor::new(Vec::new());
    image.write_to(&mut data, format).unwrap();
    data.into_inner()
}

/// Opaque red PNG.
pub fn png_logo(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([220, 30, 30]))),
        ImageFormat::Png,
    )
}

/// Half-transparent green PNG.
pub fn translucent_png_logo(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([0, 200, 0, 128]))),
        ImageFormat::Png,
    )
}

pub fn jpeg_logo(width: u32, height: u32) -> Vec<u8> {
    encode(
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([10, 90, 200]))),
        ImageFormat::Jpeg,
    )
}

/// Operators of a page's combined content, one-based page number.
pub fn page_operators(pdf: &[u8], page_number: u32) -> Vec<String> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    let page_id = *doc.get_pages().get(&page_number).unwrap();
    let content = Content::decode(&doc.get_page_content(page_id).unwrap()).unwrap();
    content.operations.into_iter().map(|op| op.operator).collect()
}

/// Image XObject streams in the document, soft masks excluded.
pub fn image_streams(pdf: &[u8]) -> Vec<lopdf::Stream> {
    let doc = lopdf::Document::load_mem(pdf).unwrap();
    let mask_ids: Vec<_> = doc
        .objects
        .values()
        .filter_map(|obj| obj.as_stream().ok())
        .filter_map(|s| s.dict.get(b"SMask").ok()?.as_reference().ok())
        .collect();
    doc.objects
        .iter()
        .filter(|(id, _)| !mask_ids.contains(id))
        .filter_map(|(_, obj)| obj.as_stream().ok())
        .filter(|s| {
            s.dict
                .get(b"Subtype")
                .and_then(|v| v.as_name())
                .is_ok_and(|name| name == b"Image")
        })
        .cloned()
        .collect()
}
