//! Replacement images and the per-detection image map.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::{DynamicImage, GenericImageView, ImageFormat};
use tracing::debug;

use crate::error::ImageError;

static NEXT_IMAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a decoded replacement image, used to embed it once per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageId(u64);

/// Pixel payload in the form it will be embedded.
#[derive(Debug, Clone, Copy)]
pub enum ImageEncoding<'a> {
    /// Baseline JPEG passed through untouched.
    Jpeg { data: &'a [u8], components: u8 },
    /// 8-bit RGB samples plus optional 8-bit alpha.
    Raw { rgb: &'a [u8], alpha: Option<&'a [u8]> },
}

/// A decoded replacement logo.
#[derive(Debug)]
pub struct ReplacementImage {
    id: ImageId,
    width: u32,
    height: u32,
    rgb: Vec<u8>,
    alpha: Option<Vec<u8>>,
    jpeg: Option<(Vec<u8>, u8)>,
}

impl ReplacementImage {
    /// Decode encoded image bytes (PNG, JPEG, or anything `image` reads).
    pub fn decode(bytes: &[u8]) -> Result<Self, ImageError> {
        let format = image::guess_format(bytes)?;
        let decoded = image::load_from_memory_with_format(bytes, format)?;
        let mut image = Self::from_image(&decoded)?;

        // gray and RGB JPEGs embed as-is; CMYK and others go through raw samples
        if format == ImageFormat::Jpeg {
            if let Some(components @ (1 | 3)) = jpeg_components(bytes) {
                image.jpeg = Some((bytes.to_vec(), components));
            }
        }

        debug!(
            "Decoded replacement image: {}x{} {:?}, alpha={}",
            image.width,
            image.height,
            format,
            image.has_alpha()
        );
        Ok(image)
    }

    /// Decode a base64 payload, with or without a `data:image/...;base64,` prefix.
    pub fn from_base64(encoded: &str) -> Result<Self, ImageError> {
        let trimmed = encoded.trim();
        let payload = if trimmed.starts_with("data:") {
            trimmed
                .split_once(',')
                .map(|(_, data)| data)
                .ok_or_else(|| ImageError::Decode("data URL without payload".to_string()))?
        } else {
            trimmed
        };
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| ImageError::Decode(format!("invalid base64: {}", e)))?;
        Self::decode(&bytes)
    }

    /// Build from an already decoded image.
    pub fn from_image(image: &DynamicImage) -> Result<Self, ImageError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ImageError::Empty);
        }

        let rgba = image.to_rgba8();
        let pixel_count = (width * height) as usize;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        let mut alpha = Vec::with_capacity(pixel_count);
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
        }

        // a fully opaque alpha channel carries no information
        let alpha = if image.color().has_alpha() && alpha.iter().any(|&a| a < u8::MAX) {
            Some(alpha)
        } else {
            None
        };

        Ok(Self {
            id: ImageId(NEXT_IMAGE_ID.fetch_add(1, Ordering::Relaxed)),
            width,
            height,
            rgb,
            alpha,
            jpeg: None,
        })
    }

    pub fn id(&self) -> ImageId {
        self.id
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether any pixel is not fully opaque.
    pub fn has_alpha(&self) -> bool {
        self.alpha.is_some()
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.width as f64 / self.height as f64
    }

    /// Payload to embed in the document.
    pub fn encoding(&self) -> ImageEncoding<'_> {
        match &self.jpeg {
            Some((data, components)) => ImageEncoding::Jpeg {
                data,
                components: *components,
            },
            None => ImageEncoding::Raw {
                rgb: &self.rgb,
                alpha: self.alpha.as_deref(),
            },
        }
    }
}

/// Number of color components declared in a JPEG frame header.
fn jpeg_components(bytes: &[u8]) -> Option<u8> {
    if bytes.get(..2)? != [0xFF, 0xD8] {
        return None;
    }
    let mut i = 2;
    while i + 4 <= bytes.len() {
        if bytes[i] != 0xFF {
            return None;
        }
        let marker = bytes[i + 1];
        if marker == 0xFF {
            i += 1;
            continue;
        }
        let is_frame = (0xC0..=0xCF).contains(&marker) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            return bytes.get(i + 9).copied();
        }
        let length = u16::from_be_bytes([bytes[i + 2], bytes[i + 3]]) as usize;
        i += 2 + length;
    }
    None
}

/// Images to place, one shared default plus optional per-detection overrides.
#[derive(Debug, Clone)]
pub struct ReplacementSet {
    default: Arc<ReplacementImage>,
    overrides: HashMap<usize, Arc<ReplacementImage>>,
}

impl ReplacementSet {
    /// Use one image for every detection.
    pub fn single(image: ReplacementImage) -> Self {
        Self {
            default: Arc::new(image),
            overrides: HashMap::new(),
        }
    }

    /// Use a specific image for the detection at `detection_index`.
    pub fn with_override(mut self, detection_index: usize, image: Arc<ReplacementImage>) -> Self {
        self.overrides.insert(detection_index, image);
        self
    }

    /// Image for a detection.
    pub fn image_for(&self, detection_index: usize) -> &Arc<ReplacementImage> {
        self.overrides.get(&detection_index).unwrap_or(&self.default)
    }

    pub fn default_image(&self) -> &Arc<ReplacementImage> {
        &self.default
    }
}

impl From<ReplacementImage> for ReplacementSet {
    fn from(image: ReplacementImage) -> Self {
        Self::single(image)
    }
}
