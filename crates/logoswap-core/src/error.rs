//! Error types for the logoswap-core library.

use thiserror::Error;

/// Main error type for the logoswap library.
#[derive(Error, Debug)]
pub enum LogoswapError {
    /// PDF loading, content or serialization error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// A detection could not be mapped to a usable region.
    #[error("region error: {0}")]
    Region(#[from] RegionError),

    /// Replacement image error.
    #[error("image error: {0}")]
    Image(#[from] ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl LogoswapError {
    /// Stable machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Pdf(e) => e.code(),
            Self::Region(e) => e.code(),
            Self::Image(e) => e.code(),
            Self::Io(_) => "io_error",
            Self::Config(_) => "config_error",
        }
    }

    /// Whether the error aborts the whole document.
    ///
    /// Region and content errors are recovered per detection.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::Region(_) | Self::Pdf(PdfError::UnsupportedContent(_))
        )
    }
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// The input bytes do not parse as a PDF document.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The PDF is encrypted with a non-empty password.
    #[error("PDF is encrypted")]
    Encrypted,

    /// A page's content stream cannot be safely region-erased.
    #[error("unsupported content: {0}")]
    UnsupportedContent(String),

    /// Output assembly failed.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl PdfError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Malformed(_) | Self::Encrypted => "malformed_document",
            Self::UnsupportedContent(_) => "unsupported_content",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

/// Errors for detections whose region cannot be used.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegionError {
    /// Detection targets a page that does not exist.
    #[error("page index {page_index} out of range (document has {page_count} pages)")]
    PageOutOfRange { page_index: usize, page_count: usize },

    /// A coordinate or reference dimension is NaN or infinite.
    #[error("non-finite coordinate in detection box")]
    NonFinite,

    /// The reported box has non-positive width or height.
    #[error("box has non-positive size {width}x{height}")]
    EmptyBox { width: f64, height: f64 },

    /// The reporting space has unusable reference dimensions.
    #[error("invalid reporting space: {0}")]
    InvalidReference(String),

    /// The region collapsed after clamping to the page.
    #[error("region is degenerate after clamping ({width}x{height})")]
    Degenerate { width: f64, height: f64 },

    /// The region overlaps one already replaced and the overlap policy keeps the first.
    #[error("region overlaps detection {other}")]
    Overlapping { other: usize },
}

impl RegionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::PageOutOfRange { .. } => "page_out_of_range",
            Self::Overlapping { .. } => "overlapping_region",
            _ => "invalid_region",
        }
    }
}

/// Errors related to the replacement image.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The image bytes could not be decoded.
    #[error("failed to decode replacement image: {0}")]
    Decode(String),

    /// The image decoded to zero pixels.
    #[error("replacement image is empty")]
    Empty,
}

impl ImageError {
    pub fn code(&self) -> &'static str {
        "decode_error"
    }
}

impl From<image::ImageError> for ImageError {
    fn from(e: image::ImageError) -> Self {
        Self::Decode(e.to_string())
    }
}

/// Result type for the logoswap library.
pub type Result<T> = std::result::Result<T, LogoswapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = LogoswapError::from(PdfError::Malformed("bad header".to_string()));
        assert_eq!(err.code(), "malformed_document");
        assert!(err.is_fatal());

        let err = LogoswapError::from(RegionError::Degenerate { width: 0.0, height: 3.0 });
        assert_eq!(err.code(), "invalid_region");
        assert!(!err.is_fatal());

        let err = LogoswapError::from(ImageError::Empty);
        assert_eq!(err.code(), "decode_error");
        assert!(err.is_fatal());
    }

    #[test]
    fn test_region_codes() {
        let err = RegionError::PageOutOfRange { page_index: 4, page_count: 2 };
        assert_eq!(err.code(), "page_out_of_range");
        assert_eq!(
            err.to_string(),
            "page index 4 out of range (document has 2 pages)"
        );
        assert_eq!(RegionError::Overlapping { other: 0 }.code(), "overlapping_region");
    }
}
