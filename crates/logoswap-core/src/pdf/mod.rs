//! PDF loading, content analysis, and serialization.

mod content;
mod document;
mod serializer;

pub use content::ContentProfile;
pub use document::{Document, Page};
pub use serializer::serialize;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
