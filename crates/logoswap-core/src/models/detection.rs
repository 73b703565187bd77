//! Detection records produced by an upstream logo detector.

use serde::{Deserialize, Serialize};

use crate::error::{LogoswapError, Result};
use crate::geometry::ReportingSpace;

/// One reported logo instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDetection")]
pub struct Detection {
    /// Zero-based page number.
    pub page_index: usize,

    /// Left edge of the box in the reporting space.
    pub x: f64,

    /// Top edge of the box, measured from the top of the visible page.
    pub y: f64,

    pub width: f64,

    pub height: f64,

    /// Reporting space override for this detection.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub space: Option<ReportingSpace>,
}

impl Detection {
    /// Create a detection in the caller's default reporting space.
    pub fn new(page_index: usize, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            page_index,
            x,
            y,
            width,
            height,
            space: None,
        }
    }

    /// Report this detection in a specific space.
    pub fn with_space(mut self, space: ReportingSpace) -> Self {
        self.space = Some(space);
        self
    }
}

/// Wire shape accepted for detections.
///
/// Upstream detectors send a one-based `page`; newer callers send a
/// zero-based `page_index`. Width and height may be left out when the
/// caller knows the replacement logo's size.
#[derive(Deserialize)]
struct RawDetection {
    page_index: Option<usize>,
    page: Option<usize>,
    x: f64,
    y: f64,
    width: Option<f64>,
    height: Option<f64>,
    #[serde(default)]
    space: Option<ReportingSpace>,
}

impl RawDetection {
    fn resolve(self, default_size: Option<(f64, f64)>) -> std::result::Result<Detection, String> {
        let page_index = match (self.page_index, self.page) {
            (Some(index), _) => index,
            (None, Some(0)) => return Err("`page` is one-based; got 0".to_string()),
            (None, Some(page)) => page - 1,
            (None, None) => return Err("missing `page_index` or `page`".to_string()),
        };
        let (width, height) = match (self.width, self.height, default_size) {
            (Some(width), Some(height), _) => (width, height),
            (width, height, Some((default_width, default_height))) => (
                width.unwrap_or(default_width),
                height.unwrap_or(default_height),
            ),
            (None, _, None) => return Err("missing `width`".to_string()),
            (_, None, None) => return Err("missing `height`".to_string()),
        };
        Ok(Detection {
            page_index,
            x: self.x,
            y: self.y,
            width,
            height,
            space: self.space,
        })
    }
}

impl TryFrom<RawDetection> for Detection {
    type Error = String;

    fn try_from(raw: RawDetection) -> std::result::Result<Self, Self::Error> {
        raw.resolve(None)
    }
}

/// Parse a JSON array of detections.
pub fn parse_detections(json: &str) -> Result<Vec<Detection>> {
    serde_json::from_str(json)
        .map_err(|e| LogoswapError::Config(format!("invalid detections JSON: {}", e)))
}

/// Parse detections, sizing boxes without `width` or `height` from
/// `default_size` (usually the replacement logo's pixel size).
pub fn parse_detections_with_default_size(
    json: &str,
    default_size: (f64, f64),
) -> Result<Vec<Detection>> {
    let raw: Vec<RawDetection> = serde_json::from_str(json)
        .map_err(|e| LogoswapError::Config(format!("invalid detections JSON: {}", e)))?;
    raw.into_iter()
        .enumerate()
        .map(|(i, raw)| {
            raw.resolve(Some(default_size))
                .map_err(|e| LogoswapError::Config(format!("invalid detection {}: {}", i, e)))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_zero_based() {
        let detections = parse_detections(
            r#"[{"page_index": 2, "x": 10, "y": 20.5, "width": 30, "height": 40}]"#,
        )
        .unwrap();
        assert_eq!(detections, vec![Detection::new(2, 10.0, 20.5, 30.0, 40.0)]);
    }

    #[test]
    fn test_parse_one_based_page() {
        let detections =
            parse_detections(r#"[{"page": 1, "x": 1, "y": 2, "width": 3, "height": 4}]"#).unwrap();
        assert_eq!(detections[0].page_index, 0);
    }

    #[test]
    fn test_parse_space_override() {
        let detections = parse_detections(
            r#"[{"page_index": 0, "x": 1, "y": 2, "width": 3, "height": 4,
                 "space": {"kind": "pixels", "width": 1240, "height": 1754}}]"#,
        )
        .unwrap();
        assert_eq!(
            detections[0].space,
            Some(ReportingSpace::Pixels { width: 1240.0, height: 1754.0 })
        );
    }

    #[test]
    fn test_parse_requires_size_without_default() {
        let err = parse_detections(r#"[{"page": 1, "x": 1, "y": 2, "height": 4}]"#).unwrap_err();
        assert!(err.to_string().contains("missing `width`"));
    }

    #[test]
    fn test_missing_size_falls_back_to_default() {
        let detections = parse_detections_with_default_size(
            r#"[{"page": 1, "x": 10, "y": 20},
                {"page": 2, "x": 10, "y": 20, "width": 50},
                {"page": 3, "x": 10, "y": 20, "width": 50, "height": 25}]"#,
            (120.0, 40.0),
        )
        .unwrap();
        assert_eq!(
            detections,
            vec![
                Detection::new(0, 10.0, 20.0, 120.0, 40.0),
                Detection::new(1, 10.0, 20.0, 50.0, 40.0),
                Detection::new(2, 10.0, 20.0, 50.0, 25.0),
            ]
        );
    }

    #[test]
    fn test_default_size_still_checks_page() {
        let err = parse_detections_with_default_size(
            r#"[{"page": 1, "x": 0, "y": 0}, {"x": 0, "y": 0}]"#,
            (10.0, 10.0),
        )
        .unwrap_err();
        assert!(err.to_string().contains("invalid detection 1"));
    }

    #[test]
    fn test_parse_rejects_missing_page() {
        assert!(parse_detections(r#"[{"x": 1, "y": 2, "width": 3, "height": 4}]"#).is_err());
        assert!(parse_detections(r#"[{"page": 0, "x": 1, "y": 2, "width": 3, "height": 4}]"#).is_err());
    }
}
