//! Frame analysis models.
//!
//! A [`FrameAnalysis`] is the merged output of the vision providers for a
//! single extracted frame. It is persisted as-is, so field names follow the
//! snake_case storage format.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Structured analysis of one video frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FrameAnalysis {
    /// Free-text scene description from the captioning model
    #[serde(default)]
    pub caption: String,

    /// Detected labels with confidence
    #[serde(default)]
    pub labels: Vec<Label>,

    /// OCR text lines found in the frame
    #[serde(default)]
    pub text_ocr: Vec<String>,

    /// Detected faces
    #[serde(default)]
    pub faces: Vec<FaceDetection>,

    /// Dominant colors
    #[serde(default)]
    pub colors: Vec<ColorInfo>,

    /// Overall analysis confidence (0.0 - 1.0)
    #[serde(default)]
    pub confidence: f64,

    /// When the analysis was produced
    pub timestamp: DateTime<Utc>,
}

impl Default for FrameAnalysis {
    fn default() -> Self {
        Self {
            caption: String::new(),
            labels: Vec::new(),
            text_ocr: Vec::new(),
            faces: Vec::new(),
            colors: Vec::new(),
            confidence: 0.0,
            timestamp: Utc::now(),
        }
    }
}

impl FrameAnalysis {
    /// Create an analysis holding only a caption.
    pub fn with_caption(caption: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            ..Self::default()
        }
    }

    /// Number of faces detected in the frame.
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Highest label confidence, or 0 when there are no labels.
    pub fn max_label_confidence(&self) -> f64 {
        self.labels
            .iter()
            .map(|l| l.confidence)
            .fold(0.0, f64::max)
    }

    /// Caption and label names joined into one lowercase text blob.
    pub fn searchable_text(&self) -> String {
        let mut text = self.caption.to_lowercase();
        for label in &self.labels {
            text.push(' ');
            text.push_str(&label.name.to_lowercase());
        }
        text
    }

    /// Whether no provider contributed anything.
    pub fn is_empty(&self) -> bool {
        self.caption.is_empty()
            && self.labels.is_empty()
            && self.text_ocr.is_empty()
            && self.faces.is_empty()
            && self.colors.is_empty()
    }
}

/// Detected label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Label {
    pub name: String,
    pub confidence: f64,
}

impl Label {
    pub fn new(name: impl Into<String>, confidence: f64) -> Self {
        Self {
            name: name.into(),
            confidence,
        }
    }
}

/// A detected face and its bounding box in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceDetection {
    pub bounding_box: BoundingBox,
    pub confidence: f64,
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Dominant color entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ColorInfo {
    /// CSS color, e.g. `rgb(12,34,56)`
    pub color: String,
    pub score: f64,
    pub pixel_ratio: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_searchable_text_lowercases_caption_and_labels() {
        let analysis = FrameAnalysis {
            caption: "A Red Car".to_string(),
            labels: vec![Label::new("Explosion", 0.9)],
            ..FrameAnalysis::default()
        };
        assert_eq!(analysis.searchable_text(), "a red car explosion");
    }

    #[test]
    fn test_max_label_confidence() {
        let analysis = FrameAnalysis {
            labels: vec![Label::new("car", 0.4), Label::new("sky", 0.8)],
            ..FrameAnalysis::default()
        };
        assert!((analysis.max_label_confidence() - 0.8).abs() < 1e-9);
        assert_eq!(FrameAnalysis::default().max_label_confidence(), 0.0);
    }

    #[test]
    fn test_deserialize_with_missing_sections() {
        let json = r#"{"caption":"night street","timestamp":"2024-01-01T00:00:00Z"}"#;
        let analysis: FrameAnalysis = serde_json::from_str(json).unwrap();
        assert_eq!(analysis.caption, "night street");
        assert!(analysis.faces.is_empty());
        assert!(!analysis.is_empty());
    }
}
