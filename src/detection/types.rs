use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Axis-aligned box in frame pixel coordinates, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bbox: BoundingBox,
    #[serde(alias = "class")]
    pub label: String,
    #[serde(alias = "score")]
    pub confidence: f32,
}

/// One captured video frame as submitted by the client.
///
/// `image` carries the raw encoded frame when the client uploads it;
/// `detections` carries whatever its in-browser model predicted. Every field
/// is optional so that `{}` is a valid frame.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Frame {
    #[serde(default)]
    pub image: Option<serde_bytes::ByteBuf>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub detections: Vec<Detection>,
}

impl Frame {
    pub fn validate(&self) -> Result<(), AppError> {
        for d in &self.detections {
            if !d.confidence.is_finite() || !(0.0..=1.0).contains(&d.confidence) {
                return Err(AppError::Validation(format!(
                    "confidence for '{}' must be within [0, 1]",
                    d.label
                )));
            }
            let b = &d.bbox;
            let finite = [b.x, b.y, b.width, b.height].iter().all(|v| v.is_finite());
            if !finite || b.width < 0.0 || b.height < 0.0 {
                return Err(AppError::Validation(format!(
                    "bounding box for '{}' is invalid",
                    d.label
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionOutcome {
    pub can_detected: bool,
    pub detections: Vec<Detection>,
}

impl DetectionOutcome {
    pub fn none() -> Self {
        Self {
            can_detected: false,
            detections: Vec::new(),
        }
    }

    pub fn from_detections(detections: Vec<Detection>) -> Self {
        Self {
            can_detected: !detections.is_empty(),
            detections,
        }
    }
}

/// Keeps detections of relevant classes at or above the confidence threshold.
#[derive(Debug, Clone)]
pub struct DetectionFilter {
    classes: Vec<String>,
    threshold: f32,
}

impl DetectionFilter {
    pub fn new(classes: &[String], threshold: f32) -> Self {
        Self {
            classes: classes.iter().map(|c| c.to_lowercase()).collect(),
            threshold,
        }
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn accepts(&self, d: &Detection) -> bool {
        d.confidence >= self.threshold
            && self
                .classes
                .iter()
                .any(|c| c.eq_ignore_ascii_case(d.label.trim()))
    }

    /// Filters and orders by descending confidence.
    pub fn apply<'a, I>(&self, detections: I) -> Vec<Detection>
    where
        I: IntoIterator<Item = &'a Detection>,
    {
        let mut kept: Vec<Detection> = detections
            .into_iter()
            .filter(|d| self.accepts(d))
            .cloned()
            .collect();
        kept.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        kept
    }
}
