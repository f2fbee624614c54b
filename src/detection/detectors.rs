use tracing::debug;

use super::types::{BoundingBox, Detection, DetectionFilter, DetectionOutcome, Frame};
use super::Detector;

/// Placeholder: no model is loaded, so nothing is ever detected.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullDetector;

impl Detector for NullDetector {
    fn name(&self) -> &'static str {
        "none"
    }

    fn detect(&self, _frame: &Frame) -> anyhow::Result<DetectionOutcome> {
        Ok(DetectionOutcome::none())
    }
}

/// Evaluates the predictions the client's in-browser model attached to the frame.
#[derive(Debug, Clone)]
pub struct ReportedDetector {
    filter: DetectionFilter,
}

impl ReportedDetector {
    pub fn new(filter: DetectionFilter) -> Self {
        Self { filter }
    }
}

impl Detector for ReportedDetector {
    fn name(&self) -> &'static str {
        "client"
    }

    fn filter(&self) -> Option<&DetectionFilter> {
        Some(&self.filter)
    }

    fn detect(&self, frame: &Frame) -> anyhow::Result<DetectionOutcome> {
        let kept = self.filter.apply(&frame.detections);
        debug!(
            reported = frame.detections.len(),
            kept = kept.len(),
            "evaluated reported detections"
        );
        Ok(DetectionOutcome::from_detections(kept))
    }
}

/// Always sees exactly one can filling the frame. For demos and local testing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedDetector;

impl Detector for SimulatedDetector {
    fn name(&self) -> &'static str {
        "simulate"
    }

    fn detect(&self, frame: &Frame) -> anyhow::Result<DetectionOutcome> {
        let detection = Detection {
            bbox: BoundingBox {
                x: 0.0,
                y: 0.0,
                width: frame.width.unwrap_or(0) as f32,
                height: frame.height.unwrap_or(0) as f32,
            },
            label: "can".into(),
            confidence: 1.0,
        };
        Ok(DetectionOutcome::from_detections(vec![detection]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame_with(detections: Vec<(&str, f32)>) -> Frame {
        Frame {
            width: Some(640),
            height: Some(480),
            detections: detections
                .into_iter()
                .map(|(label, confidence)| Detection {
                    bbox: BoundingBox {
                        x: 0.0,
                        y: 0.0,
                        width: 10.0,
                        height: 10.0,
                    },
                    label: label.into(),
                    confidence,
                })
                .collect(),
            ..Frame::default()
        }
    }

    #[test]
    fn null_detector_never_detects() {
        let outcome = NullDetector
            .detect(&frame_with(vec![("can", 0.99)]))
            .unwrap();
        assert_eq!(outcome, DetectionOutcome::none());
    }

    #[test]
    fn reported_detector_requires_relevant_confident_detection() {
        let detector =
            ReportedDetector::new(DetectionFilter::new(&["can".into(), "bottle".into()], 0.5));

        let outcome = detector
            .detect(&frame_with(vec![("person", 0.9), ("can", 0.2)]))
            .unwrap();
        assert!(!outcome.can_detected);
        assert!(outcome.detections.is_empty());

        let outcome = detector
            .detect(&frame_with(vec![("cup", 0.9), ("bottle", 0.7), ("can", 0.8)]))
            .unwrap();
        assert!(outcome.can_detected);
        let labels: Vec<&str> = outcome.detections.iter().map(|d| d.label.as_str()).collect();
        assert_eq!(labels, vec!["can", "bottle"]);
    }

    #[test]
    fn simulated_detector_covers_frame() {
        let outcome = SimulatedDetector.detect(&frame_with(vec![])).unwrap();
        assert!(outcome.can_detected);
        assert_eq!(outcome.detections.len(), 1);
        assert_eq!(outcome.detections[0].bbox.width, 640.0);
        assert_eq!(outcome.detections[0].confidence, 1.0);
    }
}
