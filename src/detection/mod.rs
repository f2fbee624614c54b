//! Can detection.
//!
//! A `Detector` decides whether a frame shows a recyclable can. Which
//! implementation runs is chosen at startup from `DetectionConfig`; no model
//! inference happens server side.

mod detectors;
pub mod types;

use std::sync::Arc;

use detectors::{NullDetector, ReportedDetector, SimulatedDetector};
pub use types::{Detection, DetectionFilter, DetectionOutcome, Frame};

use crate::config::{DetectionConfig, DetectorKind};

pub trait Detector: Send + Sync {
    fn name(&self) -> &'static str;

    /// Class/threshold filter applied before reporting, if the detector uses one.
    fn filter(&self) -> Option<&DetectionFilter> {
        None
    }

    fn detect(&self, frame: &Frame) -> anyhow::Result<DetectionOutcome>;
}

pub fn build_detector(cfg: &DetectionConfig) -> Arc<dyn Detector> {
    match cfg.mode {
        DetectorKind::None => Arc::new(NullDetector),
        DetectorKind::Client => Arc::new(ReportedDetector::new(DetectionFilter::new(
            &cfg.classes,
            cfg.confidence_threshold,
        ))),
        DetectorKind::Simulate => Arc::new(SimulatedDetector),
    }
}
