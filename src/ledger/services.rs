use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::{
    detection::{DetectionOutcome, Frame},
    error::AppError,
    ledger::repo_types::Balance,
    state::AppState,
};

/// What happened to one submitted frame.
#[derive(Debug)]
pub struct DetectionResult {
    pub outcome: DetectionOutcome,
    pub points_awarded: i64,
    pub balance: Balance,
}

/// Evaluates a frame and credits the user when a can is present.
///
/// A frame without a can leaves the ledger untouched and reports the current
/// balance.
#[instrument(skip(state, frame), fields(detector = state.detector.name()))]
pub async fn record_detection(
    state: &AppState,
    user_id: Uuid,
    frame: &Frame,
) -> Result<DetectionResult, AppError> {
    frame.validate()?;
    debug!(
        image_bytes = frame.image.as_ref().map(|b| b.len() as u64),
        reported = frame.detections.len(),
        "frame received"
    );

    let outcome = state.detector.detect(frame)?;

    if !outcome.can_detected {
        let user = state
            .store
            .find_user(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;
        return Ok(DetectionResult {
            outcome,
            points_awarded: 0,
            balance: Balance {
                points: user.points,
                cans_detected: user.cans_detected,
            },
        });
    }

    let amount = state.config.points_per_can;
    let balance = state.store.credit(user_id, amount).await?;
    info!(
        %user_id,
        amount,
        points = balance.points,
        confidence = outcome.detections.first().map(|d| d.confidence),
        "can credited"
    );

    Ok(DetectionResult {
        outcome,
        points_awarded: amount,
        balance,
    })
}
