use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    detection::Frame,
    error::AppError,
    extract::{JsonBody, Path, Query},
    ledger::{
        dto::{DetectCanResponse, Pagination, RedeemResponse, TransactionPage, UserStats},
        services::record_detection,
    },
    state::AppState,
};

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/api/detect_can", post(detect_can))
        .route("/api/redeem_promotion/:id", post(redeem_promotion))
        .route("/api/user_stats", get(user_stats))
        .route("/api/transactions", get(list_transactions))
}

#[instrument(skip(state, frame))]
pub async fn detect_can(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    JsonBody(frame): JsonBody<Frame>,
) -> Result<Json<DetectCanResponse>, AppError> {
    let result = record_detection(&state, user_id, &frame).await?;
    Ok(Json(DetectCanResponse {
        success: true,
        can_detected: result.outcome.can_detected,
        detections: result.outcome.detections,
        points_awarded: result.points_awarded,
        points: result.balance.points,
        cans_detected: result.balance.cans_detected,
    }))
}

#[instrument(skip(state))]
pub async fn redeem_promotion(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<RedeemResponse>, AppError> {
    let promotion_id = Uuid::parse_str(&id).map_err(|_| {
        warn!(%id, "malformed promotion id");
        AppError::PromotionUnavailable
    })?;

    let redemption = match state.store.redeem(user_id, promotion_id).await {
        Ok(r) => r,
        Err(e) => {
            warn!(%user_id, %promotion_id, error = %e, "redemption rejected");
            return Err(e);
        }
    };

    info!(
        %user_id,
        %promotion_id,
        cost = redemption.promotion.points_required,
        points = redemption.points,
        "promotion redeemed"
    );
    Ok(Json(RedeemResponse {
        success: true,
        points: redemption.points,
        message: format!("You redeemed {}!", redemption.promotion.name),
        transaction: redemption.transaction,
    }))
}

#[instrument(skip(state))]
pub async fn user_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<UserStats>, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    Ok(Json(UserStats {
        points: user.points,
        cans_detected: user.cans_detected,
        name: user.name,
    }))
}

#[instrument(skip(state))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<TransactionPage>, AppError> {
    let (limit, offset) = p.clamped();
    let transactions = state.store.list_transactions(user_id, limit, offset).await?;
    Ok(Json(TransactionPage {
        transactions,
        limit,
        offset,
    }))
}
