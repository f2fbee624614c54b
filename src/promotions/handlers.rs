use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{AdminAccess, AuthUser},
    error::AppError,
    extract::{JsonBody, Path},
    promotions::{
        dto::{CreatePromotionRequest, PromotionResponse, SetActiveRequest},
        repo_types::{NewPromotion, Promotion},
    },
    state::AppState,
};

pub fn public_routes() -> Router<AppState> {
    Router::new().route("/api/promotions", get(list_promotions))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/create_promotion", post(create_promotion))
        .route("/admin/promotions/:id/active", post(set_promotion_active))
}

/// Trimmed, validated promotion fields.
pub(crate) fn validate_new_promotion(
    req: CreatePromotionRequest,
) -> Result<NewPromotion, AppError> {
    let name = req.name.trim().to_string();
    if name.is_empty() {
        return Err(AppError::Validation("promotion name is required".into()));
    }
    if req.points_required <= 0 {
        return Err(AppError::Validation(
            "points_required must be positive".into(),
        ));
    }
    Ok(NewPromotion {
        name,
        description: req.description.trim().to_string(),
        points_required: req.points_required,
    })
}

#[instrument(skip(state))]
pub async fn list_promotions(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
) -> Result<Json<Vec<Promotion>>, AppError> {
    Ok(Json(state.store.list_active_promotions().await?))
}

#[instrument(skip(state, payload))]
pub async fn create_promotion(
    State(state): State<AppState>,
    _admin: AdminAccess,
    JsonBody(payload): JsonBody<CreatePromotionRequest>,
) -> Result<Json<PromotionResponse>, AppError> {
    let new = validate_new_promotion(payload).map_err(|e| {
        warn!(error = %e, "invalid promotion");
        e
    })?;
    let promotion = state.store.create_promotion(new).await?;
    info!(promotion_id = %promotion.id, name = %promotion.name, cost = promotion.points_required, "promotion created");
    Ok(Json(PromotionResponse {
        success: true,
        promotion,
    }))
}

#[instrument(skip(state))]
pub async fn set_promotion_active(
    State(state): State<AppState>,
    _admin: AdminAccess,
    Path(id): Path<Uuid>,
    JsonBody(payload): JsonBody<SetActiveRequest>,
) -> Result<Json<PromotionResponse>, AppError> {
    let promotion = state.store.set_promotion_active(id, payload.active).await?;
    info!(promotion_id = %promotion.id, active = promotion.active, "promotion toggled");
    Ok(Json(PromotionResponse {
        success: true,
        promotion,
    }))
}
