use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use crate::{
    auth::AuthUser,
    dashboard::dto::{DashboardView, DetectorInfo, DetectorView},
    error::AppError,
    state::AppState,
};

/// Number of transactions shown on the dashboard.
pub const HISTORY_LEN: i64 = 10;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        .route("/detector", get(detector))
}

#[instrument(skip(state))]
pub async fn dashboard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardView>, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let promotions = state.store.list_active_promotions().await?;
    let history = state
        .store
        .list_transactions(user_id, HISTORY_LEN, 0)
        .await?;

    Ok(Json(DashboardView {
        user: user.into(),
        promotions,
        history,
    }))
}

#[instrument(skip(state))]
pub async fn detector(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DetectorView>, AppError> {
    let user = state
        .store
        .find_user(user_id)
        .await?
        .ok_or(AppError::UserNotFound)?;
    let filter = state.detector.filter();

    Ok(Json(DetectorView {
        user: user.into(),
        detector: DetectorInfo {
            name: state.detector.name(),
            classes: filter.map(|f| f.classes().to_vec()),
            confidence_threshold: filter.map(|f| f.threshold()),
            points_per_can: state.config.points_per_can,
        },
    }))
}
