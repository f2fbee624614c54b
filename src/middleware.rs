use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::warn;

use crate::{error::AppError, state::AppState};

/// Runs the store liveness check before the handler; answers 503 when the
/// database is unreachable.
pub async fn require_database(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if !state.store.ping().await {
        warn!(uri = %req.uri(), "database unavailable, rejecting request");
        return AppError::DatabaseUnavailable.into_response();
    }
    next.run(req).await
}
