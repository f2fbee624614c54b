use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod repo_types;
pub mod services;

pub use dto::PublicUser;
pub use services::{AdminAccess, AuthUser};

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
