use serde::{Deserialize, Serialize};

use crate::promotions::repo_types::Promotion;

#[derive(Debug, Deserialize)]
pub struct CreatePromotionRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub points_required: i64,
}

#[derive(Debug, Deserialize)]
pub struct SetActiveRequest {
    pub active: bool,
}

#[derive(Debug, Serialize)]
pub struct PromotionResponse {
    pub success: bool,
    pub promotion: Promotion,
}
