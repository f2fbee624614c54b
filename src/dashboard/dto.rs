use serde::Serialize;

use crate::{
    auth::PublicUser, ledger::repo_types::Transaction, promotions::repo_types::Promotion,
};

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: PublicUser,
    pub promotions: Vec<Promotion>,
    pub history: Vec<Transaction>,
}

#[derive(Debug, Serialize)]
pub struct DetectorInfo {
    pub name: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classes: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_threshold: Option<f32>,
    pub points_per_can: i64,
}

#[derive(Debug, Serialize)]
pub struct DetectorView {
    pub user: PublicUser,
    pub detector: DetectorInfo,
}
