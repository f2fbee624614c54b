use serde::{Deserialize, Serialize};

use crate::detection::Detection;
use crate::ledger::repo_types::Transaction;

#[derive(Debug, Serialize)]
pub struct DetectCanResponse {
    pub success: bool,
    pub can_detected: bool,
    pub detections: Vec<Detection>,
    pub points_awarded: i64,
    pub points: i64,
    pub cans_detected: i64,
}

#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    pub success: bool,
    pub points: i64,
    pub message: String,
    pub transaction: Transaction,
}

#[derive(Debug, Serialize)]
pub struct UserStats {
    pub points: i64,
    pub cans_detected: i64,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

pub const MAX_PAGE_SIZE: i64 = 100;

impl Pagination {
    /// Clamps to `1..=MAX_PAGE_SIZE` and a non-negative offset.
    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, MAX_PAGE_SIZE), self.offset.max(0))
    }
}

#[derive(Debug, Serialize)]
pub struct TransactionPage {
    pub transactions: Vec<Transaction>,
    pub limit: i64,
    pub offset: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_defaults_and_clamping() {
        let p: Pagination = serde_json::from_str("{}").unwrap();
        assert_eq!(p.clamped(), (20, 0));

        let p = Pagination {
            limit: 1000,
            offset: -5,
        };
        assert_eq!(p.clamped(), (MAX_PAGE_SIZE, 0));

        let p = Pagination { limit: 0, offset: 7 };
        assert_eq!(p.clamped(), (1, 7));
    }
}
