use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::promotions::repo_types::Promotion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "transaction_kind", rename_all = "snake_case")]
pub enum TransactionKind {
    CanDetected,
    PromotionRedeemed,
}

/// Immutable ledger entry: one point balance change.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub points: i64, // signed delta
    pub description: String,
    pub promotion_id: Option<Uuid>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Balance after a credit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Balance {
    pub points: i64,
    pub cans_detected: i64,
}

/// Result of a successful redemption.
#[derive(Debug, Clone, Serialize)]
pub struct Redemption {
    pub points: i64,
    pub promotion: Promotion,
    pub transaction: Transaction,
}

pub const CAN_DETECTED_DESCRIPTION: &str = "Aluminum can detected";

pub fn redemption_description(promotion_name: &str) -> String {
    format!("Redeemed: {promotion_name}")
}
