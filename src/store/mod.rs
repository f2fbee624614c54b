use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    auth::repo_types::{NewUser, User},
    error::AppError,
    ledger::repo_types::{Balance, Redemption, Transaction},
    promotions::repo_types::{NewPromotion, Promotion},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgStore;

/// Persistence for users, promotions and the points ledger.
///
/// Ledger mutations (`credit`, `redeem`) must apply the balance change and
/// append the matching transaction atomically. `redeem` must never leave a
/// balance below zero, even under concurrent calls for the same user.
#[async_trait]
pub trait Store: Send + Sync {
    /// Liveness check; `false` when the backing database does not answer.
    async fn ping(&self) -> bool;

    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn list_active_promotions(&self) -> Result<Vec<Promotion>, AppError>;
    async fn create_promotion(&self, promotion: NewPromotion) -> Result<Promotion, AppError>;
    async fn set_promotion_active(&self, id: Uuid, active: bool) -> Result<Promotion, AppError>;

    /// Adds `amount` points and one detected can, logging a `can_detected` entry.
    async fn credit(&self, user_id: Uuid, amount: i64) -> Result<Balance, AppError>;
    /// Debits the promotion cost if the balance covers it, logging a `promotion_redeemed` entry.
    async fn redeem(&self, user_id: Uuid, promotion_id: Uuid) -> Result<Redemption, AppError>;

    /// Newest first.
    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, AppError>;
}
