use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use super::Store;
use crate::{
    auth::repo_types::{NewUser, User},
    error::AppError,
    ledger::repo_types::{
        redemption_description, Balance, Redemption, Transaction, TransactionKind,
        CAN_DETECTED_DESCRIPTION,
    },
    promotions::repo_types::{NewPromotion, Promotion},
};

const USER_COLUMNS: &str = "id, email, password_hash, name, points, cans_detected, created_at";
const PROMOTION_COLUMNS: &str = "id, name, description, points_required, active, created_at";
const TRANSACTION_COLUMNS: &str =
    "id, user_id, kind, points, description, promotion_id, created_at";

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    ping_timeout: Duration,
}

impl PgStore {
    pub async fn connect(database_url: &str, ping_timeout: Duration) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(ping_timeout.max(Duration::from_secs(1)))
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db, ping_timeout })
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> bool {
        let ping = sqlx::query("SELECT 1").execute(&self.db);
        match tokio::time::timeout(self.ping_timeout, ping).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "database ping failed");
                false
            }
            Err(_) => {
                warn!(timeout_ms = self.ping_timeout.as_millis() as u64, "database ping timed out");
                false
            }
        }
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (id, email, password_hash, name) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.name)
            .fetch_one(&self.db)
            .await
            .map_err(|e| {
                let duplicate = e
                    .as_database_error()
                    .map(|db| db.is_unique_violation())
                    .unwrap_or(false);
                if duplicate {
                    AppError::EmailTaken
                } else {
                    AppError::from(e)
                }
            })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn list_active_promotions(&self) -> Result<Vec<Promotion>, AppError> {
        let sql = format!(
            "SELECT {PROMOTION_COLUMNS} FROM promotions \
             WHERE active ORDER BY points_required ASC, created_at ASC"
        );
        let rows = sqlx::query_as::<_, Promotion>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }

    async fn create_promotion(&self, promotion: NewPromotion) -> Result<Promotion, AppError> {
        let sql = format!(
            "INSERT INTO promotions (id, name, description, points_required, active) \
             VALUES ($1, $2, $3, $4, TRUE) RETURNING {PROMOTION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, Promotion>(&sql)
            .bind(Uuid::new_v4())
            .bind(&promotion.name)
            .bind(&promotion.description)
            .bind(promotion.points_required)
            .fetch_one(&self.db)
            .await?;
        Ok(row)
    }

    async fn set_promotion_active(&self, id: Uuid, active: bool) -> Result<Promotion, AppError> {
        let sql = format!(
            "UPDATE promotions SET active = $2 WHERE id = $1 RETURNING {PROMOTION_COLUMNS}"
        );
        sqlx::query_as::<_, Promotion>(&sql)
            .bind(id)
            .bind(active)
            .fetch_optional(&self.db)
            .await?
            .ok_or(AppError::PromotionNotFound)
    }

    async fn credit(&self, user_id: Uuid, amount: i64) -> Result<Balance, AppError> {
        if amount <= 0 {
            return Err(AppError::Validation("credit amount must be positive".into()));
        }

        let mut tx = self.db.begin().await?;

        let row: Option<(i64, i64)> = sqlx::query_as(
            r#"
            UPDATE users
               SET points = points + $2,
                   cans_detected = cans_detected + 1
             WHERE id = $1
            RETURNING points, cans_detected
            "#,
        )
        .bind(user_id)
        .bind(amount)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((points, cans_detected)) = row else {
            return Err(AppError::UserNotFound);
        };

        sqlx::query(
            r#"
            INSERT INTO transactions (id, user_id, kind, points, description)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(TransactionKind::CanDetected)
        .bind(amount)
        .bind(CAN_DETECTED_DESCRIPTION)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(%user_id, amount, points, "ledger credit committed");

        Ok(Balance {
            points,
            cans_detected,
        })
    }

    async fn redeem(&self, user_id: Uuid, promotion_id: Uuid) -> Result<Redemption, AppError> {
        let mut tx = self.db.begin().await?;

        let sql = format!("SELECT {PROMOTION_COLUMNS} FROM promotions WHERE id = $1 FOR SHARE");
        let promotion = match sqlx::query_as::<_, Promotion>(&sql)
            .bind(promotion_id)
            .fetch_optional(&mut *tx)
            .await?
        {
            Some(p) if p.active => p,
            _ => return Err(AppError::PromotionUnavailable),
        };

        // The balance guard lives in the UPDATE itself so concurrent
        // redemptions serialize on the row lock and cannot overdraw.
        let debited: Option<(i64,)> = sqlx::query_as(
            r#"
            UPDATE users
               SET points = points - $2
             WHERE id = $1 AND points >= $2
            RETURNING points
            "#,
        )
        .bind(user_id)
        .bind(promotion.points_required)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((points,)) = debited else {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
            return Err(if exists {
                AppError::InsufficientPoints
            } else {
                AppError::UserNotFound
            });
        };

        let sql = format!(
            "INSERT INTO transactions (id, user_id, kind, points, description, promotion_id) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {TRANSACTION_COLUMNS}"
        );
        let transaction = sqlx::query_as::<_, Transaction>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(TransactionKind::PromotionRedeemed)
            .bind(-promotion.points_required)
            .bind(redemption_description(&promotion.name))
            .bind(promotion.id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(%user_id, %promotion_id, points, "ledger redemption committed");

        Ok(Redemption {
            points,
            promotion,
            transaction,
        })
    }

    async fn list_transactions(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, AppError> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, Transaction>(&sql)
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.db)
            .await?;
        Ok(rows)
    }
}
