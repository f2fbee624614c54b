use std::{
    collections::HashMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
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

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, User>,
    promotions: HashMap<Uuid, Promotion>,
    transactions: Vec<Transaction>,
}

/// In-process store used by tests. One mutex guards all tables, so every
/// ledger operation is trivially atomic.
pub struct MemoryStore {
    inner: Mutex<Inner>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `ping` report the database as down (or back up).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.lock().await;
        if inner.users.values().any(|u| u.email == user.email) {
            return Err(AppError::EmailTaken);
        }
        let row = User {
            id: Uuid::new_v4(),
            email: user.email,
            password_hash: user.password_hash,
            name: user.name,
            points: 0,
            cans_detected: 0,
            created_at: OffsetDateTime::now_utc(),
        };
        inner.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.inner.lock().await.users.get(&id).cloned())
    }

    async fn list_active_promotions(&self) -> Result<Vec<Promotion>, AppError> {
        let inner = self.inner.lock().await;
        let mut rows: Vec<Promotion> = inner
            .promotions
            .values()
            .filter(|p| p.active)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.points_required
                .cmp(&b.points_required)
                .then(a.created_at.cmp(&b.created_at))
        });
        Ok(rows)
    }

    async fn create_promotion(&self, promotion: NewPromotion) -> Result<Promotion, AppError> {
        let row = Promotion {
            id: Uuid::new_v4(),
            name: promotion.name,
            description: promotion.description,
            points_required: promotion.points_required,
            active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        self.inner
            .lock()
            .await
            .promotions
            .insert(row.id, row.clone());
        Ok(row)
    }

    async fn set_promotion_active(&self, id: Uuid, active: bool) -> Result<Promotion, AppError> {
        let mut inner = self.inner.lock().await;
        let promotion = inner
            .promotions
            .get_mut(&id)
            .ok_or(AppError::PromotionNotFound)?;
        promotion.active = active;
        Ok(promotion.clone())
    }

    async fn credit(&self, user_id: Uuid, amount: i64) -> Result<Balance, AppError> {
        if amount <= 0 {
            return Err(AppError::Validation("credit amount must be positive".into()));
        }
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(AppError::UserNotFound)?;
        user.points += amount;
        user.cans_detected += 1;
        let balance = Balance {
            points: user.points,
            cans_detected: user.cans_detected,
        };
        inner.transactions.push(Transaction {
            id: Uuid::new_v4(),
            user_id,
            kind: TransactionKind::CanDetected,
            points: amount,
            description: CAN_DETECTED_DESCRIPTION.to_string(),
            promotion_id: None,
            created_at: OffsetDateTime::now_utc(),
        });
        Ok(balance)
    }

    async fn redeem(&self, user_id: Uuid, promotion_id: Uuid) -> Result<Redemption, AppError> {
        let mut inner = self.inner.lock().await;
        let promotion = match inner.promotions.get(&promotion_id) {
            Some(p) if p.active => p.clone(),
            _ => return Err(AppError::PromotionUnavailable),
        };
        let user = inner
            .users
            .get_mut(&user_id)
            .ok_or(AppError::UserNotFound)?;
        if user.points < promotion.points_required {
            return Err(AppError::InsufficientPoints);
        }
        user.points -= promotion.points_required;
        let points = user.points;

        let transaction = Transaction {
            id: Uuid::new_v4(),
            user_id,
            kind: TransactionKind::PromotionRedeemed,
            points: -promotion.points_required,
            description: redemption_description(&promotion.name),
            promotion_id: Some(promotion.id),
            created_at: OffsetDateTime::now_utc(),
        };
        inner.transactions.push(transaction.clone());

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
        let inner = self.inner.lock().await;
        Ok(inner
            .transactions
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    async fn seeded() -> (MemoryStore, User) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                email: "ana@example.com".into(),
                password_hash: "hash".into(),
                name: "Ana".into(),
            })
            .await
            .unwrap();
        (store, user)
    }

    async fn promotion(store: &MemoryStore, cost: i64) -> Promotion {
        store
            .create_promotion(NewPromotion {
                name: format!("Reward {cost}"),
                description: "test reward".into(),
                points_required: cost,
            })
            .await
            .unwrap()
    }

    async fn ledger_sum(store: &MemoryStore, user_id: Uuid) -> i64 {
        store
            .list_transactions(user_id, i64::MAX, 0)
            .await
            .unwrap()
            .iter()
            .map(|t| t.points)
            .sum()
    }

    #[tokio::test]
    async fn crediting_n_times_adds_n_points_and_cans() {
        let (store, user) = seeded().await;
        for _ in 0..5 {
            store.credit(user.id, 1).await.unwrap();
        }
        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.points, 5);
        assert_eq!(user.cans_detected, 5);
        assert_eq!(ledger_sum(&store, user.id).await, 5);
    }

    #[tokio::test]
    async fn credit_rejects_non_positive_amount() {
        let (store, user) = seeded().await;
        let err = store.credit(user.id, 0).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.list_transactions(user.id, 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn credit_unknown_user_fails() {
        let store = MemoryStore::new();
        let err = store.credit(Uuid::new_v4(), 1).await.unwrap_err();
        assert!(matches!(err, AppError::UserNotFound));
    }

    #[tokio::test]
    async fn redeem_debits_cost_and_logs_negative_delta() {
        let (store, user) = seeded().await;
        let promo = promotion(&store, 3).await;
        for _ in 0..4 {
            store.credit(user.id, 1).await.unwrap();
        }

        let redemption = store.redeem(user.id, promo.id).await.unwrap();
        assert_eq!(redemption.points, 1);
        assert_eq!(redemption.transaction.points, -3);
        assert_eq!(redemption.transaction.kind, TransactionKind::PromotionRedeemed);
        assert_eq!(redemption.transaction.promotion_id, Some(promo.id));
        assert_eq!(redemption.transaction.description, "Redeemed: Reward 3");

        let history = store.list_transactions(user.id, 10, 0).await.unwrap();
        assert_eq!(history.len(), 5);
        assert_eq!(history[0].id, redemption.transaction.id);
        assert_eq!(ledger_sum(&store, user.id).await, 1);
    }

    #[tokio::test]
    async fn redeem_with_insufficient_balance_leaves_it_unchanged() {
        let (store, user) = seeded().await;
        let promo = promotion(&store, 10).await;
        store.credit(user.id, 2).await.unwrap();

        let err = store.redeem(user.id, promo.id).await.unwrap_err();
        assert!(matches!(err, AppError::InsufficientPoints));

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.points, 2);
        assert_eq!(store.list_transactions(user.id, 10, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn inactive_or_missing_promotion_is_unavailable() {
        let (store, user) = seeded().await;
        let promo = promotion(&store, 1).await;
        store.credit(user.id, 1).await.unwrap();
        store.set_promotion_active(promo.id, false).await.unwrap();

        let err = store.redeem(user.id, promo.id).await.unwrap_err();
        assert!(matches!(err, AppError::PromotionUnavailable));
        let err = store.redeem(user.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AppError::PromotionUnavailable));
    }

    #[tokio::test]
    async fn concurrent_redemptions_never_overdraw() {
        let (store, user) = seeded().await;
        let store = Arc::new(store);
        let promo = promotion(&store, 3).await;
        for _ in 0..4 {
            store.credit(user.id, 1).await.unwrap();
        }

        let (a, b) = tokio::join!(store.redeem(user.id, promo.id), store.redeem(user.id, promo.id));
        assert_eq!(a.is_ok() as u8 + b.is_ok() as u8, 1);

        let user = store.find_user(user.id).await.unwrap().unwrap();
        assert_eq!(user.points, 1);
        assert_eq!(ledger_sum(&store, user.id).await, user.points);
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let (store, _) = seeded().await;
        let err = store
            .create_user(NewUser {
                email: "ana@example.com".into(),
                password_hash: "other".into(),
                name: "Other".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::EmailTaken));
    }

    #[tokio::test]
    async fn active_promotions_sorted_by_cost() {
        let store = MemoryStore::new();
        let expensive = promotion(&store, 50).await;
        let cheap = promotion(&store, 10).await;
        let hidden = promotion(&store, 5).await;
        store.set_promotion_active(hidden.id, false).await.unwrap();

        let ids: Vec<Uuid> = store
            .list_active_promotions()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.id)
            .collect();
        assert_eq!(ids, vec![cheap.id, expensive.id]);
    }
}
