//! In-memory repositories standing in for Postgres in tests.

use std::collections::HashMap;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    auth::{
        repo::UserRepo,
        repo_types::{NewUser, ProfileChanges, User},
    },
    db::{StoreError, StoreResult},
    transactions::{
        repo::TransactionRepo,
        repo_types::{NewTransaction, Transaction, TransactionFilter, TransactionPatch},
    },
};

#[derive(Default)]
pub struct MemoryUserRepo {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepo {
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate);
        }
        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        changes: ProfileChanges,
    ) -> StoreResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = OffsetDateTime::now_utc();
        Ok(Some(user.clone()))
    }
}

#[derive(Default)]
pub struct MemoryTransactionRepo {
    // insertion order doubles as creation order for tie-breaking
    rows: RwLock<Vec<Transaction>>,
}

fn matches(filter: &TransactionFilter, t: &Transaction) -> bool {
    filter.kind.map_or(true, |k| t.kind == k)
        && filter.category.as_deref().map_or(true, |c| t.category == c)
        && filter.from.map_or(true, |d| t.date >= d)
        && filter.to.map_or(true, |d| t.date <= d)
        && filter.min_amount.map_or(true, |m| t.amount >= m)
        && filter.max_amount.map_or(true, |m| t.amount <= m)
}

#[async_trait]
impl TransactionRepo for MemoryTransactionRepo {
    async fn create(&self, owner: Uuid, tx: NewTransaction) -> StoreResult<Transaction> {
        let now = OffsetDateTime::now_utc();
        let tx = Transaction {
            id: Uuid::new_v4(),
            user_id: owner,
            kind: tx.kind,
            category: tx.category,
            amount: tx.amount,
            title: tx.title,
            date: tx.date,
            description: tx.description,
            created_at: now,
            updated_at: now,
        };
        self.rows.write().await.push(tx.clone());
        Ok(tx)
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        let rows = self.rows.read().await;
        let mut owned: Vec<Transaction> = rows
            .iter()
            .rev()
            .filter(|t| t.user_id == owner && matches(filter, t))
            .cloned()
            .collect();
        // stable sort keeps newest-created first among equal dates
        owned.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(owned)
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> StoreResult<Option<Transaction>> {
        let mut rows = self.rows.write().await;
        let Some(t) = rows.iter_mut().find(|t| t.id == id && t.user_id == owner) else {
            return Ok(None);
        };
        if let Some(kind) = patch.kind {
            t.kind = kind;
        }
        if let Some(category) = patch.category {
            t.category = category;
        }
        if let Some(amount) = patch.amount {
            t.amount = amount;
        }
        if let Some(title) = patch.title {
            t.title = title;
        }
        if let Some(date) = patch.date {
            t.date = date;
        }
        if let Some(description) = patch.description {
            t.description = description;
        }
        t.updated_at = OffsetDateTime::now_utc();
        Ok(Some(t.clone()))
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|t| !(t.id == id && t.user_id == owner));
        Ok(rows.len() != before)
    }
}
