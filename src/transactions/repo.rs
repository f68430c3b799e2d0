use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{
    NewTransaction, Transaction, TransactionFilter, TransactionPatch, TransactionRow,
};
use crate::db::{StoreError, StoreResult};

/// Transaction store. Every method is scoped by owner: a record owned by
/// someone else behaves exactly like a record that does not exist.
#[async_trait]
pub trait TransactionRepo: Send + Sync {
    async fn create(&self, owner: Uuid, tx: NewTransaction) -> StoreResult<Transaction>;

    /// Owner's transactions, newest date first.
    async fn list_by_owner(
        &self,
        owner: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>>;

    /// `None` when no record matches both `id` and `owner`.
    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> StoreResult<Option<Transaction>>;

    /// `false` when no record matches both `id` and `owner`.
    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgTransactionRepo {
    db: PgPool,
}

impl PgTransactionRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn into_domain(row: TransactionRow) -> StoreResult<Transaction> {
    Transaction::try_from(row).map_err(StoreError::Backend)
}

#[async_trait]
impl TransactionRepo for PgTransactionRepo {
    async fn create(&self, owner: Uuid, tx: NewTransaction) -> StoreResult<Transaction> {
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            INSERT INTO transactions (id, user_id, kind, category, amount, title, date, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, user_id, kind, category, amount, title, date, description,
                      created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(tx.kind.as_str())
        .bind(&tx.category)
        .bind(tx.amount)
        .bind(&tx.title)
        .bind(tx.date)
        .bind(&tx.description)
        .fetch_one(&self.db)
        .await?;
        into_domain(row)
    }

    async fn list_by_owner(
        &self,
        owner: Uuid,
        filter: &TransactionFilter,
    ) -> StoreResult<Vec<Transaction>> {
        let rows = sqlx::query_as::<_, TransactionRow>(
            r#"
            SELECT id, user_id, kind, category, amount, title, date, description,
                   created_at, updated_at
              FROM transactions
             WHERE user_id = $1
               AND ($2::text IS NULL OR kind = $2)
               AND ($3::text IS NULL OR category = $3)
               AND ($4::date IS NULL OR date >= $4)
               AND ($5::date IS NULL OR date <= $5)
               AND ($6::float8 IS NULL OR amount >= $6)
               AND ($7::float8 IS NULL OR amount <= $7)
             ORDER BY date DESC, created_at DESC
            "#,
        )
        .bind(owner)
        .bind(filter.kind.map(|k| k.as_str()))
        .bind(filter.category.as_deref())
        .bind(filter.from)
        .bind(filter.to)
        .bind(filter.min_amount)
        .bind(filter.max_amount)
        .fetch_all(&self.db)
        .await?;
        rows.into_iter().map(into_domain).collect()
    }

    async fn update_owned(
        &self,
        owner: Uuid,
        id: Uuid,
        patch: TransactionPatch,
    ) -> StoreResult<Option<Transaction>> {
        let (set_description, description) = match patch.description {
            Some(d) => (true, d),
            None => (false, None),
        };
        let row = sqlx::query_as::<_, TransactionRow>(
            r#"
            UPDATE transactions
               SET kind        = COALESCE($3, kind),
                   category    = COALESCE($4, category),
                   amount      = COALESCE($5, amount),
                   title       = COALESCE($6, title),
                   date        = COALESCE($7, date),
                   description = CASE WHEN $8 THEN $9 ELSE description END,
                   updated_at  = now()
             WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, kind, category, amount, title, date, description,
                      created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(owner)
        .bind(patch.kind.map(|k| k.as_str()))
        .bind(patch.category)
        .bind(patch.amount)
        .bind(patch.title)
        .bind(patch.date)
        .bind(set_description)
        .bind(description)
        .fetch_optional(&self.db)
        .await?;
        row.map(into_domain).transpose()
    }

    async fn delete_owned(&self, owner: Uuid, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM transactions WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(owner)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
