use time::{format_description::FormatItem, macros::format_description, Date};
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    dto::{AmountInput, CreateTransactionRequest, ListQuery, UpdateTransactionRequest},
    repo::TransactionRepo,
    repo_types::{NewTransaction, Transaction, TransactionFilter, TransactionPatch},
};
use crate::error::ApiError;

const DATE_FORMAT: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

fn not_found() -> ApiError {
    ApiError::NotFound("Transaction not found".into())
}

/// Ids that are not UUIDs cannot name a stored record.
pub fn parse_transaction_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

/// Blank values are rejected; anything else is kept exactly as submitted.
fn required_text(value: String, field: &str) -> Result<String, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(value)
}

fn amount(input: &AmountInput) -> Result<f64, ApiError> {
    input
        .to_f64()
        .ok_or_else(|| ApiError::validation("Amount must be a finite number"))
}

pub fn validate_new(req: CreateTransactionRequest) -> Result<NewTransaction, ApiError> {
    Ok(NewTransaction {
        kind: req.kind,
        category: required_text(req.category, "Category")?,
        amount: amount(&req.amount)?,
        title: required_text(req.title, "Title")?,
        date: req.date,
        description: req.description,
    })
}

pub fn validate_patch(req: UpdateTransactionRequest) -> Result<TransactionPatch, ApiError> {
    Ok(TransactionPatch {
        kind: req.kind,
        category: req
            .category
            .map(|c| required_text(c, "Category"))
            .transpose()?,
        amount: req.amount.as_ref().map(amount).transpose()?,
        title: req.title.map(|t| required_text(t, "Title")).transpose()?,
        date: req.date,
        // "" clears the description
        description: req.description.map(|d| (!d.is_empty()).then_some(d)),
    })
}

fn amount_bound(value: Option<f64>, field: &str) -> Result<Option<f64>, ApiError> {
    match value {
        Some(v) if !v.is_finite() => Err(ApiError::validation(format!(
            "{field} must be a finite number"
        ))),
        other => Ok(other),
    }
}

fn parse_date(raw: &str, field: &str) -> Result<Date, ApiError> {
    Date::parse(raw.trim(), DATE_FORMAT)
        .map_err(|_| ApiError::validation(format!("{field} must be a date (YYYY-MM-DD)")))
}

pub fn validate_filter(q: ListQuery) -> Result<TransactionFilter, ApiError> {
    let filter = TransactionFilter {
        kind: q.kind,
        category: q.category.filter(|c| !c.trim().is_empty()),
        from: q.from.as_deref().map(|d| parse_date(d, "from")).transpose()?,
        to: q.to.as_deref().map(|d| parse_date(d, "to")).transpose()?,
        min_amount: amount_bound(q.min_amount, "minAmount")?,
        max_amount: amount_bound(q.max_amount, "maxAmount")?,
    };
    if let (Some(from), Some(to)) = (filter.from, filter.to) {
        if from > to {
            return Err(ApiError::validation("from must not be after to"));
        }
    }
    if let (Some(min), Some(max)) = (filter.min_amount, filter.max_amount) {
        if min > max {
            return Err(ApiError::validation("minAmount must not exceed maxAmount"));
        }
    }
    Ok(filter)
}

pub async fn create(
    repo: &dyn TransactionRepo,
    owner: Uuid,
    req: CreateTransactionRequest,
) -> Result<Transaction, ApiError> {
    let new = validate_new(req)?;
    let tx = repo.create(owner, new).await?;
    info!(user_id = %owner, transaction_id = %tx.id, kind = %tx.kind, "transaction created");
    Ok(tx)
}

pub async fn list(
    repo: &dyn TransactionRepo,
    owner: Uuid,
    filter: &TransactionFilter,
) -> Result<Vec<Transaction>, ApiError> {
    Ok(repo.list_by_owner(owner, filter).await?)
}

pub async fn update(
    repo: &dyn TransactionRepo,
    owner: Uuid,
    id: Uuid,
    req: UpdateTransactionRequest,
) -> Result<Transaction, ApiError> {
    let patch = validate_patch(req)?;
    match repo.update_owned(owner, id, patch).await? {
        Some(tx) => {
            info!(user_id = %owner, transaction_id = %id, "transaction updated");
            Ok(tx)
        }
        None => {
            warn!(user_id = %owner, transaction_id = %id, "update of missing or foreign transaction");
            Err(not_found())
        }
    }
}

pub async fn delete(repo: &dyn TransactionRepo, owner: Uuid, id: Uuid) -> Result<(), ApiError> {
    if repo.delete_owned(owner, id).await? {
        info!(user_id = %owner, transaction_id = %id, "transaction deleted");
        Ok(())
    } else {
        warn!(user_id = %owner, transaction_id = %id, "delete of missing or foreign transaction");
        Err(not_found())
    }
}
