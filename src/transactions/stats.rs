use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use super::{
    repo::TransactionRepo,
    repo_types::{Transaction, TransactionFilter, TransactionKind},
};
use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub count: usize,
}

/// Figures derived from a user's transactions. Never stored; recomputed on
/// every request.
///
/// `total` is the net balance (income minus expense). Category totals are
/// plain sums of amounts, as shown in the category chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    #[serde(rename = "totalTransactions")]
    pub count: usize,
    pub total: f64,
    pub income: f64,
    pub expense: f64,
    pub by_category: Vec<CategoryTotal>,
}

pub fn fold(transactions: &[Transaction]) -> Summary {
    let mut income = 0.0;
    let mut expense = 0.0;
    let mut categories: BTreeMap<&str, (f64, usize)> = BTreeMap::new();

    for t in transactions {
        match t.kind {
            TransactionKind::Income => income += t.amount,
            TransactionKind::Expense => expense += t.amount,
        }
        let entry = categories.entry(t.category.as_str()).or_default();
        entry.0 += t.amount;
        entry.1 += 1;
    }

    Summary {
        count: transactions.len(),
        total: income - expense,
        income,
        expense,
        by_category: categories
            .into_iter()
            .map(|(category, (total, count))| CategoryTotal {
                category: category.to_string(),
                total,
                count,
            })
            .collect(),
    }
}

pub async fn summarize(repo: &dyn TransactionRepo, owner: Uuid) -> Result<Summary, ApiError> {
    let transactions = repo
        .list_by_owner(owner, &TransactionFilter::default())
        .await?;
    Ok(fold(&transactions))
}
