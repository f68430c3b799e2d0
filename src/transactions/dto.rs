use serde::{Deserialize, Serialize};
use time::Date;

use super::{date_format, repo_types::TransactionKind};

/// Amounts arrive as JSON numbers or, from currency inputs, as numeric strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    Number(f64),
    Text(String),
}

impl AmountInput {
    pub fn to_f64(&self) -> Option<f64> {
        let value = match self {
            AmountInput::Number(n) => *n,
            AmountInput::Text(s) => s.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then_some(value)
    }
}

/// Body of `POST /transactions`. Any owner field in the payload is ignored;
/// the owner is the authenticated caller.
#[derive(Debug, Deserialize)]
pub struct CreateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    #[serde(default)]
    pub category: String,
    pub amount: AmountInput,
    #[serde(default)]
    pub title: String,
    #[serde(with = "date_format")]
    pub date: Date,
    #[serde(default)]
    pub description: Option<String>,
}

/// Body of `PUT /transactions/:id`. Only these fields may change; anything
/// else (an owner field included) is rejected.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateTransactionRequest {
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub amount: Option<AmountInput>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, with = "date_format::option")]
    pub date: Option<Date>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Query string of `GET /transactions`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(rename = "type")]
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
