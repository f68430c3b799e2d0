use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{CreateTransactionRequest, ListQuery, MessageResponse, UpdateTransactionRequest},
    repo_types::Transaction,
    services,
};
use crate::{
    auth::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiQuery},
    state::AppState,
};

pub fn transaction_routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", get(list_transactions).post(create_transaction))
        .route(
            "/transactions/:id",
            put(update_transaction).delete(delete_transaction),
        )
}

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<CreateTransactionRequest>,
) -> Result<(StatusCode, Json<Transaction>), ApiError> {
    let tx = services::create(state.transactions.as_ref(), user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(tx)))
}

#[instrument(skip(state, query))]
pub async fn list_transactions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> Result<Json<Vec<Transaction>>, ApiError> {
    let filter = services::validate_filter(query)?;
    let items = services::list(state.transactions.as_ref(), user_id, &filter).await?;
    Ok(Json(items))
}

#[instrument(skip(state, payload))]
pub async fn update_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateTransactionRequest>,
) -> Result<Json<Transaction>, ApiError> {
    let id = services::parse_transaction_id(&id)?;
    let tx = services::update(state.transactions.as_ref(), user_id, id, payload).await?;
    Ok(Json(tx))
}

#[instrument(skip(state))]
pub async fn delete_transaction(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = services::parse_transaction_id(&id)?;
    services::delete(state.transactions.as_ref(), user_id, id).await?;
    Ok(Json(MessageResponse {
        message: "Transaction deleted",
    }))
}
