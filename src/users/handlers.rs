use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::{dto::UpdateProfileRequest, services};
use crate::{
    auth::{dto::PublicUser, AuthUser},
    error::ApiError,
    extract::ApiJson,
    state::AppState,
    transactions::stats::{self, Summary},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/me", get(get_me).put(update_me))
        .route("/user/stats", get(get_stats))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services::get_profile(state.users.as_ref(), user_id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    ApiJson(payload): ApiJson<UpdateProfileRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = services::update_profile(state.users.as_ref(), user_id, payload).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Summary>, ApiError> {
    let summary = stats::summarize(state.transactions.as_ref(), user_id).await?;
    Ok(Json(summary))
}
