use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest, SessionUser},
    services,
};
use crate::{error::ApiError, extract::ApiJson, state::AppState};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let (user, token) = services::register(state.users.as_ref(), &state.jwt, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully",
            user: SessionUser {
                user: PublicUser::from(user),
                token,
            },
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let (user, token) = services::login(state.users.as_ref(), &state.jwt, payload).await?;
    Ok(Json(AuthResponse {
        message: "Login successful",
        user: SessionUser {
            user: PublicUser::from(user),
            token,
        },
    }))
}
