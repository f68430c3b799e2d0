use tracing::{info, warn};
use uuid::Uuid;

use super::dto::UpdateProfileRequest;
use crate::{
    auth::{
        password::{hash_password_blocking, validate_new_password},
        repo::UserRepo,
        repo_types::{ProfileChanges, User},
    },
    error::ApiError,
};

fn user_not_found() -> ApiError {
    ApiError::NotFound("User not found".into())
}

pub async fn get_profile(users: &dyn UserRepo, user_id: Uuid) -> Result<User, ApiError> {
    match users.find_by_id(user_id).await? {
        Some(user) => Ok(user),
        None => {
            warn!(user_id = %user_id, "token subject has no user record");
            Err(user_not_found())
        }
    }
}

pub async fn update_profile(
    users: &dyn UserRepo,
    user_id: Uuid,
    req: UpdateProfileRequest,
) -> Result<User, ApiError> {
    if req.name.is_none() && req.password.is_none() {
        return Err(ApiError::validation("Nothing to update"));
    }

    let name = match req.name {
        Some(n) if n.trim().is_empty() => return Err(ApiError::validation("Name is required")),
        Some(n) => Some(n.trim().to_string()),
        None => None,
    };

    let password_hash = match req.password {
        Some(p) => {
            validate_new_password(&p).map_err(ApiError::validation)?;
            Some(hash_password_blocking(p).await.map_err(ApiError::internal)?)
        }
        None => None,
    };
    let password_changed = password_hash.is_some();

    let user = users
        .update_profile(
            user_id,
            ProfileChanges {
                name,
                password_hash,
            },
        )
        .await?
        .ok_or_else(user_not_found)?;

    info!(user_id = %user.id, password_changed, "profile updated");
    Ok(user)
}
