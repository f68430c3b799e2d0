use anyhow::Context;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use super::{
    dto::{LoginRequest, RegisterRequest},
    jwt::JwtKeys,
    password::{
        hash_password, hash_password_blocking, validate_new_password, verify_password,
        verify_password_blocking,
    },
    repo::UserRepo,
    repo_types::{NewUser, User},
};
use crate::{db::StoreError, error::ApiError};

lazy_static! {
    static ref EMAIL_RE: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email regex compiles");
    // Verified against when the email is unknown, so both login failures
    // cost the same.
    static ref DUMMY_HASH: Option<String> = hash_password("ledgerly-dummy-password").ok();
}

/// Builds the dummy hash on a blocking thread. Run once at startup so no
/// login request ever pays for it.
pub async fn prime_dummy_hash() -> anyhow::Result<()> {
    tokio::task::spawn_blocking(|| lazy_static::initialize(&DUMMY_HASH))
        .await
        .context("join dummy hash task")?;
    if DUMMY_HASH.is_none() {
        anyhow::bail!("could not build dummy password hash");
    }
    Ok(())
}

/// Same Argon2 work as a real check, for an email with no account.
async fn verify_against_dummy(plain: String) {
    let _ = tokio::task::spawn_blocking(move || {
        DUMMY_HASH
            .as_deref()
            .map(|dummy| verify_password(&plain, dummy))
    })
    .await;
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Creates a user and mints their first token.
pub async fn register(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: RegisterRequest,
) -> Result<(User, String), ApiError> {
    let name = req.name.trim().to_string();
    let email = normalize_email(&req.email);

    if name.is_empty() {
        return Err(ApiError::validation("Name is required"));
    }
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(ApiError::validation("Invalid email"));
    }
    validate_new_password(&req.password).map_err(ApiError::validation)?;

    if users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password_blocking(req.password)
        .await
        .map_err(ApiError::internal)?;

    let user = match users
        .create(NewUser {
            name,
            email,
            password_hash,
        })
        .await
    {
        Ok(u) => u,
        // lost a race with a concurrent registration
        Err(StoreError::Duplicate) => {
            return Err(ApiError::Conflict("Email already registered".into()))
        }
        Err(e) => return Err(e.into()),
    };

    let token = keys.sign(user.id).map_err(ApiError::internal)?;
    info!(user_id = %user.id, "user registered");
    Ok((user, token))
}

/// Checks credentials and mints a fresh token. Unknown email and wrong
/// password are indistinguishable to the caller.
pub async fn login(
    users: &dyn UserRepo,
    keys: &JwtKeys,
    req: LoginRequest,
) -> Result<(User, String), ApiError> {
    let email = normalize_email(&req.email);
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Email and password are required"));
    }

    let Some(user) = users.find_by_email(&email).await? else {
        verify_against_dummy(req.password).await;
        warn!(email = %email, "login unknown email");
        return Err(ApiError::InvalidCredentials);
    };

    let ok = verify_password_blocking(req.password, user.password_hash.clone())
        .await
        .map_err(ApiError::internal)?;
    if !ok {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = keys.sign(user.id).map_err(ApiError::internal)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        auth::{jwt::tests::make_keys, repo_types::ProfileChanges},
        db::StoreResult,
        memory::MemoryUserRepo,
    };
    use async_trait::async_trait;
    use uuid::Uuid;

    /// Sees no existing account, then loses the insert to a concurrent
    /// registration of the same email.
    struct LosesInsertRace;

    #[async_trait]
    impl UserRepo for LosesInsertRace {
        async fn create(&self, _user: NewUser) -> StoreResult<User> {
            Err(StoreError::Duplicate)
        }

        async fn find_by_email(&self, _email: &str) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn find_by_id(&self, _id: Uuid) -> StoreResult<Option<User>> {
            Ok(None)
        }

        async fn update_profile(
            &self,
            _id: Uuid,
            _changes: ProfileChanges,
        ) -> StoreResult<Option<User>> {
            Ok(None)
        }
    }

    fn register_req(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: name.into(),
            email: email.into(),
            password: password.into(),
        }
    }

    fn login_req(email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            email: email.into(),
            password: password.into(),
        }
    }

    #[test]
    fn email_validation() {
        assert!(is_valid_email("a@b.co"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("a b@c.de"));
        assert_eq!(normalize_email("  Ann@Example.COM "), "ann@example.com");
    }

    #[tokio::test]
    async fn register_stores_hash_and_returns_verifiable_token() {
        let repo = MemoryUserRepo::default();
        let keys = make_keys("secret", "iss", "aud");

        let (user, token) = register(&repo, &keys, register_req("Ann", "ann@example.com", "password123"))
            .await
            .expect("register");

        assert_eq!(user.name, "Ann");
        assert_eq!(user.email, "ann@example.com");
        assert_ne!(user.password_hash, "password123");
        assert_eq!(keys.verify_token(&token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn register_twice_with_same_email_conflicts() {
        let repo = MemoryUserRepo::default();
        let keys = make_keys("secret", "iss", "aud");

        register(&repo, &keys, register_req("Ann", "ann@example.com", "password123"))
            .await
            .unwrap();
        let err = register(&repo, &keys, register_req("Ann 2", "ANN@example.com", "password456"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)));
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn register_losing_insert_race_conflicts() {
        let keys = make_keys("secret", "iss", "aud");
        let err = register(
            &LosesInsertRace,
            &keys,
            register_req("Ann", "ann@example.com", "password123"),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ApiError::Conflict(_)), "got {err:?}");
        assert_eq!(err.to_string(), "Email already registered");
    }

    #[tokio::test]
    async fn primed_dummy_hash_is_a_real_argon2_hash() {
        prime_dummy_hash().await.expect("prime");
        let dummy = DUMMY_HASH.as_deref().expect("dummy hash built");
        assert!(dummy.starts_with("$argon2"));
        assert!(!verify_password("password123", dummy).unwrap());
    }

    #[tokio::test]
    async fn register_validation_happens_before_any_write() {
        let repo = MemoryUserRepo::default();
        let keys = make_keys("secret", "iss", "aud");

        let cases = [
            register_req("Ann", "ann@example.com", ""),
            register_req("Ann", "", "password123"),
            register_req("", "ann@example.com", "password123"),
            register_req("Ann", "not-an-email", "password123"),
            register_req("Ann", "ann@example.com", "short"),
        ];
        for req in cases {
            let err = register(&repo, &keys, req).await.unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)), "got {err:?}");
        }
        assert_eq!(repo.len().await, 0);
    }

    #[tokio::test]
    async fn login_succeeds_with_correct_password() {
        let repo = MemoryUserRepo::default();
        let keys = make_keys("secret", "iss", "aud");
        let (registered, _) = register(&repo, &keys, register_req("Ann", "ann@example.com", "password123"))
            .await
            .unwrap();

        let (user, token) = login(&repo, &keys, login_req(" Ann@Example.com", "password123"))
            .await
            .expect("login");

        assert_eq!(user.id, registered.id);
        assert_eq!(keys.verify_token(&token).unwrap(), registered.id);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let repo = MemoryUserRepo::default();
        let keys = make_keys("secret", "iss", "aud");
        register(&repo, &keys, register_req("Ann", "ann@example.com", "password123"))
            .await
            .unwrap();

        let wrong_password = login(&repo, &keys, login_req("ann@example.com", "password124"))
            .await
            .unwrap_err();
        let unknown_email = login(&repo, &keys, login_req("bob@example.com", "password123"))
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, ApiError::InvalidCredentials));
        assert!(matches!(unknown_email, ApiError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.status(), unknown_email.status());
    }
}
