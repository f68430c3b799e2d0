use std::sync::Arc;

use tracing::info;

use crate::{
    auth::{
        self,
        repo::{PgUserRepo, UserRepo},
        JwtKeys,
    },
    config::AppConfig,
    db,
    transactions::repo::{PgTransactionRepo, TransactionRepo},
};

/// Shared, read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub jwt: JwtKeys,
    pub users: Arc<dyn UserRepo>,
    pub transactions: Arc<dyn TransactionRepo>,
}

impl AppState {
    /// Connects to Postgres and applies migrations. Any failure is fatal:
    /// the server does not start without a working store.
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let pool = db::connect(&config).await?;
        db::migrate(&pool).await?;
        info!("database ready");
        auth::services::prime_dummy_hash().await?;

        Ok(Self::from_parts(
            &config,
            Arc::new(PgUserRepo::new(pool.clone())),
            Arc::new(PgTransactionRepo::new(pool)),
        ))
    }

    pub fn from_parts(
        config: &AppConfig,
        users: Arc<dyn UserRepo>,
        transactions: Arc<dyn TransactionRepo>,
    ) -> Self {
        let jwt = JwtKeys::new(&config.jwt);
        Self {
            jwt,
            users,
            transactions,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        use crate::{
            config::{JwtConfig, DEFAULT_TOKEN_TTL_MINUTES},
            memory::{MemoryTransactionRepo, MemoryUserRepo},
        };

        let config = AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "memory".into(),
            max_connections: 1,
            jwt: JwtConfig {
                secret: "test-secret".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: DEFAULT_TOKEN_TTL_MINUTES,
            },
        };

        Self::from_parts(
            &config,
            Arc::new(MemoryUserRepo::default()),
            Arc::new(MemoryTransactionRepo::default()),
        )
    }
}
