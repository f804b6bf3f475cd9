use std::sync::Arc;

use diesel::pg::PgConnection;

use crate::{
    auth::jwt::JwtService,
    config::AppConfig,
    db::PgPool,
    error::{AppError, AppResult},
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    pub jwt: JwtService,
}

impl AppState {
    pub fn new(pool: PgPool, config: AppConfig, jwt: JwtService) -> Self {
        Self {
            pool,
            config: Arc::new(config),
            jwt,
        }
    }

    /// Runs `f` on a pooled connection inside the blocking thread pool, so
    /// row locks held by a workflow transaction never stall the async runtime.
    pub async fn run<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&mut PgConnection) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool
                .get()
                .map_err(|err| AppError::internal(format!("database pool error: {err}")))?;
            f(&mut conn)
        })
        .await
        .map_err(|err| AppError::internal(format!("database task failed: {err}")))?
    }
}
