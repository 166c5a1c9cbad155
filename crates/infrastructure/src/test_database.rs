//! Shared PostgreSQL fixture for adapter tests.
//!
//! Tests are skipped when `DATABASE_URL` is unset.

use std::sync::Arc;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use wordhoard_application::{TransactionManager, UserStores};

use crate::{
    PostgresExternalAuthRepository, PostgresTransactionBackend, PostgresUserConfigRepository,
    PostgresUserRepository,
};

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub(crate) async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(4)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres adapter tests: {error}");
    }

    Some(pool)
}

pub(crate) fn transactions(pool: &PgPool) -> TransactionManager {
    TransactionManager::new(Arc::new(PostgresTransactionBackend::new(pool.clone())))
}

pub(crate) fn stores() -> UserStores {
    UserStores {
        users: Arc::new(PostgresUserRepository::new()),
        external_auths: Arc::new(PostgresExternalAuthRepository::new()),
        user_configs: Arc::new(PostgresUserConfigRepository::new()),
    }
}

pub(crate) async fn count_where_user(pool: &PgPool, sql: &str, user_id: uuid::Uuid) -> i64 {
    match sqlx::query_scalar::<_, i64>(sql)
        .bind(user_id)
        .fetch_one(pool)
        .await
    {
        Ok(count) => count,
        Err(error) => panic!("failed to count rows with '{sql}': {error}"),
    }
}
