//! PostgreSQL-backed per-user settings repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use wordhoard_application::{Session, UserConfigRepository};
use wordhoard_core::{AppError, AppResult};
use wordhoard_domain::{UserConfig, UserId};

use crate::postgres_transaction_backend::lock_session;

/// PostgreSQL implementation of the user config repository port.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostgresUserConfigRepository;

impl PostgresUserConfigRepository {
    /// Creates a repository.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl UserConfigRepository for PostgresUserConfigRepository {
    async fn create_default(&self, session: &Session, user_id: UserId) -> AppResult<UserConfig> {
        let config = UserConfig::default_for(user_id);

        let mut connection = lock_session(session).await?;
        sqlx::query(
            r#"
            INSERT INTO user_configs (user_id, theme)
            VALUES ($1, $2)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(config.theme.as_str())
        .execute(connection.connection()?)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(ref database_error) = error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict(format!("settings for user '{user_id}' already exist"));
            }

            AppError::Internal(format!(
                "failed to create settings for user '{user_id}': {error}"
            ))
        })?;

        Ok(config)
    }

    async fn soft_delete_by_user_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut connection = lock_session(session).await?;
        sqlx::query(
            r#"
            UPDATE user_configs
            SET deleted_at = $2, updated_at = now()
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .execute(connection.connection()?)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to soft-delete settings of user '{user_id}': {error}"
            ))
        })?;

        Ok(())
    }
}
