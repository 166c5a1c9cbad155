//! PostgreSQL-backed external identity link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use wordhoard_application::{ExternalAuthRepository, Session};
use wordhoard_core::{AppError, AppResult};
use wordhoard_domain::{ExternalAuth, NewExternalAuth, UserId};

use crate::postgres_transaction_backend::lock_session;

/// PostgreSQL implementation of the external auth repository port.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostgresExternalAuthRepository;

impl PostgresExternalAuthRepository {
    /// Creates a repository.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[derive(Debug, FromRow)]
struct ExternalAuthRow {
    user_id: uuid::Uuid,
    provider: String,
    provider_subject: String,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<ExternalAuthRow> for ExternalAuth {
    fn from(row: ExternalAuthRow) -> Self {
        Self {
            user_id: UserId::from_uuid(row.user_id),
            provider: row.provider,
            provider_subject: row.provider_subject,
            deleted_at: row.deleted_at,
        }
    }
}

#[async_trait]
impl ExternalAuthRepository for PostgresExternalAuthRepository {
    async fn create(&self, session: &Session, link: &NewExternalAuth) -> AppResult<ExternalAuth> {
        let mut connection = lock_session(session).await?;
        let row = sqlx::query_as::<_, ExternalAuthRow>(
            r#"
            INSERT INTO external_auths (user_id, provider, provider_subject)
            VALUES ($1, $2, $3)
            RETURNING user_id, provider, provider_subject, deleted_at
            "#,
        )
        .bind(link.user_id.as_uuid())
        .bind(link.provider.as_str())
        .bind(link.provider_subject.as_str())
        .fetch_one(connection.connection()?)
        .await
        .map_err(|error| {
            if let sqlx::Error::Database(ref database_error) = error
                && database_error.code().as_deref() == Some("23505")
            {
                return AppError::Conflict("this external identity is already linked".to_owned());
            }

            AppError::Internal(format!(
                "failed to link external identity for user '{}': {error}",
                link.user_id
            ))
        })?;

        Ok(ExternalAuth::from(row))
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
            UPDATE external_auths
            SET deleted_at = $2
            WHERE user_id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .execute(connection.connection()?)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to soft-delete external identities of user '{user_id}': {error}"
            ))
        })?;

        Ok(())
    }
}
