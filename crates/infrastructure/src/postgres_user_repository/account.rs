use sqlx::{Postgres, QueryBuilder};
use wordhoard_domain::Patch;

use super::*;

impl PostgresUserRepository {
    pub(super) async fn create_impl(&self, session: &Session, user: &NewUser) -> AppResult<User> {
        let mut connection = lock_session(session).await?;
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, is_test)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id.as_uuid())
        .bind(user.email.as_ref().map(|email| email.as_str()))
        .bind(user.name.as_str())
        .bind(user.password_hash.as_deref())
        .bind(user.is_test)
        .fetch_one(connection.connection()?)
        .await
        .map_err(|error| email_conflict_or_internal(error, "create user"))?;

        Ok(User::from(row))
    }

    pub(super) async fn update_partial_impl(
        &self,
        session: &Session,
        user_id: UserId,
        fields: &UserUpdateFields,
    ) -> AppResult<User> {
        let mut builder: QueryBuilder<'_, Postgres> =
            QueryBuilder::new("UPDATE users SET updated_at = now()");

        if let Patch::Present(name) = &fields.name {
            builder.push(", name = ");
            builder.push_bind(name.as_str());
        }
        if let Patch::Present(email) = &fields.email {
            builder.push(", email = ");
            builder.push_bind(email.as_str());
        }
        if let Patch::Present(password_hash) = &fields.password_hash {
            builder.push(", password_hash = ");
            builder.push_bind(password_hash.as_str());
        }
        if let Patch::Present(is_admin) = fields.is_admin {
            builder.push(", is_admin = ");
            builder.push_bind(is_admin);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(user_id.as_uuid());
        builder.push(" AND deleted_at IS NULL RETURNING ");
        builder.push(USER_COLUMNS);

        let mut connection = lock_session(session).await?;
        let row = builder
            .build_query_as::<UserRow>()
            .fetch_optional(connection.connection()?)
            .await
            .map_err(|error| email_conflict_or_internal(error, "update user"))?
            .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;

        Ok(User::from(row))
    }

    pub(super) async fn soft_delete_by_id_impl(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        let mut connection = lock_session(session).await?;
        sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = $2, updated_at = now()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(at)
        .execute(connection.connection()?)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to soft-delete user '{user_id}': {error}"))
        })?;

        Ok(())
    }

    pub(super) async fn delete_if_test_user_impl(
        &self,
        session: &Session,
        user_id: UserId,
    ) -> AppResult<bool> {
        // Links and settings go with the row through ON DELETE CASCADE.
        let mut connection = lock_session(session).await?;
        let result = sqlx::query("DELETE FROM users WHERE id = $1 AND is_test")
            .bind(user_id.as_uuid())
            .execute(connection.connection()?)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete test user '{user_id}': {error}"))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
