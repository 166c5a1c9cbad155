use super::*;

impl PostgresUserRepository {
    pub(super) async fn find_by_id_impl(
        &self,
        session: &Session,
        user_id: UserId,
        lock_row: bool,
    ) -> AppResult<Option<User>> {
        let mut sql =
            format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1 AND deleted_at IS NULL");
        if lock_row {
            sql.push_str(" FOR UPDATE");
        }

        let mut connection = lock_session(session).await?;
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(user_id.as_uuid())
            .fetch_optional(connection.connection()?)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to find user '{user_id}': {error}"))
            })?;

        Ok(row.map(User::from))
    }

    pub(super) async fn exists_impl(
        &self,
        session: &Session,
        user_id: UserId,
        test_only: bool,
    ) -> AppResult<bool> {
        let mut connection = lock_session(session).await?;
        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM users
                WHERE id = $1 AND deleted_at IS NULL AND (is_test OR NOT $2)
            )
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(test_only)
        .fetch_one(connection.connection()?)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to look up user '{user_id}': {error}"))
        })
    }
}
