//! PostgreSQL-backed user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use wordhoard_application::{Session, UserRepository};
use wordhoard_core::{AppError, AppResult};
use wordhoard_domain::{NewUser, User, UserId, UserUpdateFields};

use crate::postgres_transaction_backend::lock_session;

/// PostgreSQL implementation of the user repository port.
///
/// Stateless: every statement runs on the transaction carried by the
/// session it is given.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostgresUserRepository;

impl PostgresUserRepository {
    /// Creates a repository.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

const USER_COLUMNS: &str =
    "id, email, name, password_hash, is_root, is_admin, is_test, created_at, deleted_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: uuid::Uuid,
    email: Option<String>,
    name: String,
    password_hash: Option<String>,
    is_root: bool,
    is_admin: bool,
    is_test: bool,
    created_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::from_uuid(row.id),
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            is_root: row.is_root,
            is_admin: row.is_admin,
            is_test: row.is_test,
            created_at: row.created_at,
            deleted_at: row.deleted_at,
        }
    }
}

mod account;
mod lookup;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, session: &Session, user_id: UserId) -> AppResult<Option<User>> {
        self.find_by_id_impl(session, user_id, false).await
    }

    async fn find_for_update(
        &self,
        session: &Session,
        user_id: UserId,
    ) -> AppResult<Option<User>> {
        self.find_by_id_impl(session, user_id, true).await
    }

    async fn create(&self, session: &Session, user: &NewUser) -> AppResult<User> {
        self.create_impl(session, user).await
    }

    async fn update_partial(
        &self,
        session: &Session,
        user_id: UserId,
        fields: &UserUpdateFields,
    ) -> AppResult<User> {
        self.update_partial_impl(session, user_id, fields).await
    }

    async fn soft_delete_by_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()> {
        self.soft_delete_by_id_impl(session, user_id, at).await
    }

    async fn delete_if_test_user(&self, session: &Session, user_id: UserId) -> AppResult<bool> {
        self.delete_if_test_user_impl(session, user_id).await
    }

    async fn exists(&self, session: &Session, user_id: UserId) -> AppResult<bool> {
        self.exists_impl(session, user_id, false).await
    }

    async fn is_test_user(&self, session: &Session, user_id: UserId) -> AppResult<bool> {
        self.exists_impl(session, user_id, true).await
    }
}

fn email_conflict_or_internal(error: sqlx::Error, operation: &str) -> AppError {
    if let sqlx::Error::Database(ref database_error) = error
        && database_error.code().as_deref() == Some("23505")
    {
        return AppError::Conflict("an account with this email already exists".to_owned());
    }

    AppError::Internal(format!("failed to {operation}: {error}"))
}
