//! Ports consumed by the user mutation services.
//!
//! Every record-level operation takes the [`Session`] of the unit of work it
//! runs in; adapters must execute on that session's transaction and nowhere
//! else.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use wordhoard_core::AppResult;
use wordhoard_domain::{
    ExternalAuth, NewExternalAuth, NewUser, User, UserConfig, UserId, UserUpdateFields,
};

use crate::Session;

/// Repository port for user persistence.
///
/// Lookups never return soft-deleted rows.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a live user by id.
    async fn find_by_id(&self, session: &Session, user_id: UserId) -> AppResult<Option<User>>;

    /// Finds a live user by id and locks the row for the rest of the
    /// transaction.
    async fn find_for_update(&self, session: &Session, user_id: UserId)
    -> AppResult<Option<User>>;

    /// Inserts a new user. Duplicate emails surface as `Conflict`.
    async fn create(&self, session: &Session, user: &NewUser) -> AppResult<User>;

    /// Writes only the columns present in `fields` and returns the refreshed
    /// row. Missing or soft-deleted users surface as `NotFound`.
    async fn update_partial(
        &self,
        session: &Session,
        user_id: UserId,
        fields: &UserUpdateFields,
    ) -> AppResult<User>;

    /// Marks a user as deleted at `at`. Already deleted rows keep their
    /// original timestamp.
    async fn soft_delete_by_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;

    /// Physically removes a user together with its links and settings, but
    /// only when it is a test user. Returns whether a row was removed.
    async fn delete_if_test_user(&self, session: &Session, user_id: UserId) -> AppResult<bool>;

    /// Returns whether a live user with this id exists.
    async fn exists(&self, session: &Session, user_id: UserId) -> AppResult<bool>;

    /// Returns whether a live test user with this id exists.
    async fn is_test_user(&self, session: &Session, user_id: UserId) -> AppResult<bool>;
}

/// Repository port for federated identity links.
#[async_trait]
pub trait ExternalAuthRepository: Send + Sync {
    /// Inserts a link. A reused `(provider, subject)` pair surfaces as `Conflict`.
    async fn create(&self, session: &Session, link: &NewExternalAuth) -> AppResult<ExternalAuth>;

    /// Soft-deletes every live link owned by `user_id`.
    async fn soft_delete_by_user_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// Repository port for per-user settings.
#[async_trait]
pub trait UserConfigRepository: Send + Sync {
    /// Inserts the default settings row for a new user.
    async fn create_default(&self, session: &Session, user_id: UserId) -> AppResult<UserConfig>;

    /// Soft-deletes the settings row owned by `user_id`.
    async fn soft_delete_by_user_id(
        &self,
        session: &Session,
        user_id: UserId,
        at: DateTime<Utc>,
    ) -> AppResult<()>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    /// Must run in constant time regardless of validity.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Identity asserted by a short-lived sign-up token after a successful
/// external-provider exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupClaims {
    /// Identity provider key.
    pub provider: String,
    /// Provider subject claim.
    pub subject: String,
    /// Email suggested by the provider, unvalidated.
    pub email: Option<String>,
    /// Display name suggested by the provider.
    pub name: Option<String>,
}

/// Port decoding sign-up tokens.
pub trait IdentityTokenDecoder: Send + Sync {
    /// Validates the token and extracts its claims. Invalid or expired tokens
    /// surface as `Unauthorized`.
    fn decode_signup_token(&self, token: &str) -> AppResult<SignupClaims>;
}

/// Port issuing long-lived session tokens.
pub trait SessionTokenIssuer: Send + Sync {
    /// Issues a session token for `user_id`.
    fn issue_session_token(&self, user_id: UserId) -> AppResult<String>;
}

/// Repository ports shared by the user services.
#[derive(Clone)]
pub struct UserStores {
    /// User rows.
    pub users: Arc<dyn UserRepository>,
    /// Federated identity links.
    pub external_auths: Arc<dyn ExternalAuthRepository>,
    /// Per-user settings.
    pub user_configs: Arc<dyn UserConfigRepository>,
}
