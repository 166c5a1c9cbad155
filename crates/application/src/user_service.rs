//! Guarded user mutations.
//!
//! Every operation loads actor and target inside the same unit of work that
//! performs the write, so policy checks never run against stale state.

use std::sync::Arc;

use tracing::info;
use wordhoard_core::{AppError, AppResult};
use wordhoard_domain::{Actor, User, UserId, UserProfile};

use crate::{CallContext, PasswordHasher, Session, TransactionManager, UserStores};

mod delete;
mod retrieval;
mod update;


/// Input for [`UserService::update_user`].
///
/// `None` leaves the corresponding field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// Authenticated caller.
    pub editor_id: UserId,
    /// User being edited.
    pub target_id: UserId,
    /// New display name, trimmed before validation.
    pub name: Option<String>,
    /// New email, trimmed and lower-cased before validation.
    pub email: Option<String>,
    /// Current password, required for self-service changes of an existing password.
    pub password_current: Option<String>,
    /// New password.
    pub password_new: Option<String>,
    /// New role, `admin` or `user`.
    pub role: Option<String>,
}

/// Application service for authorization-guarded user mutations.
#[derive(Clone)]
pub struct UserService {
    transactions: TransactionManager,
    stores: UserStores,
    password_hasher: Arc<dyn PasswordHasher>,
}

impl UserService {
    /// Creates a new user service.
    #[must_use]
    pub fn new(
        transactions: TransactionManager,
        stores: UserStores,
        password_hasher: Arc<dyn PasswordHasher>,
    ) -> Self {
        Self {
            transactions,
            stores,
            password_hasher,
        }
    }

    /// Fails with `Unauthorized` when a session's user no longer exists.
    pub async fn ensure_active_user(&self, ctx: &CallContext, user_id: UserId) -> AppResult<()> {
        let exists = self
            .transactions
            .with_tx(ctx, |tx| async move {
                self.stores
                    .users
                    .exists(tx.require_session()?, user_id)
                    .await
            })
            .await?;

        if !exists {
            return Err(AppError::Unauthorized(
                "session user no longer exists".to_owned(),
            ));
        }

        Ok(())
    }

    async fn load_editor(&self, session: &Session, editor_id: UserId) -> AppResult<Actor> {
        let editor = self
            .stores
            .users
            .find_by_id(session, editor_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{editor_id}' not found")))?;

        Ok(Actor::from(&editor))
    }

    async fn load_target(&self, session: &Session, target_id: UserId) -> AppResult<User> {
        self.stores
            .users
            .find_for_update(session, target_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user '{target_id}' not found")))
    }
}

fn log_profile_change(editor: &Actor, profile: &UserProfile, fields: &[&'static str]) {
    info!(
        editor_id = %editor.user_id,
        target_id = %profile.id,
        fields = ?fields,
        "user updated"
    );
}
