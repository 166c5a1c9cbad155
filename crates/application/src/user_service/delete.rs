use chrono::Utc;
use tracing::debug;
use wordhoard_domain::authorization::can_delete;

use super::*;

impl UserService {
    /// Deletes `target_id` on behalf of `editor_id`.
    ///
    /// Regular users are soft-deleted together with their external-auth
    /// links and settings, all stamped with one timestamp; ephemeral test
    /// users are removed physically. A user that is already deleted is no
    /// longer visible and yields `NotFound` on every further call.
    pub async fn delete_user(
        &self,
        ctx: &CallContext,
        editor_id: UserId,
        target_id: UserId,
    ) -> AppResult<()> {
        self.transactions
            .with_tx(ctx, |tx| async move {
                let session = tx.require_session()?;
                let editor = self.load_editor(session, editor_id).await?;
                let target = self.load_target(session, target_id).await?;

                if !can_delete(&editor, &target).is_allowed() {
                    return Err(AppError::Unauthorized(
                        "not allowed to delete this user".to_owned(),
                    ));
                }

                if target.is_test
                    && self
                        .stores
                        .users
                        .delete_if_test_user(session, target.id)
                        .await?
                {
                    info!(editor_id = %editor_id, target_id = %target_id, "test user removed");
                    return Ok(());
                }

                let deleted_at = Utc::now();
                self.stores
                    .external_auths
                    .soft_delete_by_user_id(session, target.id, deleted_at)
                    .await?;
                self.stores
                    .user_configs
                    .soft_delete_by_user_id(session, target.id, deleted_at)
                    .await?;
                self.stores
                    .users
                    .soft_delete_by_id(session, target.id, deleted_at)
                    .await?;

                info!(editor_id = %editor_id, target_id = %target_id, "user soft-deleted");
                Ok(())
            })
            .await
    }

    /// Removes an ephemeral test account when its session ends.
    ///
    /// Returns `false` and leaves the record alone for regular users.
    pub async fn delete_test_user(&self, ctx: &CallContext, user_id: UserId) -> AppResult<bool> {
        self.transactions
            .with_tx(ctx, |tx| async move {
                let session = tx.require_session()?;
                if !self.stores.users.is_test_user(session, user_id).await? {
                    debug!(user_id = %user_id, "not a test user; nothing to remove");
                    return Ok(false);
                }

                let removed = self.stores.users.delete_if_test_user(session, user_id).await?;
                if removed {
                    info!(user_id = %user_id, "test user removed on sign-out");
                }
                Ok(removed)
            })
            .await
    }
}
