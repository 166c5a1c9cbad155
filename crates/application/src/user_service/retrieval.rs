use wordhoard_domain::authorization::can_view;

use super::*;

impl UserService {
    /// Returns the profile of `user_id` as seen by `viewer_id`.
    pub async fn find_user(
        &self,
        ctx: &CallContext,
        viewer_id: UserId,
        user_id: UserId,
    ) -> AppResult<UserProfile> {
        self.transactions
            .with_tx(ctx, |tx| async move {
                let session = tx.require_session()?;
                let viewer = self.load_editor(session, viewer_id).await?;
                let user = self
                    .stores
                    .users
                    .find_by_id(session, user_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("user '{user_id}' not found")))?;

                if !can_view(&viewer, &user).is_allowed() {
                    return Err(AppError::Unauthorized(
                        "not allowed to view this user".to_owned(),
                    ));
                }

                Ok(UserProfile::from(&user))
            })
            .await
    }
}
