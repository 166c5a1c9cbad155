use wordhoard_domain::authorization::{can_change_role, can_update};
use wordhoard_domain::{
    DisplayName, EmailAddress, Patch, RoleChange, UserUpdateFields, validate_password,
};

use super::*;

impl UserService {
    /// Applies a sparse profile update on behalf of `input.editor_id`.
    ///
    /// Everything runs in one unit of work: if any check fails nothing is
    /// written. A self-service password change must supply the current
    /// password when one is already set; accounts without a password may set
    /// their first one directly.
    pub async fn update_user(
        &self,
        ctx: &CallContext,
        input: UpdateUserInput,
    ) -> AppResult<UserProfile> {
        let unit_of_work = self.transactions.begin(ctx).await?;

        match self.update_user_in(unit_of_work.session()?, input).await {
            Ok(profile) => {
                unit_of_work.finish(true).await?;
                Ok(profile)
            }
            Err(update_error) => {
                unit_of_work.finish(false).await?;
                Err(update_error)
            }
        }
    }

    async fn update_user_in(
        &self,
        session: &Session,
        input: UpdateUserInput,
    ) -> AppResult<UserProfile> {
        let editor = self.load_editor(session, input.editor_id).await?;
        let target = self.load_target(session, input.target_id).await?;

        if !can_update(&editor, &target).is_allowed() {
            return Err(AppError::Unauthorized(
                "not allowed to update this user".to_owned(),
            ));
        }

        let mut fields = UserUpdateFields {
            name: input
                .name
                .map(|name| DisplayName::new(name).map(String::from))
                .transpose()?
                .into(),
            email: input
                .email
                .map(|email| EmailAddress::new(email).map(String::from))
                .transpose()?
                .into(),
            ..UserUpdateFields::default()
        };

        if let Some(password_new) = input.password_new.as_deref() {
            validate_password("password_new", password_new)?;

            let current_required = editor.user_id == target.id && target.has_password();
            if current_required {
                let Some(password_current) = input.password_current.as_deref() else {
                    return Err(AppError::invalid_field(
                        "password_current",
                        "current password is required to change the password",
                    ));
                };

                let stored_hash = target.password_hash.as_deref().unwrap_or_default();
                if !self
                    .password_hasher
                    .verify_password(password_current, stored_hash)?
                {
                    return Err(AppError::InvalidCredential(
                        "current password is incorrect".to_owned(),
                    ));
                }
            }

            fields.password_hash =
                Patch::Present(self.password_hasher.hash_password(password_new)?);
        }

        if let Some(role) = input.role.as_deref() {
            if !can_change_role(&editor, &target).is_allowed() {
                return Err(AppError::Unauthorized(
                    "not allowed to change the role of this user".to_owned(),
                ));
            }

            fields.is_admin = Patch::Present(RoleChange::parse(role)?.is_admin());
        }

        if fields.is_empty() {
            return Ok(UserProfile::from(&target));
        }

        let updated = self
            .stores
            .users
            .update_partial(session, target.id, &fields)
            .await?;
        let profile = UserProfile::from(&updated);
        log_profile_change(&editor, &profile, &fields.changed_fields());

        Ok(profile)
    }
}
