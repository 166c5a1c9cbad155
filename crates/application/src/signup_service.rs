//! Account creation flows.
//!
//! Each flow persists the user and everything it owns inside one unit of
//! work and only issues a session token after the commit succeeded.

use std::sync::Arc;

use tracing::info;
use wordhoard_core::{AppResult, NonEmptyString};
use wordhoard_domain::{
    DISPLAY_NAME_MAX_LENGTH, DisplayName, EmailAddress, NewExternalAuth, NewUser, UserId,
    UserProfile, validate_password,
};

use crate::{
    CallContext, IdentityTokenDecoder, PasswordHasher, SessionTokenIssuer, SignupClaims,
    TransactionManager, UserStores,
};


/// Display name used when neither the caller nor the provider supplied one.
pub const FALLBACK_DISPLAY_NAME: &str = "Learner";

/// Display name given to ephemeral test accounts.
pub const TEST_USER_DISPLAY_NAME: &str = "Guest";

/// Input for [`SignupService::sign_up`].
#[derive(Debug, Clone)]
pub struct SignUpInput {
    /// Email address for the new account.
    pub email: String,
    /// Plaintext password.
    pub password: String,
    /// Optional display name; defaults to the email local part.
    pub name: Option<String>,
}

/// Newly created account with its session token.
#[derive(Debug, Clone)]
pub struct SignupOutcome {
    /// Persisted user.
    pub user: UserProfile,
    /// Long-lived session token keyed on the new user id.
    pub session_token: String,
}

/// Application service for account creation.
#[derive(Clone)]
pub struct SignupService {
    transactions: TransactionManager,
    stores: UserStores,
    password_hasher: Arc<dyn PasswordHasher>,
    identity_tokens: Arc<dyn IdentityTokenDecoder>,
    session_tokens: Arc<dyn SessionTokenIssuer>,
}

impl SignupService {
    /// Creates a new sign-up service.
    #[must_use]
    pub fn new(
        transactions: TransactionManager,
        stores: UserStores,
        password_hasher: Arc<dyn PasswordHasher>,
        identity_tokens: Arc<dyn IdentityTokenDecoder>,
        session_tokens: Arc<dyn SessionTokenIssuer>,
    ) -> Self {
        Self {
            transactions,
            stores,
            password_hasher,
            identity_tokens,
            session_tokens,
        }
    }

    /// Turns a sign-up token from an external-provider exchange into a
    /// persisted user, its identity link, and default settings.
    ///
    /// Token failures are reported before any unit of work is opened.
    pub async fn complete_sign_up(
        &self,
        ctx: &CallContext,
        signup_token: &str,
        password: Option<String>,
    ) -> AppResult<SignupOutcome> {
        let claims = self.identity_tokens.decode_signup_token(signup_token)?;
        let SignupClaims {
            provider,
            subject,
            email,
            name,
        } = claims;

        let email = email
            .filter(|value| !value.trim().is_empty())
            .map(EmailAddress::new)
            .transpose()?;
        let name = suggested_display_name(name.as_deref(), email.as_ref())?;
        let password_hash = self.hash_optional_password(password.as_deref())?;

        let new_user = NewUser {
            id: UserId::new(),
            email,
            name,
            password_hash,
            is_test: false,
        };
        let link = NewExternalAuth {
            user_id: new_user.id,
            provider: NonEmptyString::new(provider)?,
            provider_subject: NonEmptyString::new(subject)?,
        };

        let user = self
            .transactions
            .with_tx(ctx, |tx| async move {
                let session = tx.require_session()?;
                let user = self.stores.users.create(session, &new_user).await?;
                self.stores.external_auths.create(session, &link).await?;
                self.stores
                    .user_configs
                    .create_default(session, user.id)
                    .await?;
                Ok(user)
            })
            .await?;

        info!(user_id = %user.id, "sign-up completed through external provider");
        self.issue(UserProfile::from(&user))
    }

    /// Registers an account with email and password.
    pub async fn sign_up(&self, ctx: &CallContext, input: SignUpInput) -> AppResult<SignupOutcome> {
        let email = EmailAddress::new(&input.email)?;
        let name = resolve_display_name(input.name, Some(&email))?;
        let password_hash = self.hash_optional_password(Some(input.password.as_str()))?;

        let new_user = NewUser {
            id: UserId::new(),
            email: Some(email),
            name,
            password_hash,
            is_test: false,
        };

        let user = self
            .transactions
            .with_tx(ctx, |tx| async move {
                let session = tx.require_session()?;
                let user = self.stores.users.create(session, &new_user).await?;
                self.stores
                    .user_configs
                    .create_default(session, user.id)
                    .await?;
                Ok(user)
            })
            .await?;

        info!(user_id = %user.id, "user signed up");
        self.issue(UserProfile::from(&user))
    }

    /// Creates an ephemeral test account that can try the app without
    /// registering. It is removed again when its session ends.
    pub async fn create_test_user(&self, ctx: &CallContext) -> AppResult<SignupOutcome> {
        let new_user = NewUser {
            id: UserId::new(),
            email: None,
            name: DisplayName::new(TEST_USER_DISPLAY_NAME)?,
            password_hash: None,
            is_test: true,
        };

        let user = self
            .transactions
            .with_tx(ctx, |tx| async move {
                let session = tx.require_session()?;
                let user = self.stores.users.create(session, &new_user).await?;
                self.stores
                    .user_configs
                    .create_default(session, user.id)
                    .await?;
                Ok(user)
            })
            .await?;

        info!(user_id = %user.id, "test user created");
        self.issue(UserProfile::from(&user))
    }

    fn hash_optional_password(&self, password: Option<&str>) -> AppResult<Option<String>> {
        password
            .map(|password| {
                validate_password("password", password)?;
                self.password_hasher.hash_password(password)
            })
            .transpose()
    }

    fn issue(&self, user: UserProfile) -> AppResult<SignupOutcome> {
        let session_token = self.session_tokens.issue_session_token(user.id)?;
        Ok(SignupOutcome {
            user,
            session_token,
        })
    }
}

fn resolve_display_name(
    name: Option<String>,
    email: Option<&EmailAddress>,
) -> AppResult<DisplayName> {
    match name.filter(|value| !value.trim().is_empty()) {
        Some(name) => DisplayName::new(name),
        None => suggested_display_name(None, email),
    }
}

/// Picks the provider suggestion, then the email local part, cut to the
/// display name limit; falls back to [`FALLBACK_DISPLAY_NAME`].
fn suggested_display_name(
    suggestion: Option<&str>,
    email: Option<&EmailAddress>,
) -> AppResult<DisplayName> {
    suggestion
        .into_iter()
        .chain(email.map(EmailAddress::local_part))
        .find_map(|candidate| {
            let truncated: String = candidate
                .trim()
                .chars()
                .take(DISPLAY_NAME_MAX_LENGTH)
                .collect();
            DisplayName::new(truncated).ok()
        })
        .map_or_else(|| DisplayName::new(FALLBACK_DISPLAY_NAME), Ok)
}
