use serde::{Deserialize, Serialize};
use ts_rs::TS;
use wordhoard_application::SignupOutcome;
use wordhoard_domain::UserProfile;

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
    pub postgres: &'static str,
}

/// Incoming payload for email and password registration.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/sign-up-request.ts"
)]
pub struct SignUpRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    #[ts(optional)]
    pub name: Option<String>,
}

/// Incoming payload finishing an external-provider sign-up.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/complete-sign-up-request.ts"
)]
pub struct CompleteSignUpRequest {
    pub signup_token: String,
    #[serde(default)]
    #[ts(optional)]
    pub password: Option<String>,
}

/// Sparse user update; absent fields are left unchanged.
#[derive(Debug, Default, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/update-user-request.ts"
)]
pub struct UpdateUserRequest {
    #[serde(default)]
    #[ts(optional)]
    pub name: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub email: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub password_current: Option<String>,
    #[serde(default)]
    #[ts(optional)]
    pub password_new: Option<String>,
    /// `admin` or `user`.
    #[serde(default)]
    #[ts(optional)]
    pub role: Option<String>,
}

/// API representation of a user.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-response.ts"
)]
pub struct UserResponse {
    pub id: String,
    pub email: Option<String>,
    pub name: String,
    pub has_password: bool,
    pub is_root: bool,
    pub is_admin: bool,
    pub is_test: bool,
}

impl From<UserProfile> for UserResponse {
    fn from(value: UserProfile) -> Self {
        Self {
            id: value.id.to_string(),
            email: value.email,
            name: value.name,
            has_password: value.has_password,
            is_root: value.is_root,
            is_admin: value.is_admin,
            is_test: value.is_test,
        }
    }
}

/// Newly created account with its bearer token.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/session-response.ts"
)]
pub struct SessionResponse {
    pub token: String,
    pub user: UserResponse,
}

impl From<SignupOutcome> for SessionResponse {
    fn from(value: SignupOutcome) -> Self {
        Self {
            token: value.session_token,
            user: UserResponse::from(value.user),
        }
    }
}
