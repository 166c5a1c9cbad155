use std::sync::Arc;

use sqlx::PgPool;
use wordhoard_application::{SignupService, UserService};
use wordhoard_infrastructure::JwtTokenService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub signup_service: SignupService,
    pub tokens: Arc<JwtTokenService>,
    pub pool: PgPool,
}
