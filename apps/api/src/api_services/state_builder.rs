use std::sync::Arc;

use sqlx::PgPool;
use wordhoard_application::{
    PasswordHasher, SignupService, TransactionManager, UserService, UserStores,
};
use wordhoard_core::AppError;
use wordhoard_infrastructure::{
    Argon2PasswordHasher, JwtTokenService, PostgresExternalAuthRepository,
    PostgresTransactionBackend, PostgresUserConfigRepository, PostgresUserRepository,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

pub fn build_app_state(pool: PgPool, config: &ApiConfig) -> Result<AppState, AppError> {
    let transactions =
        TransactionManager::new(Arc::new(PostgresTransactionBackend::new(pool.clone())));
    let stores = UserStores {
        users: Arc::new(PostgresUserRepository::new()),
        external_auths: Arc::new(PostgresExternalAuthRepository::new()),
        user_configs: Arc::new(PostgresUserConfigRepository::new()),
    };
    let password_hasher: Arc<dyn PasswordHasher> = Arc::new(Argon2PasswordHasher::new());
    let tokens = Arc::new(JwtTokenService::new(
        &config.jwt_secret,
        config.session_token_ttl,
    )?);

    Ok(AppState {
        user_service: UserService::new(
            transactions.clone(),
            stores.clone(),
            password_hasher.clone(),
        ),
        signup_service: SignupService::new(
            transactions,
            stores,
            password_hasher,
            tokens.clone(),
            tokens.clone(),
        ),
        tokens,
        pool,
    })
}
