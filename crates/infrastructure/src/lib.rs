//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod argon2_password_hasher;
mod jwt_token_service;
mod postgres_external_auth_repository;
mod postgres_transaction_backend;
mod postgres_user_config_repository;
mod postgres_user_repository;

#[cfg(test)]
mod test_database;

pub use argon2_password_hasher::Argon2PasswordHasher;
pub use jwt_token_service::{JwtTokenService, MIN_SECRET_LENGTH};
pub use postgres_external_auth_repository::PostgresExternalAuthRepository;
pub use postgres_transaction_backend::PostgresTransactionBackend;
pub use postgres_user_config_repository::PostgresUserConfigRepository;
pub use postgres_user_repository::PostgresUserRepository;
