//! Application services and ports.

#![forbid(unsafe_code)]

mod signup_service;
mod unit_of_work;
mod user_ports;
mod user_service;

#[cfg(test)]
mod test_support;

pub use signup_service::{
    FALLBACK_DISPLAY_NAME, SignUpInput, SignupOutcome, SignupService, TEST_USER_DISPLAY_NAME,
};
pub use unit_of_work::{CallContext, Session, TransactionBackend, TransactionManager, UnitOfWork};
pub use user_ports::{
    ExternalAuthRepository, IdentityTokenDecoder, PasswordHasher, SessionTokenIssuer,
    SignupClaims, UserConfigRepository, UserRepository, UserStores,
};
pub use user_service::{UpdateUserInput, UserService};
