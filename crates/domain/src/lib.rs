//! Domain entities and invariants.

#![forbid(unsafe_code)]

/// Mutation policy for user records.
pub mod authorization;

mod external_auth;
mod patch;
mod settings;
mod user;

pub use authorization::Decision;
pub use external_auth::{ExternalAuth, NewExternalAuth};
pub use patch::{Patch, RoleChange, UserUpdateFields};
pub use settings::{Theme, UserConfig};
pub use user::{
    Actor, DISPLAY_NAME_MAX_LENGTH, DisplayName, EMAIL_MAX_LENGTH, EmailAddress, NewUser,
    PASSWORD_MAX_LENGTH, User, UserId, UserProfile, validate_password,
};
