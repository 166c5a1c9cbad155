//! User domain types and validation rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wordhoard_core::{AppError, AppResult};

/// Unique identifier for a user record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(Uuid);

impl UserId {
    /// Creates a new random user identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a user identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Parses a user identifier from its textual form.
    pub fn parse(value: &str) -> AppResult<Self> {
        Uuid::parse_str(value.trim())
            .map(Self)
            .map_err(|_| AppError::invalid_field("id", format!("'{value}' is not a valid user id")))
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for UserId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Maximum accepted email length (RFC 5321 path limit).
pub const EMAIL_MAX_LENGTH: usize = 254;

/// Validated email address, stored trimmed and lower-cased.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates a validated email address.
    ///
    /// The check is deliberately conservative: exactly one `@`, a non-empty
    /// local part, a dotted domain whose labels are non-empty, and no
    /// whitespace anywhere.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let normalized = value.as_ref().trim().to_lowercase();

        if normalized.is_empty() {
            return Err(AppError::invalid_field(
                "email",
                "email address must not be empty",
            ));
        }

        if normalized.chars().count() > EMAIL_MAX_LENGTH {
            return Err(AppError::invalid_field(
                "email",
                format!("email address must not exceed {EMAIL_MAX_LENGTH} characters"),
            ));
        }

        if normalized.chars().any(char::is_whitespace) {
            return Err(AppError::invalid_field(
                "email",
                "email address must not contain whitespace",
            ));
        }

        let Some((local, domain)) = normalized.split_once('@') else {
            return Err(AppError::invalid_field(
                "email",
                "email address must contain exactly one '@'",
            ));
        };

        if domain.contains('@') {
            return Err(AppError::invalid_field(
                "email",
                "email address must contain exactly one '@'",
            ));
        }

        if local.is_empty() {
            return Err(AppError::invalid_field(
                "email",
                "email local part must not be empty",
            ));
        }

        if !domain.contains('.') || domain.split('.').any(str::is_empty) {
            return Err(AppError::invalid_field(
                "email",
                "email domain must contain at least one '.' between non-empty labels",
            ));
        }

        Ok(Self(normalized))
    }

    /// Returns the local part, the text before `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split_once('@').map_or(self.0.as_str(), |(local, _)| local)
    }

    /// Returns the validated email string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Maximum display name length in characters.
pub const DISPLAY_NAME_MAX_LENGTH: usize = 64;

/// Trimmed, non-empty display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayName(String);

impl DisplayName {
    /// Creates a display name from raw user input.
    pub fn new(value: impl AsRef<str>) -> AppResult<Self> {
        let trimmed = value.as_ref().trim();

        if trimmed.is_empty() {
            return Err(AppError::invalid_field("name", "name must not be empty"));
        }

        if trimmed.chars().count() > DISPLAY_NAME_MAX_LENGTH {
            return Err(AppError::invalid_field(
                "name",
                format!("name must not exceed {DISPLAY_NAME_MAX_LENGTH} characters"),
            ));
        }

        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the display name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<DisplayName> for String {
    fn from(value: DisplayName) -> Self {
        value.0
    }
}

/// Maximum password length (protects the Argon2id hasher against DoS).
pub const PASSWORD_MAX_LENGTH: usize = 128;

/// Validates a plaintext password before it is hashed.
///
/// Strength rules are left to the client; the server only bounds the input.
pub fn validate_password(field: &str, password: &str) -> AppResult<()> {
    let char_count = password.chars().count();

    if char_count == 0 {
        return Err(AppError::invalid_field(field, "password must not be empty"));
    }

    if char_count > PASSWORD_MAX_LENGTH {
        return Err(AppError::invalid_field(
            field,
            format!("password must not exceed {PASSWORD_MAX_LENGTH} characters"),
        ));
    }

    Ok(())
}

/// Persisted user aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identifier.
    pub id: UserId,
    /// Canonical email, absent for accounts created through an external provider only.
    pub email: Option<String>,
    /// Display name.
    pub name: String,
    /// Argon2id hash, absent for accounts that never set a password.
    pub password_hash: Option<String>,
    /// Root accounts manage roles and other users.
    pub is_root: bool,
    /// Admin flag granted by a root account.
    pub is_admin: bool,
    /// Ephemeral trial account; immutable through the update path.
    pub is_test: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Soft-delete marker.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    /// Returns whether a non-empty password hash is stored.
    #[must_use]
    pub fn has_password(&self) -> bool {
        self.password_hash
            .as_deref()
            .is_some_and(|hash| !hash.is_empty())
    }

    /// Returns whether the record has been soft-deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Insert payload for a new user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    /// Pre-generated identifier.
    pub id: UserId,
    /// Canonical email, if known.
    pub email: Option<EmailAddress>,
    /// Display name.
    pub name: DisplayName,
    /// Password hash, if the user chose a password.
    pub password_hash: Option<String>,
    /// Whether this is an ephemeral trial account.
    pub is_test: bool,
}

/// Authenticated caller projection used by the authorization policy.
///
/// Never persisted; built from a freshly loaded [`User`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    /// Caller user id.
    pub user_id: UserId,
    /// Admin flag.
    pub is_admin: bool,
    /// Root flag.
    pub is_root: bool,
    /// Trial account flag.
    pub is_test: bool,
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            is_admin: user.is_admin,
            is_root: user.is_root,
            is_test: user.is_test,
        }
    }
}

/// Read projection returned to callers; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Stable identifier.
    pub id: UserId,
    /// Canonical email, if any.
    pub email: Option<String>,
    /// Display name.
    pub name: String,
    /// Whether a password is set.
    pub has_password: bool,
    /// Root flag.
    pub is_root: bool,
    /// Admin flag.
    pub is_admin: bool,
    /// Trial account flag.
    pub is_test: bool,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            has_password: user.has_password(),
            is_root: user.is_root,
            is_admin: user.is_admin,
            is_test: user.is_test,
        }
    }
}
