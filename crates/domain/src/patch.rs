//! Sparse update payloads for user records.

use std::str::FromStr;

use wordhoard_core::{AppError, AppResult};

/// One field of a sparse patch.
///
/// `Present(String::new())` is a real value and is written as such; only
/// `Absent` leaves the stored column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Patch<T> {
    /// Leave the stored value unchanged.
    #[default]
    Absent,
    /// Overwrite the stored value.
    Present(T),
}

impl<T> Patch<T> {
    /// Returns `true` when the patch carries a value.
    #[must_use]
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }
}

impl<T> From<Option<T>> for Patch<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Absent, Self::Present)
    }
}

/// Columns a service may change on an existing user.
///
/// This is the only shape handed to the repository's partial update so a
/// service cannot overwrite a column it did not mean to touch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdateFields {
    /// New display name.
    pub name: Patch<String>,
    /// New canonical email.
    pub email: Patch<String>,
    /// New password hash.
    pub password_hash: Patch<String>,
    /// New admin flag.
    pub is_admin: Patch<bool>,
}

impl UserUpdateFields {
    /// Returns `true` when no column would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        !self.name.is_present()
            && !self.email.is_present()
            && !self.password_hash.is_present()
            && !self.is_admin.is_present()
    }

    /// Lists the names of the columns that would change, for logging.
    #[must_use]
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.name.is_present() {
            fields.push("name");
        }
        if self.email.is_present() {
            fields.push("email");
        }
        if self.password_hash.is_present() {
            fields.push("password");
        }
        if self.is_admin.is_present() {
            fields.push("role");
        }
        fields
    }
}

/// Role an authorized root account may assign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleChange {
    /// Grant the admin flag.
    Admin,
    /// Revoke the admin flag.
    User,
}

impl RoleChange {
    /// Returns the admin flag this role maps to.
    #[must_use]
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Parses a transport value, reporting unknown roles against the `role` field.
    pub fn parse(value: &str) -> AppResult<Self> {
        Self::from_str(value)
    }
}

impl FromStr for RoleChange {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "admin" => Ok(Self::Admin),
            "user" => Ok(Self::User),
            _ => Err(AppError::invalid_field(
                "role",
                format!("unknown role '{value}', expected 'admin' or 'user'"),
            )),
        }
    }
}
