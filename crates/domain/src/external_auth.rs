use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wordhoard_core::NonEmptyString;

use crate::UserId;

/// Link between a user and a federated identity.
///
/// The `(provider, provider_subject)` pair is unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalAuth {
    /// Owning user.
    pub user_id: UserId,
    /// Identity provider key, e.g. `google`.
    pub provider: String,
    /// Subject claim issued by the provider.
    pub provider_subject: String,
    /// Soft-delete marker mirroring the owning user.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert payload for an external identity link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExternalAuth {
    /// Owning user.
    pub user_id: UserId,
    /// Identity provider key.
    pub provider: NonEmptyString,
    /// Subject claim issued by the provider.
    pub provider_subject: NonEmptyString,
}
