use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wordhoard_core::AppError;

use crate::UserId;

/// Display theme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    /// Follow the operating system setting.
    #[default]
    System,
    /// Light theme.
    Light,
    /// Dark theme.
    Dark,
}

impl Theme {
    /// Returns the storage value.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

impl FromStr for Theme {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Self::System),
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            _ => Err(AppError::invalid_field(
                "theme",
                format!("unknown theme '{value}'"),
            )),
        }
    }
}

/// Per-user preferences, one row per user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserConfig {
    /// Owning user.
    pub user_id: UserId,
    /// Display theme.
    pub theme: Theme,
    /// Soft-delete marker mirroring the owning user.
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserConfig {
    /// Returns the defaults written at sign-up.
    #[must_use]
    pub fn default_for(user_id: UserId) -> Self {
        Self {
            user_id,
            theme: Theme::default(),
            deleted_at: None,
        }
    }
}
