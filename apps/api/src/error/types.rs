use serde::Serialize;
use ts_rs::TS;

/// Machine-readable error class carried next to the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-code.ts"
)]
pub enum ErrorCode {
    Validation,
    InvalidCredential,
    NotFound,
    Conflict,
    Unauthorized,
    Internal,
}

/// API error payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/error-response.ts"
)]
pub struct ErrorResponse {
    code: ErrorCode,
    message: String,
    /// Offending input field for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    field: Option<String>,
}

impl ErrorResponse {
    pub(super) fn new(code: ErrorCode, message: String, field: Option<String>) -> Self {
        Self {
            code,
            message,
            field,
        }
    }
}
