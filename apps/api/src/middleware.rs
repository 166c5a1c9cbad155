use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use wordhoard_core::AppError;
use wordhoard_domain::UserId;

use crate::error::ApiResult;
use crate::request_context::RequestContext;
use crate::state::AppState;

/// Caller resolved from a verified session token.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser(pub UserId);

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = bearer_token(request.headers())
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;
    let user_id = state.tokens.verify_session_token(token)?;

    // Tokens outlive accounts; a deleted user must not keep acting.
    let context = RequestContext::new();
    state
        .user_service
        .ensure_active_user(context.call(), user_id)
        .await?;

    request.extensions_mut().insert(AuthenticatedUser(user_id));
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();

    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
