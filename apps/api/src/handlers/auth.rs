use axum::Json;
use axum::extract::{Extension, State};
use axum::http::StatusCode;
use wordhoard_application::SignUpInput;

use crate::dto::{CompleteSignUpRequest, SessionResponse, SignUpRequest};
use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::request_context::RequestContext;
use crate::state::AppState;

pub async fn sign_up_handler(
    State(state): State<AppState>,
    context: RequestContext,
    Json(payload): Json<SignUpRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let outcome = state
        .signup_service
        .sign_up(
            context.call(),
            SignUpInput {
                email: payload.email,
                password: payload.password,
                name: payload.name,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::from(outcome))))
}

pub async fn complete_sign_up_handler(
    State(state): State<AppState>,
    context: RequestContext,
    Json(payload): Json<CompleteSignUpRequest>,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let outcome = state
        .signup_service
        .complete_sign_up(
            context.call(),
            payload.signup_token.as_str(),
            payload.password,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::from(outcome))))
}

pub async fn create_test_user_handler(
    State(state): State<AppState>,
    context: RequestContext,
) -> ApiResult<(StatusCode, Json<SessionResponse>)> {
    let outcome = state
        .signup_service
        .create_test_user(context.call())
        .await?;

    Ok((StatusCode::CREATED, Json(SessionResponse::from(outcome))))
}

/// Session tokens are stateless; signing out only matters for test
/// accounts, which are removed here.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(user_id)): Extension<AuthenticatedUser>,
    context: RequestContext,
) -> ApiResult<StatusCode> {
    state
        .user_service
        .delete_test_user(context.call(), user_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
