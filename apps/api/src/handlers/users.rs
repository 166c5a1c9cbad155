use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use wordhoard_application::UpdateUserInput;
use wordhoard_domain::UserId;

use crate::dto::{UpdateUserRequest, UserResponse};
use crate::error::ApiResult;
use crate::middleware::AuthenticatedUser;
use crate::request_context::RequestContext;
use crate::state::AppState;

pub async fn get_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(viewer_id)): Extension<AuthenticatedUser>,
    context: RequestContext,
    Path(user_id): Path<String>,
) -> ApiResult<Json<UserResponse>> {
    let user_id = UserId::parse(&user_id)?;
    let profile = state
        .user_service
        .find_user(context.call(), viewer_id, user_id)
        .await?;

    Ok(Json(UserResponse::from(profile)))
}

pub async fn update_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(editor_id)): Extension<AuthenticatedUser>,
    context: RequestContext,
    Path(user_id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> ApiResult<Json<UserResponse>> {
    let target_id = UserId::parse(&user_id)?;
    let profile = state
        .user_service
        .update_user(
            context.call(),
            UpdateUserInput {
                editor_id,
                target_id,
                name: payload.name,
                email: payload.email,
                password_current: payload.password_current,
                password_new: payload.password_new,
                role: payload.role,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(profile)))
}

pub async fn delete_user_handler(
    State(state): State<AppState>,
    Extension(AuthenticatedUser(editor_id)): Extension<AuthenticatedUser>,
    context: RequestContext,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    let target_id = UserId::parse(&user_id)?;
    state
        .user_service
        .delete_user(context.call(), editor_id, target_id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
