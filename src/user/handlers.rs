use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::auth::extractors::CurrentUser;
use crate::auth::repo_types::{PermissionGrant, User, UserSummary};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use crate::user::dto::{EnableTwoFactorRequest, RoleInfo, TwoFactorResponse, UserInfoResponse};
use crate::user::services;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/user", get(list_users))
        .route("/user/info", get(user_info))
        .route("/user/:id", get(user_by_id))
        .route("/user/2fa/enable", patch(toggle_two_factor))
}

#[instrument(skip(state))]
async fn list_users(State(state): State<AppState>) -> ApiResult<Json<Vec<UserSummary>>> {
    Ok(Json(User::list(&state.db).await?))
}

#[instrument(skip(state))]
async fn user_by_id(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<UserSummary>> {
    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    Ok(Json(UserSummary {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        role_name: user.role_name,
    }))
}

#[instrument(skip(state, current))]
async fn user_info(
    State(state): State<AppState>,
    current: CurrentUser,
) -> ApiResult<Json<UserInfoResponse>> {
    let CurrentUser(claims) = current;
    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;
    let permissions = PermissionGrant::find_for_role(&state.db, user.role_id).await?;

    Ok(Json(UserInfoResponse {
        id: user.id,
        email: user.email,
        first_name: user.first_name,
        last_name: user.last_name,
        profile_image: user.profile_image,
        provider: user.provider,
        is_super_admin: user.is_super_admin,
        created_at: user.created_at,
        role: RoleInfo {
            name: user.role_name,
            permissions,
        },
    }))
}

#[instrument(skip(state, current, payload))]
async fn toggle_two_factor(
    State(state): State<AppState>,
    current: CurrentUser,
    Json(payload): Json<EnableTwoFactorRequest>,
) -> ApiResult<Response> {
    let CurrentUser(claims) = current;
    match services::toggle_two_factor(&state, claims.sub, payload.enable).await? {
        Some(otpauth_url) => Ok(Json(TwoFactorResponse { otpauth_url }).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}
