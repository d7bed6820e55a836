use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{instrument, warn};

use crate::account::dto::{ChangePasswordRequest, CreateAccountRequest, EmailRequest, TokenQuery};
use crate::account::services;
use crate::auth::services::is_valid_email;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/account", post(create_account))
        .route("/auth/account/confirm", get(confirm_email))
        .route("/auth/account/refresh-token", post(resend_confirmation))
        .route("/auth/password/request-change", post(request_password_reset))
        .route("/auth/password/confirm-change", post(confirm_password_reset))
}

#[instrument(skip(state, payload))]
async fn create_account(
    State(state): State<AppState>,
    Json(payload): Json<CreateAccountRequest>,
) -> ApiResult<StatusCode> {
    if !is_valid_email(payload.email.trim()) {
        warn!("account creation with invalid email shape");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest("Password too short".into()));
    }
    if payload.first_name.trim().is_empty() {
        return Err(ApiError::BadRequest("First name is required".into()));
    }

    services::create_account(&state, &payload).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, query))]
async fn confirm_email(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
) -> ApiResult<StatusCode> {
    let token = query
        .token
        .ok_or_else(|| ApiError::BadRequest("Token is required".into()))?;
    services::confirm_email(&state, &token).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, payload))]
async fn resend_confirmation(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> ApiResult<StatusCode> {
    services::resend_confirmation(&state, &payload.email).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, payload))]
async fn request_password_reset(
    State(state): State<AppState>,
    Json(payload): Json<EmailRequest>,
) -> ApiResult<StatusCode> {
    services::request_password_reset(&state, &payload.email).await?;
    Ok(StatusCode::OK)
}

#[instrument(skip(state, query, payload))]
async fn confirm_password_reset(
    State(state): State<AppState>,
    Query(query): Query<TokenQuery>,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<StatusCode> {
    let token = query
        .token
        .ok_or_else(|| ApiError::BadRequest("Token is required".into()))?;
    if payload.password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest("Password too short".into()));
    }
    services::confirm_password_reset(&state, &token, &payload.password).await?;
    Ok(StatusCode::OK)
}
