use axum::extract::FromRef;
use time::{Duration, OffsetDateTime};
use tracing::info;
use uuid::Uuid;

use crate::account::dto::CreateAccountRequest;
use crate::auth::claims::ActionPurpose;
use crate::auth::password::hash_password;
use crate::auth::repo_types::{ActionToken, Role, User, ROLE_USER};
use crate::auth::services::{conflict_on_unique, normalize_email};
use crate::auth::tokens::{hash_action_token, TokenKeys};
use crate::email::{confirm_account_email, password_reset_email};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Signs a fresh action token and stores its digest. The upsert replaces any
/// previous token for the same purpose, so only the latest issue redeems.
async fn issue_action_token(
    state: &AppState,
    user_id: Uuid,
    purpose: ActionPurpose,
) -> ApiResult<String> {
    let keys = TokenKeys::from_ref(state);
    let token = keys
        .sign_action(user_id, purpose)
        .map_err(ApiError::Internal)?;
    let expires = OffsetDateTime::now_utc() + Duration::hours(state.config.jwt.action_ttl_hours);
    ActionToken::upsert(
        &state.db,
        user_id,
        purpose.as_str(),
        &hash_action_token(&token),
        expires,
    )
    .await?;
    Ok(token)
}

/// Verifies the signed token, then resolves it against the stored digest for
/// the given purpose. A token that was already redeemed (row deleted) or
/// superseded by a reissue no longer matches anything.
async fn redeem_action_token(
    state: &AppState,
    token: &str,
    purpose: ActionPurpose,
) -> ApiResult<User> {
    let keys = TokenKeys::from_ref(state);
    let claims = keys
        .verify_action(token)
        .map_err(|_| ApiError::BadRequest("Invalid token".into()))?;
    if claims.purpose != purpose {
        return Err(ApiError::BadRequest("Invalid token".into()));
    }

    let row = ActionToken::find_live(&state.db, &hash_action_token(token), purpose.as_str())
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    User::find_by_id(&state.db, row.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}

pub async fn create_account(state: &AppState, data: &CreateAccountRequest) -> ApiResult<()> {
    let email = normalize_email(&data.email);

    if User::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists".into()));
    }

    let role = Role::find_by_name(&state.db, ROLE_USER)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("default role is not seeded")))?;

    let password_hash = hash_password(&data.password).map_err(ApiError::Internal)?;
    let user = User::create_local(
        &state.db,
        &email,
        &password_hash,
        &data.first_name,
        data.last_name.as_deref(),
        role.id,
    )
    .await
    .map_err(|e| conflict_on_unique(e, "The email is already in use"))?;

    let token = issue_action_token(state, user.id, ActionPurpose::ConfirmEmail).await?;
    let url = format!(
        "{}/auth/account/confirm?token={}",
        state.config.client_url, token
    );

    state
        .mailer
        .send(&confirm_account_email(&user.email, &user.first_name, &url))
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "account created, confirmation email queued");
    Ok(())
}

pub async fn confirm_email(state: &AppState, token: &str) -> ApiResult<()> {
    let user = redeem_action_token(state, token, ActionPurpose::ConfirmEmail).await?;
    if user.is_email_verified {
        return Err(ApiError::NotFound("User not found".into()));
    }

    User::mark_email_verified(&state.db, user.id).await?;
    ActionToken::delete(&state.db, user.id, ActionPurpose::ConfirmEmail.as_str()).await?;
    info!(user_id = %user.id, "email confirmed");
    Ok(())
}

pub async fn resend_confirmation(state: &AppState, email: &str) -> ApiResult<()> {
    let email = normalize_email(email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if user.is_email_verified {
        return Err(ApiError::Conflict("User account is confirmed".into()));
    }

    let token = issue_action_token(state, user.id, ActionPurpose::ConfirmEmail).await?;
    let url = format!(
        "{}/auth/account/confirm?token={}",
        state.config.client_url, token
    );

    state
        .mailer
        .send(&confirm_account_email(&user.email, &user.first_name, &url))
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "confirmation email reissued");
    Ok(())
}

pub async fn request_password_reset(state: &AppState, email: &str) -> ApiResult<()> {
    let email = normalize_email(email);
    let user = User::find_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Resetting the password of an unconfirmed account would let the token
    // sidestep email verification.
    if !user.is_email_verified {
        return Err(ApiError::Conflict("User account is not confirmed".into()));
    }

    let token = issue_action_token(state, user.id, ActionPurpose::PasswordReset).await?;
    let url = format!(
        "{}/auth/password/confirm-change?token={}",
        state.config.client_url, token
    );

    state
        .mailer
        .send(&password_reset_email(&user.email, &user.first_name, &url))
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = %user.id, "password reset email queued");
    Ok(())
}

pub async fn confirm_password_reset(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> ApiResult<()> {
    let user = redeem_action_token(state, token, ActionPurpose::PasswordReset).await?;
    if !user.is_email_verified {
        return Err(ApiError::NotFound("User not found".into()));
    }

    let password_hash = hash_password(new_password).map_err(ApiError::Internal)?;
    User::set_password(&state.db, user.id, &password_hash).await?;
    ActionToken::delete(&state.db, user.id, ActionPurpose::PasswordReset.as_str()).await?;
    info!(user_id = %user.id, "password changed");
    Ok(())
}
