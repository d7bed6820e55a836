use axum::extract::FromRef;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::password::verify_password;
use crate::auth::repo_types::{Role, User, ROLE_USER};
use crate::auth::tokens::{new_refresh_token, TokenKeys};
use crate::auth::totp;
use crate::error::{ApiError, ApiResult};
use crate::social::SocialProvider;
use crate::state::AppState;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Full session pair. The access token is self-contained; the refresh token
/// is opaque and persisted against the user row.
#[derive(Debug)]
pub struct SessionTokens {
    pub access: String,
    pub refresh: String,
}

/// What a successful credential check leads to: either a full session, or a
/// pending-2FA token when the account has TOTP enabled.
#[derive(Debug)]
pub enum LoginOutcome {
    Session(SessionTokens),
    TwoFactorRequired { pending_token: String },
}

/// Signs an access token and rotates in a brand-new refresh token for the
/// user. Shared by every path that establishes a session: password login,
/// TOTP success, refresh, and social login.
pub async fn issue_session(state: &AppState, user: &User) -> ApiResult<SessionTokens> {
    let keys = TokenKeys::from_ref(state);
    let access = keys.sign_access(user).map_err(ApiError::Internal)?;
    let refresh = new_refresh_token();
    User::set_refresh_token(&state.db, user.id, &refresh, keys.refresh_expiry()).await?;
    info!(user_id = %user.id, "session issued");
    Ok(SessionTokens { access, refresh })
}

/// Session issuance gated on the 2FA state: accounts with TOTP enabled get a
/// short-lived pending token instead of session tokens.
pub async fn start_session(state: &AppState, user: &User) -> ApiResult<LoginOutcome> {
    if user.totp_enabled {
        let keys = TokenKeys::from_ref(state);
        let pending_token = keys.sign_pending(user.id).map_err(ApiError::Internal)?;
        info!(user_id = %user.id, "two factor required");
        return Ok(LoginOutcome::TwoFactorRequired { pending_token });
    }
    Ok(LoginOutcome::Session(issue_session(state, user).await?))
}

pub async fn login(state: &AppState, email: &str, password: &str) -> ApiResult<LoginOutcome> {
    let email = normalize_email(email);

    let user = match User::find_by_email(&state.db, &email).await? {
        Some(user) if user.is_email_verified => user,
        _ => {
            warn!(email = %email, "login for unknown or unverified user");
            return Err(ApiError::NotFound("User not found".into()));
        }
    };

    // Social-origin accounts have no hash and cannot log in with a password.
    let hash = user
        .password_hash
        .as_deref()
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

    if !verify_password(password, hash).map_err(ApiError::Internal)? {
        warn!(user_id = %user.id, "login with invalid password");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    }

    start_session(state, &user).await
}

/// Rotates the presented refresh token and reissues an access token. The
/// store lookup is compare-and-swap, so a stale token loses exactly once
/// even under concurrent refreshes, and the stored expiry is enforced in the
/// same statement.
pub async fn refresh(state: &AppState, old_token: &str) -> ApiResult<SessionTokens> {
    let keys = TokenKeys::from_ref(state);
    let new_token = new_refresh_token();

    let user_id =
        User::rotate_refresh_token(&state.db, old_token, &new_token, keys.refresh_expiry())
            .await?
            .ok_or_else(|| ApiError::Forbidden("Invalid refresh token".into()))?;

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::Forbidden("Invalid refresh token".into()))?;

    let access = keys.sign_access(&user).map_err(ApiError::Internal)?;
    info!(user_id = %user.id, "refresh token rotated");
    Ok(SessionTokens {
        access,
        refresh: new_token,
    })
}

pub async fn verify_two_factor(
    state: &AppState,
    pending_token: &str,
    code: &str,
) -> ApiResult<SessionTokens> {
    let keys = TokenKeys::from_ref(state);
    let claims = keys
        .verify_pending(pending_token)
        .map_err(|_| ApiError::Forbidden("Login is required".into()))?;

    let user = User::find_by_id(&state.db, claims.sub)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    if !user.totp_enabled {
        return Err(ApiError::Forbidden("Two factor is not enabled".into()));
    }

    let (secret_hex, nonce_hex) = user
        .totp_secret
        .as_deref()
        .zip(user.totp_nonce.as_deref())
        .ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("TOTP enabled without a stored secret"))
        })?;

    let secret = state
        .cipher
        .decrypt(secret_hex, nonce_hex)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let valid = totp::verify_code(&secret, &state.config.totp_issuer, &user.email, code)
        .map_err(ApiError::Internal)?;
    if !valid {
        warn!(user_id = %user.id, "invalid TOTP code");
        return Err(ApiError::Unauthorized("User TOTP code isn't valid".into()));
    }

    issue_session(state, &user).await
}

/// The provider-verified email is the trust anchor: an existing account logs
/// straight in (2FA still applies), an unknown email becomes a new verified
/// account with the default role.
pub async fn social_login(
    state: &AppState,
    provider: SocialProvider,
    code: &str,
) -> ApiResult<LoginOutcome> {
    let identity = state.social.exchange(provider, code).await?;
    let email = normalize_email(&identity.email);

    if let Some(user) = User::find_by_email(&state.db, &email).await? {
        info!(user_id = %user.id, provider = provider.as_str(), "social login");
        return start_session(state, &user).await;
    }

    let role = Role::find_by_name(&state.db, ROLE_USER)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("default role is not seeded")))?;

    let user = User::create_social(
        &state.db,
        &email,
        &identity.first_name,
        identity.last_name.as_deref(),
        identity.avatar_url.as_deref(),
        provider.as_str(),
        role.id,
    )
    .await
    .map_err(|e| conflict_on_unique(e, "Account already exists"))?;

    info!(user_id = %user.id, provider = provider.as_str(), "social account created");
    start_session(state, &user).await
}

/// Unique-constraint races on insert surface as `Conflict`, everything else
/// stays an internal error.
pub(crate) fn conflict_on_unique(e: sqlx::Error, message: &str) -> ApiError {
    if e.as_database_error()
        .is_some_and(|d| d.is_unique_violation())
    {
        ApiError::Conflict(message.into())
    } else {
        e.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }
}
