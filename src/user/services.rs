use tracing::info;
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::auth::totp;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Enables TOTP for the user (generating and encrypting a fresh secret) or
/// disables it (clearing secret and nonce). Returns the provisioning URL
/// when enabling.
pub async fn toggle_two_factor(
    state: &AppState,
    user_id: Uuid,
    enable: bool,
) -> ApiResult<Option<String>> {
    if !enable {
        User::clear_totp(&state.db, user_id).await?;
        info!(user_id = %user_id, "two factor disabled");
        return Ok(None);
    }

    let user = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    let secret = totp::generate_secret().map_err(ApiError::Internal)?;
    let url = totp::otpauth_url(&secret, &state.config.totp_issuer, &user.email)
        .map_err(ApiError::Internal)?;

    let (ciphertext, nonce) = state
        .cipher
        .encrypt(&secret)
        .map_err(|e| ApiError::Internal(e.into()))?;
    User::set_totp(&state.db, user_id, &ciphertext, &nonce).await?;

    info!(user_id = %user_id, "two factor enabled");
    Ok(Some(url))
}
