use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::CookieJar;

use crate::auth::claims::AccessClaims;
use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::tokens::TokenKeys;
use crate::error::ApiError;
use crate::state::AppState;

/// Extracts the verified access-token claims for handlers that need the
/// caller's identity without being route-gated (e.g. the 2FA toggle).
///
/// When the authorization guard already ran on the route it leaves the
/// claims in the request extensions; otherwise the cookie is verified here.
pub struct CurrentUser(pub AccessClaims);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(claims) = parts.extensions.get::<AccessClaims>() {
            return Ok(CurrentUser(claims.clone()));
        }

        let state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(ACCESS_COOKIE)
            .ok_or_else(|| ApiError::Forbidden("User not authenticated".into()))?;

        let keys = TokenKeys::from_ref(&state);
        let claims = keys
            .verify_access(token.value())
            .map_err(|_| ApiError::Forbidden("User not authenticated".into()))?;

        Ok(CurrentUser(claims))
    }
}
