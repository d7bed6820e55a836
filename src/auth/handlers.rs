use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use tracing::{instrument, warn};

use crate::auth::cookies::{self, PENDING_COOKIE, REFRESH_COOKIE};
use crate::auth::dto::{LoginRequest, SocialQuery, TotpRequest};
use crate::auth::services::{self, is_valid_email, LoginOutcome};
use crate::error::{ApiError, ApiResult};
use crate::social::SocialProvider;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/logout", get(logout))
        .route("/auth/refresh-token", get(refresh))
        .route("/auth/2fa/authenticate", post(authenticate_two_factor))
        .route("/auth/social/google", get(social_google))
        .route("/auth/social/github", get(social_github))
}

#[instrument(skip(state, jar, payload))]
async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Response> {
    if !is_valid_email(payload.email.trim()) {
        warn!("login with invalid email shape");
        return Err(ApiError::BadRequest("Invalid email".into()));
    }

    match services::login(&state, &payload.email, &payload.password).await? {
        LoginOutcome::Session(tokens) => {
            let jar = cookies::with_session(jar, tokens.access, tokens.refresh, &state.config);
            Ok((jar, StatusCode::OK).into_response())
        }
        LoginOutcome::TwoFactorRequired { pending_token } => {
            // The pending token travels only as a cookie; any stale session
            // cookies are dropped alongside it.
            let jar = cookies::clear_session(jar, &state.config);
            let jar = cookies::with_pending(jar, pending_token, &state.config);
            Ok((jar, ApiError::TwoFactorRequired).into_response())
        }
    }
}

/// Clears transport artifacts only; the stored refresh token stays valid
/// until its natural expiry or the next rotation.
#[instrument(skip(state, jar))]
async fn logout(State(state): State<AppState>, jar: CookieJar) -> Response {
    let jar = cookies::clear_all(jar, &state.config);
    (jar, StatusCode::OK).into_response()
}

#[instrument(skip(state, jar))]
async fn refresh(State(state): State<AppState>, jar: CookieJar) -> ApiResult<Response> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or_else(|| ApiError::Forbidden("Invalid refresh token".into()))?;

    let tokens = services::refresh(&state, &token).await?;
    let jar = cookies::with_session(jar, tokens.access, tokens.refresh, &state.config);
    Ok((jar, StatusCode::OK).into_response())
}

#[instrument(skip(state, jar, payload))]
async fn authenticate_two_factor(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(payload): Json<TotpRequest>,
) -> Response {
    let Some(pending) = jar.get(PENDING_COOKIE).map(|c| c.value().to_string()) else {
        return ApiError::Forbidden("Login is required".into()).into_response();
    };

    match services::verify_two_factor(&state, &pending, &payload.code).await {
        Ok(tokens) => {
            let jar = cookies::clear_pending(jar, &state.config);
            let jar = cookies::with_session(jar, tokens.access, tokens.refresh, &state.config);
            (jar, StatusCode::OK).into_response()
        }
        // Bad code: drop any session cookies that may still be around, but
        // keep the pending cookie so the user can retry within its TTL.
        Err(err @ ApiError::Unauthorized(_)) => {
            let jar = cookies::clear_session(jar, &state.config);
            (jar, err).into_response()
        }
        Err(err) => err.into_response(),
    }
}

#[instrument(skip(state, jar, query))]
async fn social_google(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<SocialQuery>,
) -> ApiResult<Response> {
    social_login(state, jar, SocialProvider::Google, query).await
}

#[instrument(skip(state, jar, query))]
async fn social_github(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<SocialQuery>,
) -> ApiResult<Response> {
    social_login(state, jar, SocialProvider::Github, query).await
}

async fn social_login(
    state: AppState,
    jar: CookieJar,
    provider: SocialProvider,
    query: SocialQuery,
) -> ApiResult<Response> {
    let code = query
        .code
        .ok_or_else(|| ApiError::BadRequest("Code is required".into()))?;

    match services::social_login(&state, provider, &code).await? {
        LoginOutcome::Session(tokens) => {
            let jar = cookies::with_session(jar, tokens.access, tokens.refresh, &state.config);
            Ok((jar, Redirect::to(&state.config.client_url)).into_response())
        }
        LoginOutcome::TwoFactorRequired { pending_token } => {
            let jar = cookies::clear_session(jar, &state.config);
            let jar = cookies::with_pending(jar, pending_token, &state.config);
            Ok((jar, ApiError::TwoFactorRequired).into_response())
        }
    }
}
