use axum::{
    extract::{FromRef, Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use crate::auth::claims::AccessClaims;
use crate::auth::cookies::ACCESS_COOKIE;
use crate::auth::repo_types::{PermissionGrant, Role, ROLE_ADMIN};
use crate::auth::tokens::TokenKeys;
use crate::error::ApiError;
use crate::state::AppState;

pub mod matcher;
pub mod policy;

/// Per-request authorization: the role check runs first and attaches the
/// verified claims to the request; the permission check consumes them. Both
/// fail closed when the route demands them and no valid token is present.
pub async fn guard(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let path = req.uri().path().to_string();
    let Some(route_policy) = policy::policy_for(&path) else {
        return Ok(next.run(req).await);
    };

    let mut claims: Option<AccessClaims> = None;

    if !route_policy.roles.is_empty() {
        let verified = verify_cookie(&state, &jar)?;
        // The role row is the source of truth; the claim alone could be
        // stale after an admin reassignment.
        let role = Role::find_by_id(&state.db, verified.role_id)
            .await?
            .ok_or_else(|| ApiError::Forbidden("Role not allowed".into()))?;
        if !route_policy.roles.contains(&role.name.as_str()) {
            warn!(path = %path, role = %role.name, "role check rejected request");
            return Err(ApiError::Forbidden("Role not allowed".into()));
        }
        req.extensions_mut().insert(verified.clone());
        claims = Some(verified);
    }

    if !route_policy.permissions.is_empty() {
        // A route may declare permissions without a role gate; in that case
        // whatever token is present is used, and absence fails closed.
        let claims = match claims {
            Some(claims) => claims,
            None => {
                let verified = verify_cookie(&state, &jar)?;
                req.extensions_mut().insert(verified.clone());
                verified
            }
        };

        if claims.role != ROLE_ADMIN {
            let grants = PermissionGrant::find_for_role(&state.db, claims.role_id).await?;
            if !permissions_satisfied(route_policy.permissions, &grants, &path) {
                warn!(path = %path, role = %claims.role, "permission check rejected request");
                return Err(ApiError::Forbidden("Insufficient permissions".into()));
            }
        }
    }

    Ok(next.run(req).await)
}

fn verify_cookie(state: &AppState, jar: &CookieJar) -> Result<AccessClaims, ApiError> {
    let token = jar
        .get(ACCESS_COOKIE)
        .ok_or_else(|| ApiError::Forbidden("Missing access token".into()))?;
    let keys = TokenKeys::from_ref(state);
    keys.verify_access(token.value())
        .map_err(|_| ApiError::Forbidden("Invalid access token".into()))
}

/// Every required permission must be covered by at least one grant of the
/// same name whose route pattern matches the request path. Duplicate names
/// with different routes are fine; any one matching grant satisfies.
pub fn permissions_satisfied(
    required: &[&str],
    grants: &[PermissionGrant],
    path: &str,
) -> bool {
    required.iter().all(|perm| {
        grants
            .iter()
            .any(|g| g.name == *perm && matcher::matches(&g.route, path))
    })
}
