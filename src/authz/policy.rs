use crate::auth::repo_types::{ROLE_ADMIN, ROLE_USER};
use crate::authz::matcher;

/// Declarative access requirements for one route pattern.
pub struct RoutePolicy {
    pub pattern: &'static str,
    /// Role names allowed through; empty means no role gate on this route.
    pub roles: &'static [&'static str],
    /// Permission names that must all be granted to the caller's role.
    pub permissions: &'static [&'static str],
}

/// The protected-route table. Routes with no entry here are deliberately
/// open to any request, including unauthenticated ones -- auth endpoints
/// gate themselves on the credentials they consume.
///
/// First match wins, so more specific patterns come before `:param` ones.
pub const POLICIES: &[RoutePolicy] = &[
    RoutePolicy {
        pattern: "/user",
        roles: &[ROLE_USER, ROLE_ADMIN],
        permissions: &["VIEW USER INFO"],
    },
    RoutePolicy {
        pattern: "/user/info",
        roles: &[ROLE_USER, ROLE_ADMIN],
        permissions: &[],
    },
    RoutePolicy {
        pattern: "/user/:id",
        roles: &[ROLE_USER, ROLE_ADMIN],
        permissions: &["VIEW ONLY USER"],
    },
];

pub fn policy_for(path: &str) -> Option<&'static RoutePolicy> {
    POLICIES.iter().find(|p| matcher::matches(p.pattern, path))
}
