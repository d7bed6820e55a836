use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_USER: &str = "USER";

/// User record joined with its role name (every query that loads a user for
/// authentication needs the role claim anyway).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
    pub is_email_verified: bool,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub refresh_token_expires: Option<OffsetDateTime>,
    pub role_id: Uuid,
    pub role_name: String,
    pub totp_enabled: bool,
    #[serde(skip_serializing)]
    pub totp_secret: Option<String>,
    #[serde(skip_serializing)]
    pub totp_nonce: Option<String>,
    pub provider: String,
    pub is_super_admin: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// A permission attached to a role: its name plus the route pattern it
/// applies to (`:param` segments and `*` wildcards).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PermissionGrant {
    pub name: String,
    pub route: String,
}

#[derive(Debug, Clone, FromRow)]
pub struct ActionToken {
    pub user_id: Uuid,
    pub purpose: String,
    pub token_hash: String,
    pub expires_at: OffsetDateTime,
}

/// Row shape for the user listing endpoint.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub role_name: String,
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub fn user_fixture() -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            password_hash: Some("$argon2id$fake".into()),
            first_name: "Alice".into(),
            last_name: Some("Doe".into()),
            profile_image: None,
            is_email_verified: true,
            refresh_token: None,
            refresh_token_expires: None,
            role_id: Uuid::new_v4(),
            role_name: ROLE_USER.into(),
            totp_enabled: false,
            totp_secret: None,
            totp_nonce: None,
            provider: "local".into(),
            is_super_admin: false,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn user_serialization_hides_credentials() {
        let user = user_fixture();
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("totp_secret"));
        assert!(!json.contains("refresh_token\""));
    }
}
