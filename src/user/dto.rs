use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::PermissionGrant;

/// Request body for the 2FA toggle.
#[derive(Debug, Deserialize)]
pub struct EnableTwoFactorRequest {
    pub enable: bool,
}

/// Returned when 2FA is enabled: the provisioning URL for authenticator
/// apps. The shared secret itself never leaves the server in any other form.
#[derive(Debug, Serialize)]
pub struct TwoFactorResponse {
    pub otpauth_url: String,
}

#[derive(Debug, Serialize)]
pub struct RoleInfo {
    pub name: String,
    pub permissions: Vec<PermissionGrant>,
}

/// Current user's profile, including role and permission grants.
#[derive(Debug, Serialize)]
pub struct UserInfoResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub profile_image: Option<String>,
    pub provider: String,
    pub is_super_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub role: RoleInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_factor_response_serializes() {
        let response = TwoFactorResponse {
            otpauth_url: "otpauth://totp/Authgate:a%40b.com?secret=X".into(),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("otpauth_url"));
        assert!(json.contains("otpauth://totp/"));
    }

    #[test]
    fn enable_request_deserializes() {
        let req: EnableTwoFactorRequest = serde_json::from_str(r#"{"enable":true}"#).unwrap();
        assert!(req.enable);
    }
}
