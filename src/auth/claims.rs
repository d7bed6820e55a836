use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Discriminator baked into every signed token so one kind can never be
/// presented where another is expected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Full session credential carrying identity and role.
    Access,
    /// Issued after password success when TOTP is enabled; only accepted by
    /// the TOTP verification endpoint.
    Pending,
    /// Single-use email-confirmation / password-reset token.
    Action,
}

/// What a single-use action token is allowed to do.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionPurpose {
    ConfirmEmail,
    PasswordReset,
}

impl ActionPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionPurpose::ConfirmEmail => "confirm_email",
            ActionPurpose::PasswordReset => "password_reset",
        }
    }
}

/// Access token payload: identity plus role, enough for the authorization
/// guard to run its role check without a user lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessClaims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub role_id: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Pending-2FA token payload: user id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingClaims {
    pub sub: Uuid,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

/// Action token payload. The token is additionally matched by hash against
/// the stored `action_tokens` row, which is what makes it single-use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionClaims {
    pub sub: Uuid,
    pub purpose: ActionPurpose,
    pub iat: usize,
    pub exp: usize,
    pub iss: String,
    pub aud: String,
    pub kind: TokenKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&TokenKind::Access).unwrap(), "\"access\"");
        assert_eq!(serde_json::to_string(&TokenKind::Pending).unwrap(), "\"pending\"");
    }

    #[test]
    fn action_purpose_matches_stored_form() {
        assert_eq!(ActionPurpose::ConfirmEmail.as_str(), "confirm_email");
        assert_eq!(
            serde_json::to_string(&ActionPurpose::PasswordReset).unwrap(),
            "\"password_reset\""
        );
    }
}
