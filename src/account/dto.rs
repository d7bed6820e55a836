use serde::Deserialize;

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: Option<String>,
}

/// Request body for flows addressed by email only (resend confirmation,
/// request password reset).
#[derive(Debug, Deserialize)]
pub struct EmailRequest {
    pub email: String,
}

/// `?token=` query parameter for single-use token redemption.
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    pub token: Option<String>,
}

/// Request body for completing a password reset.
#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_account_request_deserializes() {
        let req: CreateAccountRequest = serde_json::from_str(
            r#"{"email":"a@b.com","password":"P@ssw0rd1!","first_name":"Alice"}"#,
        )
        .unwrap();
        assert_eq!(req.first_name, "Alice");
        assert!(req.last_name.is_none());
    }

    #[test]
    fn token_query_is_optional() {
        let query: TokenQuery = serde_json::from_str(r#"{}"#).unwrap();
        assert!(query.token.is_none());
    }
}
