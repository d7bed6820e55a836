use serde::Deserialize;

/// Request body for password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for TOTP verification.
#[derive(Debug, Deserialize)]
pub struct TotpRequest {
    pub code: String,
}

/// Query string for the social login callbacks.
#[derive(Debug, Deserialize)]
pub struct SocialQuery {
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_request_deserializes() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"email":"a@b.com","password":"pw"}"#).unwrap();
        assert_eq!(req.email, "a@b.com");
        assert_eq!(req.password, "pw");
    }

    #[test]
    fn social_query_code_is_optional() {
        let query: SocialQuery = serde_json::from_str(r#"{}"#).unwrap();
        assert!(query.code.is_none());
    }
}
