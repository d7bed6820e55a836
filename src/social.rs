use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;

use crate::config::AppConfig;
use crate::error::ApiError;

/// Supported social login providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Google,
    Github,
}

impl SocialProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SocialProvider::Google => "google",
            SocialProvider::Github => "github",
        }
    }
}

/// Identity vouched for by the provider. The email is verified on their side,
/// which is the trust anchor for password-less login.
#[derive(Debug, Clone)]
pub struct SocialIdentity {
    pub email: String,
    pub first_name: String,
    pub last_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Exchanges an OAuth authorization code for a verified identity.
#[async_trait]
pub trait SocialExchange: Send + Sync {
    async fn exchange(
        &self,
        provider: SocialProvider,
        code: &str,
    ) -> Result<SocialIdentity, ApiError>;
}

pub struct HttpSocialExchange {
    http: reqwest::Client,
    config: Arc<AppConfig>,
}

#[derive(Debug, Deserialize)]
struct OAuthTokenResponse {
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    email: String,
    given_name: Option<String>,
    family_name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUser {
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubUserEmail {
    email: String,
    primary: bool,
}

impl HttpSocialExchange {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn google_identity(&self, code: &str) -> Result<SocialIdentity, ApiError> {
        let token: OAuthTokenResponse = self
            .http
            .post("https://oauth2.googleapis.com/token")
            .json(&serde_json::json!({
                "code": code,
                "client_id": self.config.oauth.google_client_id,
                "client_secret": self.config.oauth.google_client_secret,
                "redirect_uri": "postmessage",
                "grant_type": "authorization_code",
            }))
            .send()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid user login: {e}")))?
            .json()
            .await
            .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?;

        let access_token = token
            .access_token
            .ok_or_else(|| ApiError::BadRequest("Invalid user login".into()))?;

        let info: GoogleUserInfo = self
            .http
            .get("https://www.googleapis.com/oauth2/v3/userinfo")
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?
            .json()
            .await
            .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?;

        Ok(SocialIdentity {
            email: info.email,
            first_name: info.given_name.unwrap_or_default(),
            last_name: info.family_name,
            avatar_url: info.picture,
        })
    }

    async fn github_identity(&self, code: &str) -> Result<SocialIdentity, ApiError> {
        let token: OAuthTokenResponse = self
            .http
            .post("https://github.com/login/oauth/access_token")
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", self.config.oauth.github_client_id.as_str()),
                (
                    "client_secret",
                    self.config.oauth.github_client_secret.as_str(),
                ),
                ("code", code),
            ])
            .send()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid user login: {e}")))?
            .json()
            .await
            .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?;

        let access_token = token
            .access_token
            .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".into()))?;

        let user: GithubUser = self
            .http
            .get("https://api.github.com/user")
            .header(reqwest::header::USER_AGENT, "authgate")
            .bearer_auth(&access_token)
            .send()
            .await
            .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?
            .json()
            .await
            .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?;

        // GitHub hides the email unless it is public; fall back to the
        // primary address from the emails endpoint.
        let email = match user.email {
            Some(email) => email,
            None => {
                let emails: Vec<GithubUserEmail> = self
                    .http
                    .get("https://api.github.com/user/emails")
                    .header(reqwest::header::USER_AGENT, "authgate")
                    .bearer_auth(&access_token)
                    .send()
                    .await
                    .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?
                    .json()
                    .await
                    .map_err(|_| ApiError::BadRequest("Invalid user login".into()))?;
                emails
                    .into_iter()
                    .find(|e| e.primary)
                    .map(|e| e.email)
                    .ok_or_else(|| ApiError::BadRequest("Invalid user login".into()))?
            }
        };

        Ok(SocialIdentity {
            email,
            first_name: user.name.unwrap_or(user.login),
            last_name: None,
            avatar_url: user.avatar_url,
        })
    }
}

#[async_trait]
impl SocialExchange for HttpSocialExchange {
    async fn exchange(
        &self,
        provider: SocialProvider,
        code: &str,
    ) -> Result<SocialIdentity, ApiError> {
        match provider {
            SocialProvider::Google => self.google_identity(code).await,
            SocialProvider::Github => self.github_identity(code).await,
        }
    }
}
