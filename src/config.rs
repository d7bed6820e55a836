use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub access_ttl_minutes: i64,
    pub pending_ttl_minutes: i64,
    pub action_ttl_hours: i64,
    pub refresh_ttl_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub github_client_id: String,
    pub github_client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Frontend base URL, used in emailed confirmation links and as the
    /// social login redirect target.
    pub client_url: String,
    /// Domain attribute set on session cookies.
    pub client_domain: String,
    /// Base64-encoded 256-bit key protecting TOTP secrets at rest.
    pub encryption_key: String,
    pub totp_issuer: String,
    pub jwt: JwtConfig,
    pub oauth: OAuthConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let encryption_key = std::env::var("ENCRYPTION_KEY")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "authgate".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "authgate-client".into()),
            access_ttl_minutes: std::env::var("JWT_ACCESS_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
            pending_ttl_minutes: std::env::var("JWT_PENDING_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(5),
            action_ttl_hours: std::env::var("JWT_ACTION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
            refresh_ttl_days: std::env::var("REFRESH_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(3),
        };
        let oauth = OAuthConfig {
            google_client_id: std::env::var("GOOGLE_OAUTH_CLIENT_ID").unwrap_or_default(),
            google_client_secret: std::env::var("GOOGLE_OAUTH_CLIENT_SECRET").unwrap_or_default(),
            github_client_id: std::env::var("GITHUB_OAUTH_CLIENT_ID").unwrap_or_default(),
            github_client_secret: std::env::var("GITHUB_OAUTH_CLIENT_SECRET").unwrap_or_default(),
        };
        Ok(Self {
            database_url,
            client_url: std::env::var("CLIENT_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            client_domain: std::env::var("CLIENT_DOMAIN").unwrap_or_else(|_| "localhost".into()),
            encryption_key,
            totp_issuer: std::env::var("TOTP_ISSUER").unwrap_or_else(|_| "Authgate".into()),
            jwt,
            oauth,
        })
    }
}
