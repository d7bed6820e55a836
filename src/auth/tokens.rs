use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::auth::claims::{AccessClaims, ActionClaims, ActionPurpose, PendingClaims, TokenKind};
use crate::auth::repo_types::User;
use crate::config::JwtConfig;
use crate::state::AppState;

/// Signing and verification keys for the JWT-shaped tokens, plus the TTLs
/// from configuration. Refresh tokens are opaque and not handled here beyond
/// generation.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    pending_ttl: Duration,
    action_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            access_ttl_minutes,
            pending_ttl_minutes,
            action_ttl_hours,
            refresh_ttl_days,
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            pending_ttl: Duration::from_secs((pending_ttl_minutes as u64) * 60),
            action_ttl: Duration::from_secs((action_ttl_hours as u64) * 3600),
            refresh_ttl: Duration::from_secs((refresh_ttl_days as u64) * 86400),
        }
    }
}

impl TokenKeys {
    fn timestamps(&self, ttl: Duration) -> (usize, usize) {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        (now.unix_timestamp() as usize, exp.unix_timestamp() as usize)
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation
    }

    pub fn sign_access(&self, user: &User) -> anyhow::Result<String> {
        let (iat, exp) = self.timestamps(self.access_ttl);
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role_name.clone(),
            role_id: user.role_id,
            iat,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = %user.id, "access token signed");
        Ok(token)
    }

    pub fn sign_pending(&self, user_id: Uuid) -> anyhow::Result<String> {
        let (iat, exp) = self.timestamps(self.pending_ttl);
        let claims = PendingClaims {
            sub: user_id,
            iat,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: TokenKind::Pending,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    pub fn sign_action(&self, user_id: Uuid, purpose: ActionPurpose) -> anyhow::Result<String> {
        let (iat, exp) = self.timestamps(self.action_ttl);
        let claims = ActionClaims {
            sub: user_id,
            purpose,
            iat,
            exp,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind: TokenKind::Action,
        };
        Ok(encode(&Header::default(), &claims, &self.encoding)?)
    }

    /// Fails closed on expiry, bad signature, malformed payload, or a token
    /// of another kind.
    pub fn verify_access(&self, token: &str) -> anyhow::Result<AccessClaims> {
        let data = decode::<AccessClaims>(token, &self.decoding, &self.validation())?;
        if data.claims.kind != TokenKind::Access {
            anyhow::bail!("not an access token");
        }
        Ok(data.claims)
    }

    pub fn verify_pending(&self, token: &str) -> anyhow::Result<PendingClaims> {
        let data = decode::<PendingClaims>(token, &self.decoding, &self.validation())?;
        if data.claims.kind != TokenKind::Pending {
            anyhow::bail!("not a pending token");
        }
        Ok(data.claims)
    }

    pub fn verify_action(&self, token: &str) -> anyhow::Result<ActionClaims> {
        let data = decode::<ActionClaims>(token, &self.decoding, &self.validation())?;
        if data.claims.kind != TokenKind::Action {
            anyhow::bail!("not an action token");
        }
        Ok(data.claims)
    }

    pub fn refresh_expiry(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc() + TimeDuration::seconds(self.refresh_ttl.as_secs() as i64)
    }
}

/// Opaque refresh token: 256 bits from the OS RNG, hex-encoded. Stored
/// server-side against the user row; never self-describing.
pub fn new_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Action tokens are stored by digest, not value, so a leaked table does not
/// hand out live tokens.
pub fn hash_action_token(token: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::tests::user_fixture;

    fn make_keys() -> TokenKeys {
        let state = AppState::fake();
        TokenKeys::from_ref(&state)
    }

    fn keys_with(issuer: &str, audience: &str) -> TokenKeys {
        TokenKeys {
            encoding: EncodingKey::from_secret(b"test-secret"),
            decoding: DecodingKey::from_secret(b"test-secret"),
            issuer: issuer.into(),
            audience: audience.into(),
            access_ttl: Duration::from_secs(300),
            pending_ttl: Duration::from_secs(300),
            action_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(86400),
        }
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user = user_fixture();
        let token = keys.sign_access(&user).expect("sign access");
        let claims = keys.verify_access(&token).expect("verify access");
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, "USER");
        assert_eq!(claims.role_id, user.role_id);
        assert_eq!(claims.kind, TokenKind::Access);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
    }

    #[tokio::test]
    async fn pending_token_is_not_an_access_token() {
        let keys = make_keys();
        let token = keys.sign_pending(Uuid::new_v4()).expect("sign pending");
        // Pending claims lack identity fields, so decoding as access fails
        // before the kind check even runs.
        assert!(keys.verify_access(&token).is_err());
    }

    #[tokio::test]
    async fn access_token_rejected_by_pending_verifier() {
        let keys = make_keys();
        let user = user_fixture();
        let token = keys.sign_access(&user).expect("sign access");
        let err = keys.verify_pending(&token).unwrap_err();
        assert!(err.to_string().contains("not a pending token"));
    }

    #[tokio::test]
    async fn action_token_carries_purpose() {
        let keys = make_keys();
        let user_id = Uuid::new_v4();
        let token = keys
            .sign_action(user_id, ActionPurpose::ConfirmEmail)
            .expect("sign action");
        let claims = keys.verify_action(&token).expect("verify action");
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.purpose, ActionPurpose::ConfirmEmail);
    }

    #[tokio::test]
    async fn expired_access_token_is_rejected() {
        let keys = make_keys();
        let user = user_fixture();
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = AccessClaims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role_name.clone(),
            role_id: user.role_id,
            iat: now - 7200,
            exp: now - 3600,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(keys.verify_access(&token).is_err());
    }

    #[tokio::test]
    async fn wrong_issuer_or_audience_is_rejected() {
        let keys = make_keys();
        let user = user_fixture();
        let token = keys_with("other-issuer", "test-aud")
            .sign_access(&user)
            .expect("sign");
        assert!(keys.verify_access(&token).is_err());
        let token = keys_with("test-issuer", "other-aud")
            .sign_access(&user)
            .expect("sign");
        assert!(keys.verify_access(&token).is_err());
    }

    #[tokio::test]
    async fn pending_token_ttl_is_short() {
        let keys = make_keys();
        let token = keys.sign_pending(Uuid::new_v4()).expect("sign pending");
        let claims = keys.verify_pending(&token).expect("verify pending");
        assert_eq!(claims.exp - claims.iat, 5 * 60);
    }

    #[tokio::test]
    async fn garbage_tokens_fail_closed() {
        let keys = make_keys();
        assert!(keys.verify_access("not-a-token").is_err());
        assert!(keys.verify_pending("").is_err());
        assert!(keys.verify_action("a.b.c").is_err());
    }

    #[test]
    fn refresh_tokens_are_unique_hex() {
        let a = new_refresh_token();
        let b = new_refresh_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn action_token_hash_is_deterministic_and_opaque() {
        let a = hash_action_token("some.jwt.token");
        let b = hash_action_token("some.jwt.token");
        let c = hash_action_token("other.jwt.token");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 64);
    }
}
