use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

use crate::config::AppConfig;

pub const ACCESS_COOKIE: &str = "access_token";
pub const REFRESH_COOKIE: &str = "refresh_token";
/// Pending-2FA credential, set between password success and TOTP success.
pub const PENDING_COOKIE: &str = "user";

/// Cross-origin SPA setup: the API and the client live on different
/// origins, so SameSite=None + Secure. All session cookies are httpOnly.
fn build(name: &'static str, value: String, max_age: Duration, config: &AppConfig) -> Cookie<'static> {
    Cookie::build((name, value))
        .domain(config.client_domain.clone())
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .max_age(max_age)
        .build()
}

fn expired(name: &'static str, config: &AppConfig) -> Cookie<'static> {
    build(name, String::new(), Duration::ZERO, config)
}

pub fn with_session(
    jar: CookieJar,
    access_token: String,
    refresh_token: String,
    config: &AppConfig,
) -> CookieJar {
    let access_age = Duration::minutes(config.jwt.access_ttl_minutes);
    let refresh_age = Duration::days(config.jwt.refresh_ttl_days);
    jar.add(build(ACCESS_COOKIE, access_token, access_age, config))
        .add(build(REFRESH_COOKIE, refresh_token, refresh_age, config))
}

pub fn with_pending(jar: CookieJar, pending_token: String, config: &AppConfig) -> CookieJar {
    let age = Duration::minutes(config.jwt.pending_ttl_minutes);
    jar.add(build(PENDING_COOKIE, pending_token, age, config))
}

/// Clears the session pair only (TOTP failure path keeps the pending cookie
/// so the user can retry the code).
pub fn clear_session(jar: CookieJar, config: &AppConfig) -> CookieJar {
    jar.add(expired(ACCESS_COOKIE, config))
        .add(expired(REFRESH_COOKIE, config))
}

pub fn clear_pending(jar: CookieJar, config: &AppConfig) -> CookieJar {
    jar.add(expired(PENDING_COOKIE, config))
}

/// Clears everything: logout.
pub fn clear_all(jar: CookieJar, config: &AppConfig) -> CookieJar {
    clear_session(jar, config).add(expired(PENDING_COOKIE, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::AppState;

    fn config() -> std::sync::Arc<AppConfig> {
        AppState::fake().config
    }

    #[tokio::test]
    async fn session_cookies_carry_security_flags() {
        let config = config();
        let jar = with_session(CookieJar::new(), "acc".into(), "ref".into(), &config);
        let access = jar.get(ACCESS_COOKIE).expect("access cookie");
        assert_eq!(access.value(), "acc");
        assert_eq!(access.http_only(), Some(true));
        assert_eq!(access.secure(), Some(true));
        assert_eq!(access.same_site(), Some(SameSite::None));
        assert_eq!(access.max_age(), Some(Duration::minutes(5)));
        let refresh = jar.get(REFRESH_COOKIE).expect("refresh cookie");
        assert_eq!(refresh.max_age(), Some(Duration::days(3)));
    }

    #[tokio::test]
    async fn clear_all_expires_every_cookie() {
        let config = config();
        let jar = with_session(CookieJar::new(), "acc".into(), "ref".into(), &config);
        let jar = with_pending(jar, "pend".into(), &config);
        let jar = clear_all(jar, &config);
        for name in [ACCESS_COOKIE, REFRESH_COOKIE, PENDING_COOKIE] {
            let cookie = jar.get(name).expect("cookie present");
            assert_eq!(cookie.value(), "");
            assert_eq!(cookie.max_age(), Some(Duration::ZERO));
        }
    }

    #[tokio::test]
    async fn totp_failure_path_keeps_pending_cookie() {
        let config = config();
        let jar = with_pending(CookieJar::new(), "pend".into(), &config);
        let jar = clear_session(jar, &config);
        assert_eq!(jar.get(PENDING_COOKIE).expect("pending").value(), "pend");
    }
}
