use anyhow::anyhow;
use totp_rs::{Algorithm, Secret, TOTP};

/// RFC 6238 defaults: SHA-1, 6 digits, 30 second step, one step of skew
/// either side.
const DIGITS: usize = 6;
const SKEW: u8 = 1;
const STEP: u64 = 30;

fn build(secret_b32: &str, issuer: &str, account: &str) -> anyhow::Result<TOTP> {
    let secret_bytes = Secret::Encoded(secret_b32.to_string())
        .to_bytes()
        .map_err(|e| anyhow!("invalid TOTP secret: {e:?}"))?;
    TOTP::new(
        Algorithm::SHA1,
        DIGITS,
        SKEW,
        STEP,
        secret_bytes,
        Some(issuer.to_string()),
        account.to_string(),
    )
    .map_err(|e| anyhow!("TOTP init error: {e}"))
}

/// Fresh random shared secret, base32-encoded (the form that gets encrypted
/// at rest and fed to authenticator apps).
pub fn generate_secret() -> anyhow::Result<String> {
    match Secret::generate_secret().to_encoded() {
        Secret::Encoded(s) => Ok(s),
        Secret::Raw(_) => Err(anyhow!("secret encoding failed")),
    }
}

/// `otpauth://` provisioning URL for authenticator apps.
pub fn otpauth_url(secret_b32: &str, issuer: &str, account: &str) -> anyhow::Result<String> {
    Ok(build(secret_b32, issuer, account)?.get_url())
}

/// Checks a code against the current time window (with skew).
pub fn verify_code(secret_b32: &str, issuer: &str, account: &str, code: &str) -> anyhow::Result<bool> {
    let totp = build(secret_b32, issuer, account)?;
    Ok(totp.check_current(code)?)
}

#[cfg(test)]
fn verify_at(secret_b32: &str, code: &str, time: u64) -> anyhow::Result<bool> {
    let totp = build(secret_b32, "Authgate", "test@example.com")?;
    Ok(totp.check(code, time))
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_010;
    const SECRET: &str = "JBSWY3DPEHPK3PXPJBSWY3DPEHPK3PXP";

    #[test]
    fn generated_secret_is_base32_and_long_enough() {
        let secret = generate_secret().expect("generate");
        assert!(secret.len() >= 26);
        assert!(secret
            .chars()
            .all(|c| c.is_ascii_uppercase() || ('2'..='7').contains(&c)));
    }

    #[test]
    fn code_verifies_in_current_window() {
        let totp = build(SECRET, "Authgate", "test@example.com").unwrap();
        let code = totp.generate(T0);
        assert!(verify_at(SECRET, &code, T0).unwrap());
    }

    #[test]
    fn adjacent_window_within_skew_is_accepted() {
        let totp = build(SECRET, "Authgate", "test@example.com").unwrap();
        let code = totp.generate(T0);
        assert!(verify_at(SECRET, &code, T0 + STEP).unwrap());
    }

    #[test]
    fn code_two_windows_past_is_rejected() {
        let totp = build(SECRET, "Authgate", "test@example.com").unwrap();
        let code = totp.generate(T0);
        for offset in [2, 3, 4] {
            assert_ne!(code, totp.generate(T0 + offset * STEP));
        }
        assert!(!verify_at(SECRET, &code, T0 + 3 * STEP).unwrap());
    }

    #[test]
    fn wrong_code_is_rejected() {
        let totp = build(SECRET, "Authgate", "test@example.com").unwrap();
        let good = totp.generate(T0);
        let bad = if good == "000000" { "111111" } else { "000000" };
        assert!(!verify_at(SECRET, bad, T0).unwrap());
    }

    #[test]
    fn provisioning_url_carries_issuer() {
        let secret = generate_secret().unwrap();
        let url = otpauth_url(&secret, "Authgate", "alice@example.com").unwrap();
        assert!(url.starts_with("otpauth://totp/"));
        assert!(url.contains("Authgate"));
    }
}
