use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::Engine;
use rand::RngCore;
use thiserror::Error;

/// AES-256-GCM nonce size (12 bytes).
const NONCE_SIZE: usize = 12;
/// AES-256 key size (32 bytes).
const KEY_SIZE: usize = 32;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("encryption key must be exactly 256 bits")]
    InvalidKeyLength,

    #[error("encryption failed")]
    EncryptionFailed,

    /// Wrong nonce or key length, malformed hex, or a tampered ciphertext
    /// (the GCM tag no longer verifies).
    #[error("decryption failed")]
    DecryptionFailed,
}

/// Protects TOTP shared secrets at rest. One service-wide key, decoded and
/// length-checked once at startup.
#[derive(Clone, Debug)]
pub struct SecretCipher {
    key: [u8; KEY_SIZE],
}

impl SecretCipher {
    /// `key_b64` is base64 for exactly 32 bytes; anything else is a
    /// configuration error and fails construction.
    pub fn new(key_b64: &str) -> Result<Self, CipherError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(key_b64)
            .map_err(|_| CipherError::InvalidKeyLength)?;
        let key: [u8; KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| CipherError::InvalidKeyLength)?;
        Ok(Self { key })
    }

    /// Encrypts with a fresh random nonce. Returns hex-encoded
    /// `(ciphertext, nonce)`, stored in separate columns.
    pub fn encrypt(&self, plaintext: &str) -> Result<(String, String), CipherError> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);
        self.encrypt_with_nonce(plaintext, nonce_bytes)
    }

    /// Deterministic-nonce variant. Only for tests; reusing a nonce across
    /// two distinct secrets breaks GCM.
    pub fn encrypt_with_nonce(
        &self,
        plaintext: &str,
        nonce_bytes: [u8; NONCE_SIZE],
    ) -> Result<(String, String), CipherError> {
        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| CipherError::InvalidKeyLength)?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;
        Ok((hex::encode(ciphertext), hex::encode(nonce_bytes)))
    }

    pub fn decrypt(&self, ciphertext_hex: &str, nonce_hex: &str) -> Result<String, CipherError> {
        let ciphertext = hex::decode(ciphertext_hex).map_err(|_| CipherError::DecryptionFailed)?;
        let nonce_bytes = hex::decode(nonce_hex).map_err(|_| CipherError::DecryptionFailed)?;
        if nonce_bytes.len() != NONCE_SIZE {
            return Err(CipherError::DecryptionFailed);
        }

        let cipher =
            Aes256Gcm::new_from_slice(&self.key).map_err(|_| CipherError::DecryptionFailed)?;
        let nonce = Nonce::from_slice(&nonce_bytes);
        let plaintext = cipher
            .decrypt(nonce, ciphertext.as_slice())
            .map_err(|_| CipherError::DecryptionFailed)?;

        String::from_utf8(plaintext).map_err(|_| CipherError::DecryptionFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cipher() -> SecretCipher {
        let key_b64 = base64::engine::general_purpose::STANDARD.encode([7u8; 32]);
        SecretCipher::new(&key_b64).expect("valid key")
    }

    #[test]
    fn rejects_short_and_long_keys() {
        let short = base64::engine::general_purpose::STANDARD.encode([0u8; 16]);
        let long = base64::engine::general_purpose::STANDARD.encode([0u8; 48]);
        assert_eq!(
            SecretCipher::new(&short).unwrap_err(),
            CipherError::InvalidKeyLength
        );
        assert_eq!(
            SecretCipher::new(&long).unwrap_err(),
            CipherError::InvalidKeyLength
        );
        assert_eq!(
            SecretCipher::new("not base64 !!!").unwrap_err(),
            CipherError::InvalidKeyLength
        );
    }

    #[test]
    fn roundtrip_various_secret_lengths() {
        let cipher = test_cipher();
        for len in [1usize, 8, 32, 64, 128] {
            let secret: String = "S".repeat(len);
            let (ciphertext, nonce) = cipher.encrypt(&secret).expect("encrypt");
            let plaintext = cipher.decrypt(&ciphertext, &nonce).expect("decrypt");
            assert_eq!(plaintext, secret);
        }
    }

    #[test]
    fn deterministic_nonce_is_stable() {
        let cipher = test_cipher();
        let nonce = [9u8; 12];
        let (a, iv_a) = cipher.encrypt_with_nonce("JBSWY3DPEHPK3PXP", nonce).unwrap();
        let (b, iv_b) = cipher.encrypt_with_nonce("JBSWY3DPEHPK3PXP", nonce).unwrap();
        assert_eq!(a, b);
        assert_eq!(iv_a, iv_b);
        assert_eq!(iv_a, hex::encode(nonce));
    }

    #[test]
    fn tampered_ciphertext_fails() {
        let cipher = test_cipher();
        let (ciphertext, nonce) = cipher.encrypt("JBSWY3DPEHPK3PXP").unwrap();
        let mut bytes = hex::decode(&ciphertext).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xff;
        let tampered = hex::encode(bytes);
        assert_eq!(
            cipher.decrypt(&tampered, &nonce).unwrap_err(),
            CipherError::DecryptionFailed
        );
    }

    #[test]
    fn wrong_nonce_fails() {
        let cipher = test_cipher();
        let (ciphertext, _) = cipher.encrypt("JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(
            cipher.decrypt(&ciphertext, &hex::encode([1u8; 12])).unwrap_err(),
            CipherError::DecryptionFailed
        );
        // wrong length entirely
        assert_eq!(
            cipher.decrypt(&ciphertext, "abcd").unwrap_err(),
            CipherError::DecryptionFailed
        );
    }

    #[test]
    fn wrong_key_fails() {
        let cipher = test_cipher();
        let other_key = base64::engine::general_purpose::STANDARD.encode([8u8; 32]);
        let other = SecretCipher::new(&other_key).unwrap();
        let (ciphertext, nonce) = cipher.encrypt("JBSWY3DPEHPK3PXP").unwrap();
        assert_eq!(
            other.decrypt(&ciphertext, &nonce).unwrap_err(),
            CipherError::DecryptionFailed
        );
    }
}
