//! Symmetric encryption of stored SAP secrets.
//!
//! AES-256-GCM with a fresh random 96-bit nonce per encryption. The sealed
//! form is `base64(nonce || ciphertext || tag)`.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use super::error::VaultError;

const NONCE_LEN: usize = 12;
pub const KEY_LEN: usize = 32;

/// Process-wide cipher for session secrets
#[derive(Clone)]
pub struct SecretCipher {
    cipher: Aes256Gcm,
}

impl fmt::Debug for SecretCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretCipher { .. }")
    }
}

impl SecretCipher {
    pub fn new(key: &[u8; KEY_LEN]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }

    /// Build from a 64-character hex key (the `vault.key_hex` setting)
    pub fn from_hex(key_hex: &str) -> Result<Self, VaultError> {
        let bytes = Zeroizing::new(
            hex::decode(key_hex.trim()).map_err(|e| VaultError::InvalidKey(e.to_string()))?,
        );
        let key: &[u8; KEY_LEN] = bytes.as_slice().try_into().map_err(|_| {
            VaultError::InvalidKey(format!("expected {} bytes, got {}", KEY_LEN, bytes.len()))
        })?;
        Ok(Self::new(key))
    }

    /// Random key, for tests and throwaway dev instances
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        OsRng.fill_bytes(key.as_mut_slice());
        Self::new(&key)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String, VaultError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|_| VaultError::Cipher("encryption failed".to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(sealed))
    }

    pub fn decrypt(&self, sealed: &str) -> Result<Zeroizing<String>, VaultError> {
        let raw = STANDARD
            .decode(sealed)
            .map_err(|e| VaultError::Cipher(format!("malformed ciphertext: {}", e)))?;
        if raw.len() <= NONCE_LEN {
            return Err(VaultError::Cipher("ciphertext too short".to_string()));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = Zeroizing::new(
            self.cipher
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| VaultError::Cipher("authentication tag mismatch".to_string()))?,
        );

        let text = std::str::from_utf8(&plaintext)
            .map_err(|_| VaultError::Cipher("plaintext is not UTF-8".to_string()))?;
        Ok(Zeroizing::new(text.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_is_randomised() {
        let cipher = SecretCipher::generate();
        let a = cipher.encrypt("goodpass").unwrap();
        let b = cipher.encrypt("goodpass").unwrap();
        assert_ne!(a, b, "nonce must differ per encryption");
        assert!(!a.contains("goodpass"));
        assert_eq!(cipher.decrypt(&a).unwrap().as_str(), "goodpass");
        assert_eq!(cipher.decrypt(&b).unwrap().as_str(), "goodpass");
    }

    #[test]
    fn test_decrypt_with_other_key_fails() {
        let sealed = SecretCipher::generate().encrypt("goodpass").unwrap();
        let err = SecretCipher::generate().decrypt(&sealed).unwrap_err();
        assert!(matches!(err, VaultError::Cipher(_)));
    }

    #[test]
    fn test_decrypt_rejects_tampered_ciphertext() {
        let cipher = SecretCipher::generate();
        let mut raw = STANDARD.decode(cipher.encrypt("goodpass").unwrap()).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        assert!(cipher.decrypt(&STANDARD.encode(raw)).is_err());
        assert!(cipher.decrypt("not base64 !!").is_err());
        assert!(cipher.decrypt(&STANDARD.encode([0u8; 4])).is_err());
    }

    #[test]
    fn test_from_hex() {
        let key = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
        let a = SecretCipher::from_hex(key).unwrap();
        let b = SecretCipher::from_hex(key).unwrap();
        let sealed = a.encrypt("s3cret").unwrap();
        assert_eq!(b.decrypt(&sealed).unwrap().as_str(), "s3cret");

        assert!(matches!(
            SecretCipher::from_hex("abcd"),
            Err(VaultError::InvalidKey(_))
        ));
        assert!(matches!(
            SecretCipher::from_hex("zz"),
            Err(VaultError::InvalidKey(_))
        ));
    }
}
