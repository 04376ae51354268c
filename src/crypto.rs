//! Encryption of AI provider keys at rest.
//!
//! Keys are sealed with AES-256-GCM under a server-managed master key read from
//! `ENCRYPTION_KEY` (64 hex chars). Each value gets a fresh random 12-byte nonce
//! and is stored as a single string, `"<nonce hex>:<ciphertext hex>"`, so it fits
//! the per-provider string slots on the user record.

use crate::errors::{Error, Result};
use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use rand::RngCore;

const NONCE_LEN: usize = 12;

/// Symmetric cipher for stored provider credentials.
#[derive(Clone)]
pub struct KeyCipher {
    key: [u8; 32],
}

impl std::fmt::Debug for KeyCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyCipher").finish_non_exhaustive()
    }
}

impl KeyCipher {
    /// Builds a cipher from a 64 character hex string.
    pub fn from_hex(hex_key: &str) -> Result<Self> {
        let bytes = hex::decode(hex_key.trim()).map_err(|e| Error::Crypto {
            message: format!("Invalid ENCRYPTION_KEY hex: {e}"),
        })?;
        let key: [u8; 32] = bytes.as_slice().try_into().map_err(|_| Error::Crypto {
            message: format!(
                "ENCRYPTION_KEY must be 64 hex chars (32 bytes), got {} bytes",
                bytes.len()
            ),
        })?;
        Ok(Self { key })
    }

    fn cipher(&self) -> Result<Aes256Gcm> {
        Aes256Gcm::new_from_slice(&self.key).map_err(|e| Error::Crypto {
            message: format!("Failed to create cipher: {e}"),
        })
    }

    /// Encrypts `plaintext` and returns the storable string form.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let cipher = self.cipher()?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| Error::Crypto {
                message: format!("Encryption failed: {e}"),
            })?;

        Ok(format!(
            "{}:{}",
            hex::encode(nonce_bytes),
            hex::encode(ciphertext)
        ))
    }

    /// Decrypts a value produced by [`KeyCipher::encrypt`].
    pub fn decrypt(&self, stored: &str) -> Result<String> {
        let (nonce_hex, ciphertext_hex) = stored.split_once(':').ok_or_else(|| Error::Crypto {
            message: "Stored value is not in nonce:ciphertext form".to_string(),
        })?;

        let nonce_bytes = hex::decode(nonce_hex).map_err(|e| Error::Crypto {
            message: format!("Invalid nonce encoding: {e}"),
        })?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(Error::Crypto {
                message: format!("Nonce must be {NONCE_LEN} bytes, got {}", nonce_bytes.len()),
            });
        }
        let ciphertext = hex::decode(ciphertext_hex).map_err(|e| Error::Crypto {
            message: format!("Invalid ciphertext encoding: {e}"),
        })?;

        let plaintext = self
            .cipher()?
            .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_slice())
            .map_err(|e| Error::Crypto {
                message: format!("Decryption failed: {e}"),
            })?;

        String::from_utf8(plaintext).map_err(|e| Error::Crypto {
            message: format!("Decrypted value is not UTF-8: {e}"),
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    const KEY_A: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
    const KEY_B: &str = "ffeeddccbbaa99887766554433221100ffeeddccbbaa99887766554433221100";

    #[test]
    fn test_encrypt_then_decrypt() {
        let cipher = KeyCipher::from_hex(KEY_A).unwrap();
        let stored = cipher.encrypt("sk-test-123").unwrap();

        assert!(stored.contains(':'));
        assert!(!stored.contains("sk-test-123"));
        assert_eq!(cipher.decrypt(&stored).unwrap(), "sk-test-123");
    }

    #[test]
    fn test_nonce_differs_per_call() {
        let cipher = KeyCipher::from_hex(KEY_A).unwrap();
        let first = cipher.encrypt("same").unwrap();
        let second = cipher.encrypt("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_decrypt_with_wrong_key_fails() {
        let stored = KeyCipher::from_hex(KEY_A).unwrap().encrypt("secret").unwrap();
        let result = KeyCipher::from_hex(KEY_B).unwrap().decrypt(&stored);
        assert!(matches!(result, Err(Error::Crypto { .. })));
    }

    #[test]
    fn test_decrypt_rejects_garbage() {
        let cipher = KeyCipher::from_hex(KEY_A).unwrap();
        assert!(cipher.decrypt("not-encrypted").is_err());
        assert!(cipher.decrypt("zz:zz").is_err());
        assert!(cipher.decrypt("00ff:00ff").is_err());
    }

    #[test]
    fn test_from_hex_rejects_short_keys() {
        assert!(KeyCipher::from_hex("abcd").is_err());
        assert!(KeyCipher::from_hex("not hex at all").is_err());
    }
}
