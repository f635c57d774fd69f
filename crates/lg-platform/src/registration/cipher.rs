//! Registration Password Cipher
//!
//! AES-256-GCM encryption for the password held inside a pending
//! registration. The scheme is reversible on purpose: the plaintext is needed
//! once, at approval time, to create the real credential-store identity. The
//! key is a server-held secret, never stored beside the data.
//!
//! Wire format: base64(nonce[12] || ciphertext).

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use rand::RngCore;

use crate::shared::error::{PortalError, Result};

const NONCE_LEN: usize = 12;

pub struct RegistrationCipher {
    cipher: Aes256Gcm,
}

impl RegistrationCipher {
    /// Build from a base64-encoded 32-byte key.
    pub fn new(encoded_key: &str) -> Result<Self> {
        let key_bytes = BASE64.decode(encoded_key).map_err(|e| {
            PortalError::configuration(format!("Invalid base64 registration key: {}", e))
        })?;

        if key_bytes.len() != 32 {
            return Err(PortalError::configuration(format!(
                "Registration key must be 32 bytes, got {}",
                key_bytes.len()
            )));
        }

        let cipher = Aes256Gcm::new_from_slice(&key_bytes)
            .map_err(|e| PortalError::internal(format!("Cipher init failed: {}", e)))?;

        Ok(Self { cipher })
    }

    pub fn encrypt(&self, password: &str) -> Result<String> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, password.as_bytes())
            .map_err(|e| PortalError::internal(format!("Password encryption failed: {}", e)))?;

        let mut output = nonce_bytes.to_vec();
        output.extend(ciphertext);
        Ok(BASE64.encode(output))
    }

    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let data = BASE64
            .decode(encoded)
            .map_err(|e| PortalError::internal(format!("Invalid ciphertext encoding: {}", e)))?;

        if data.len() < NONCE_LEN {
            return Err(PortalError::internal("Ciphertext too short"));
        }

        let (nonce_bytes, ciphertext) = data.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|e| PortalError::internal(format!("Password decryption failed: {}", e)))?;

        String::from_utf8(plaintext)
            .map_err(|e| PortalError::internal(format!("Decrypted password not UTF-8: {}", e)))
    }
}

/// Generate a fresh base64 key, for provisioning.
pub fn generate_key() -> String {
    let mut key = [0u8; 32];
    OsRng.fill_bytes(&mut key);
    BASE64.encode(key)
}
