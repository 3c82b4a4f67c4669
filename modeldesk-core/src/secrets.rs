//! Reversible obfuscation for stored secret keys.
//!
//! Secrets are encrypted with ChaCha20-Poly1305 under a key derived from a
//! single static passphrase. Anyone who can read the configuration (or the
//! built-in default) can decrypt every stored secret: this keeps keys out of
//! casual view in the settings table and is not a confidentiality guarantee.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::{aead::Aead, ChaCha20Poly1305, KeyInit, Nonce};
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use thiserror::Error;
use zeroize::Zeroizing;

/// Passphrase used when none is configured.
pub const DEFAULT_PASSPHRASE: &str = "default-secret-key-change-in-production";

const KEY_CONTEXT: &[u8] = b"modeldesk/provider-settings/v1";
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CipherError {
    #[error("Encryption failed")]
    EncryptionFailed,
    #[error("Decryption failed (wrong passphrase or corrupted data)")]
    DecryptionFailed,
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),
}

/// Source of the obfuscation passphrase, injected at startup.
pub trait SecretProvider: Send + Sync {
    fn passphrase(&self) -> &SecretString;
}

/// A passphrase fixed for the life of the process.
#[derive(Debug)]
pub struct StaticSecret(SecretString);

impl StaticSecret {
    pub fn new(passphrase: SecretString) -> Self {
        Self(passphrase)
    }

    /// Whether the built-in default passphrase is in use.
    pub fn is_default(&self) -> bool {
        self.0.expose_secret() == DEFAULT_PASSPHRASE
    }
}

impl Default for StaticSecret {
    fn default() -> Self {
        Self(SecretString::from(DEFAULT_PASSPHRASE.to_string()))
    }
}

impl SecretProvider for StaticSecret {
    fn passphrase(&self) -> &SecretString {
        &self.0
    }
}

/// Symmetric cipher wrapper producing base64 `nonce || ciphertext || tag`.
pub struct Obfuscator {
    key: Zeroizing<[u8; 32]>,
}

impl std::fmt::Debug for Obfuscator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Obfuscator").finish_non_exhaustive()
    }
}

impl Obfuscator {
    /// Derive the cipher key from the provider's passphrase.
    pub fn new(provider: &dyn SecretProvider) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(KEY_CONTEXT);
        hasher.update(provider.passphrase().expose_secret().as_bytes());

        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(&hasher.finalize());
        Self { key }
    }

    fn cipher(&self) -> Result<ChaCha20Poly1305, CipherError> {
        ChaCha20Poly1305::new_from_slice(&*self.key).map_err(|_| CipherError::EncryptionFailed)
    }

    /// Encrypt `plaintext`. Every call uses a fresh random nonce.
    pub fn obfuscate(&self, plaintext: &str) -> Result<String, CipherError> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::rngs::OsRng.fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher()?
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| CipherError::EncryptionFailed)?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(out))
    }

    /// Reverse [`Obfuscator::obfuscate`].
    pub fn deobfuscate(&self, encoded: &str) -> Result<String, CipherError> {
        let raw = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CipherError::InvalidEncoding(e.to_string()))?;
        if raw.len() < NONCE_LEN + TAG_LEN {
            return Err(CipherError::InvalidEncoding(format!(
                "payload too short ({} bytes)",
                raw.len()
            )));
        }

        let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
        let plaintext = Zeroizing::new(
            self.cipher()?
                .decrypt(Nonce::from_slice(nonce), ciphertext)
                .map_err(|_| CipherError::DecryptionFailed)?,
        );

        String::from_utf8(plaintext.to_vec())
            .map_err(|e| CipherError::InvalidEncoding(e.to_string()))
    }
}
