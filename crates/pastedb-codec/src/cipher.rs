use std::fmt;

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::Aes256Gcm;
use rand::RngCore;

use crate::error::{CodecError, CodecResult};

const NONCE_LEN: usize = 12;
const KEY_CONTEXT: &str = "pastedb 2024-06-01 document cipher v1";

/// Symmetric text cipher (AES-256-GCM).
///
/// The 256-bit key is derived from a caller passphrase with BLAKE3 in
/// key-derivation mode. Ciphertext is rendered as `hex(nonce):hex(data)`
/// so it can live in a text part. A fresh random nonce is drawn for every
/// call, so encrypting the same text twice yields different output.
#[derive(Clone)]
pub struct Cipher {
    key: [u8; 32],
}

impl Cipher {
    /// Derive a cipher from a passphrase.
    pub fn from_passphrase(passphrase: &str) -> CodecResult<Self> {
        if passphrase.is_empty() {
            return Err(CodecError::InvalidKey("passphrase is empty".into()));
        }
        Ok(Self {
            key: blake3::derive_key(KEY_CONTEXT, passphrase.as_bytes()),
        })
    }

    /// Use a raw 32-byte key as-is.
    pub fn from_key(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn encrypt(&self, plaintext: &str) -> CodecResult<String> {
        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));

        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let ciphertext = cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|e| CodecError::Encryption(format!("AES-256-GCM encryption failed: {e}")))?;

        Ok(format!("{}:{}", hex::encode(nonce), hex::encode(ciphertext)))
    }

    pub fn decrypt(&self, text: &str) -> CodecResult<String> {
        let (nonce_hex, data_hex) = text
            .trim()
            .split_once(':')
            .ok_or_else(|| CodecError::Decryption("missing nonce separator".into()))?;

        let nonce = hex::decode(nonce_hex)
            .map_err(|e| CodecError::Decryption(format!("invalid nonce: {e}")))?;
        if nonce.len() != NONCE_LEN {
            return Err(CodecError::Decryption(format!(
                "nonce must be {NONCE_LEN} bytes, got {}",
                nonce.len()
            )));
        }
        let data = hex::decode(data_hex)
            .map_err(|e| CodecError::Decryption(format!("invalid ciphertext: {e}")))?;

        let cipher = Aes256Gcm::new(GenericArray::from_slice(&self.key));
        let plaintext = cipher
            .decrypt(GenericArray::from_slice(&nonce), data.as_slice())
            .map_err(|e| CodecError::Decryption(format!("AES-256-GCM decryption failed: {e}")))?;

        String::from_utf8(plaintext).map_err(|e| CodecError::Decryption(e.to_string()))
    }
}

impl fmt::Debug for Cipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cipher").field("key", &"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let cipher = Cipher::from_passphrase("correct horse battery staple").unwrap();
        let ct = cipher.encrypt("{\"n\":1}").unwrap();
        assert_ne!(ct, "{\"n\":1}");
        assert_eq!(cipher.decrypt(&ct).unwrap(), "{\"n\":1}");
    }

    #[test]
    fn fresh_nonce_each_call() {
        let cipher = Cipher::from_passphrase("k").unwrap();
        let a = cipher.encrypt("same").unwrap();
        let b = cipher.encrypt("same").unwrap();
        assert_ne!(a, b);
        assert_eq!(cipher.decrypt(&a).unwrap(), cipher.decrypt(&b).unwrap());
    }

    #[test]
    fn wrong_key_fails() {
        let a = Cipher::from_passphrase("alpha").unwrap();
        let b = Cipher::from_passphrase("beta").unwrap();
        let ct = a.encrypt("secret").unwrap();
        assert!(matches!(b.decrypt(&ct), Err(CodecError::Decryption(_))));
    }

    #[test]
    fn plaintext_is_not_decryptable() {
        let cipher = Cipher::from_passphrase("k").unwrap();
        assert!(cipher.decrypt("{\"a\":1}").is_err());
        assert!(cipher.decrypt("zz:zz").is_err());
        assert!(cipher.decrypt("00:00").is_err());
    }

    #[test]
    fn empty_passphrase_rejected() {
        assert!(matches!(
            Cipher::from_passphrase(""),
            Err(CodecError::InvalidKey(_))
        ));
    }

    #[test]
    fn debug_redacts_key() {
        let cipher = Cipher::from_key([1u8; 32]);
        let dbg = format!("{cipher:?}");
        assert!(dbg.contains("redacted"));
        assert!(!dbg.contains("[1, 1"));
    }
}
