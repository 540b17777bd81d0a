//! Password-based encryption of persisted blobs
//!
//! Argon2id derives a 256-bit key from the secret, AES-256-GCM seals the data.
//! Salt, nonce and ciphertext are stored base64-encoded alongside each other.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroizing;

use crate::error::StorageError;

const KEY_SIZE: usize = 32;
pub const NONCE_SIZE: usize = 12;
pub const SALT_SIZE: usize = 16;

// OWASP minimum for Argon2id
const ARGON2_M_COST: u32 = 19_456;
const ARGON2_T_COST: u32 = 2;
const ARGON2_P_COST: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBlob {
    pub salt: String,
    pub nonce: String,
    pub ciphertext: String,
}

fn crypto_error(context: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Crypto(format!("{}: {}", context, e))
}

/// Derives an encryption key from a secret using Argon2id
pub fn derive_encryption_key(
    secret: &str,
    salt: &[u8],
) -> Result<Zeroizing<[u8; KEY_SIZE]>, StorageError> {
    let params = Params::new(ARGON2_M_COST, ARGON2_T_COST, ARGON2_P_COST, Some(KEY_SIZE))
        .map_err(|e| crypto_error("Failed to build Argon2 parameters", e))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let mut key = Zeroizing::new([0u8; KEY_SIZE]);
    argon2
        .hash_password_into(secret.as_bytes(), salt, &mut *key)
        .map_err(|e| crypto_error("Failed to derive key", e))?;
    Ok(key)
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Seal `data` under a key derived from `secret`, with a fresh salt and nonce
pub fn encrypt(data: &[u8], secret: &str) -> Result<EncryptedBlob, StorageError> {
    let salt = random_bytes::<SALT_SIZE>();
    let nonce = random_bytes::<NONCE_SIZE>();
    let key = derive_encryption_key(secret, &salt)?;

    let cipher = Aes256Gcm::new_from_slice(&*key)
        .map_err(|e| crypto_error("Failed to create cipher", e))?;
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), data)
        .map_err(|e| crypto_error("Encryption failed", e))?;

    Ok(EncryptedBlob {
        salt: STANDARD.encode(salt),
        nonce: STANDARD.encode(nonce),
        ciphertext: STANDARD.encode(ciphertext),
    })
}

/// Open a blob sealed by [`encrypt`]
///
/// A wrong secret and corrupted data are indistinguishable.
pub fn decrypt(blob: &EncryptedBlob, secret: &str) -> Result<Zeroizing<Vec<u8>>, StorageError> {
    let salt = decode_field("salt", &blob.salt)?;
    let nonce = decode_field("nonce", &blob.nonce)?;
    let ciphertext = decode_field("ciphertext", &blob.ciphertext)?;

    if nonce.len() != NONCE_SIZE {
        return Err(StorageError::Crypto(format!(
            "Unexpected nonce length: expected {}, got {}",
            NONCE_SIZE,
            nonce.len()
        )));
    }

    let key = derive_encryption_key(secret, &salt)?;
    let cipher = Aes256Gcm::new_from_slice(&*key)
        .map_err(|e| crypto_error("Failed to create cipher", e))?;
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce), ciphertext.as_slice())
        .map_err(|_| StorageError::Crypto("Decryption failed: invalid password or corrupted data".into()))?;

    Ok(Zeroizing::new(plaintext))
}

fn decode_field(name: &str, value: &str) -> Result<Vec<u8>, StorageError> {
    STANDARD
        .decode(value)
        .map_err(|e| crypto_error(&format!("Invalid {} encoding", name), e))
}
