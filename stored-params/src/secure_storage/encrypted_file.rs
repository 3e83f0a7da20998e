//! Password-protected vault file.
//!
//! For hosts without a native credential store. Entries are kept in one JSON
//! document; values are sealed individually.
//!
//! # Security Properties
//!
//! - **Key Derivation**: Argon2 derives the master key from the password and
//!   a random 16-byte salt stored in the file header
//! - **Key Separation**: HKDF-SHA256 derives a subkey per entry key
//! - **Confidentiality/Integrity**: AES-256-GCM with random 96-bit nonces
//! - **Password Check**: a sealed verifier detects a wrong password on open
//!
//! # Sealed Value Format
//!
//! ```text
//! [1 byte version][12 bytes nonce][N bytes ciphertext][16 bytes auth tag]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use argon2::Argon2;
use hkdf::Hkdf;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::traits::{
    SecureStorage, SecureStorageError, SecureStorageErrorCode, SecureStorageResult,
};
use crate::file_lock::{self, FileLock};

/// Current sealed value format version.
const ENCRYPTION_VERSION: u8 = 1;

/// Current vault file format version.
const FILE_VERSION: u32 = 1;

const NONCE_SIZE: usize = 12;
const TAG_SIZE: usize = 16;
const SALT_SIZE: usize = 16;

const KDF_INFO_PREFIX: &[u8] = b"stored-params-vault-v1:";
const VERIFIER_CONTEXT: &[u8] = b"\0verifier";
const VERIFIER_PLAINTEXT: &[u8] = b"stored-params vault";

#[derive(Serialize, Deserialize)]
struct VaultFile {
    version: u32,
    salt_hex: String,
    verifier_hex: String,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

#[derive(Zeroize, ZeroizeOnDrop)]
struct MasterKey([u8; 32]);

impl MasterKey {
    fn derive(password: &[u8], salt: &[u8]) -> SecureStorageResult<Self> {
        let mut key = [0u8; 32];
        Argon2::default()
            .hash_password_into(password, salt, &mut key)
            .map_err(|e| {
                SecureStorageError::new(
                    SecureStorageErrorCode::Internal,
                    format!("Key derivation failed: {}", e),
                )
            })?;
        Ok(Self(key))
    }

    fn subkey(&self, context: &[u8]) -> SecureStorageResult<[u8; 32]> {
        let hk = Hkdf::<Sha256>::new(None, &self.0);
        let mut info = Vec::with_capacity(KDF_INFO_PREFIX.len() + context.len());
        info.extend_from_slice(KDF_INFO_PREFIX);
        info.extend_from_slice(context);

        let mut key = [0u8; 32];
        hk.expand(&info, &mut key).map_err(|e| {
            SecureStorageError::new(
                SecureStorageErrorCode::Internal,
                format!("Key derivation failed: {}", e),
            )
        })?;
        Ok(key)
    }

    fn seal(&self, plaintext: &[u8], context: &[u8]) -> SecureStorageResult<Vec<u8>> {
        let mut key = self.subkey(context)?;
        let cipher = Aes256Gcm::new_from_slice(&key);
        key.zeroize();
        let cipher = cipher.map_err(|e| {
            SecureStorageError::new(SecureStorageErrorCode::EncryptionFailed, e.to_string())
        })?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut nonce_bytes);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| {
                SecureStorageError::new(SecureStorageErrorCode::EncryptionFailed, e.to_string())
            })?;

        let mut sealed = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        sealed.push(ENCRYPTION_VERSION);
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    fn open(&self, sealed: &[u8], context: &[u8]) -> SecureStorageResult<Vec<u8>> {
        if sealed.len() < 1 + NONCE_SIZE + TAG_SIZE {
            return Err(SecureStorageError::new(
                SecureStorageErrorCode::DecryptionFailed,
                "Invalid ciphertext format",
            ));
        }
        if sealed[0] != ENCRYPTION_VERSION {
            return Err(SecureStorageError::new(
                SecureStorageErrorCode::DecryptionFailed,
                format!("Unsupported version: {}", sealed[0]),
            ));
        }

        let mut key = self.subkey(context)?;
        let cipher = Aes256Gcm::new_from_slice(&key);
        key.zeroize();
        let cipher = cipher.map_err(|e| {
            SecureStorageError::new(SecureStorageErrorCode::DecryptionFailed, e.to_string())
        })?;

        let nonce = Nonce::from_slice(&sealed[1..1 + NONCE_SIZE]);
        cipher.decrypt(nonce, &sealed[1 + NONCE_SIZE..]).map_err(|_| {
            SecureStorageError::new(
                SecureStorageErrorCode::DecryptionFailed,
                "Authentication failed",
            )
        })
    }
}

/// Secure storage in a password-protected file.
///
/// Every operation re-reads the file. Writers lock a sidecar file, so
/// vaults opened on the same path in several processes stay consistent.
pub struct EncryptedFileStorage {
    path: PathBuf,
    master_key: MasterKey,
}

impl EncryptedFileStorage {
    /// Open the vault at `path`, creating it if missing.
    ///
    /// # Errors
    ///
    /// - `DecryptionFailed` if the password does not match an existing vault
    /// - `Platform` on I/O or format errors
    #[cfg_attr(feature = "tracing", tracing::instrument(skip_all))]
    pub fn open(path: impl AsRef<Path>, password: &str) -> SecureStorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        // Held until the new vault is on disk so concurrent openers agree on
        // one salt.
        let _lock = FileLock::acquire(&path).map_err(|e| platform_error("lock", e))?;

        if path.exists() {
            let file = read_vault(&path)?;
            let salt = decode_hex(&file.salt_hex)?;
            let master_key = MasterKey::derive(password.as_bytes(), &salt)?;
            master_key.open(&decode_hex(&file.verifier_hex)?, VERIFIER_CONTEXT)?;

            return Ok(Self { path, master_key });
        }

        let mut salt = [0u8; SALT_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut salt);
        let master_key = MasterKey::derive(password.as_bytes(), &salt)?;

        let file = VaultFile {
            version: FILE_VERSION,
            salt_hex: hex::encode(salt),
            verifier_hex: hex::encode(master_key.seal(VERIFIER_PLAINTEXT, VERIFIER_CONTEXT)?),
            entries: BTreeMap::new(),
        };
        write_vault(&path, &file)?;

        #[cfg(feature = "tracing")]
        tracing::debug!("Created vault file");

        Ok(Self { path, master_key })
    }

    /// Get the vault file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn modify<F>(&self, f: F) -> SecureStorageResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>) -> SecureStorageResult<bool>,
    {
        let _lock = FileLock::acquire(&self.path).map_err(|e| platform_error("lock", e))?;

        let mut file = read_vault(&self.path)?;
        if f(&mut file.entries)? {
            write_vault(&self.path, &file)?;
        }
        Ok(())
    }
}

fn platform_error(context: &str, e: impl std::fmt::Display) -> SecureStorageError {
    SecureStorageError::new(
        SecureStorageErrorCode::Platform,
        format!("Vault {} failed: {}", context, e),
    )
}

fn decode_hex(s: &str) -> SecureStorageResult<Vec<u8>> {
    hex::decode(s).map_err(|e| platform_error("decode", e))
}

fn read_vault(path: &Path) -> SecureStorageResult<VaultFile> {
    let json = std::fs::read_to_string(path).map_err(|e| platform_error("read", e))?;
    let file: VaultFile = serde_json::from_str(&json).map_err(|e| platform_error("parse", e))?;
    if file.version != FILE_VERSION {
        return Err(platform_error(
            "read",
            format!("unsupported file version {}", file.version),
        ));
    }
    Ok(file)
}

fn write_vault(path: &Path, file: &VaultFile) -> SecureStorageResult<()> {
    let json = serde_json::to_string_pretty(file).map_err(|e| platform_error("write", e))?;
    file_lock::write_atomic(path, json.as_bytes()).map_err(|e| platform_error("write", e))
}

impl SecureStorage for EncryptedFileStorage {
    fn store(&self, key: &str, value: &[u8]) -> SecureStorageResult<()> {
        let sealed = self.master_key.seal(value, key.as_bytes())?;
        self.modify(|entries| {
            entries.insert(key.to_string(), hex::encode(sealed));
            Ok(true)
        })
    }

    fn retrieve(&self, key: &str) -> SecureStorageResult<Option<Vec<u8>>> {
        let file = read_vault(&self.path)?;
        match file.entries.get(key) {
            Some(sealed_hex) => {
                let sealed = decode_hex(sealed_hex)?;
                let plaintext = self
                    .master_key
                    .open(&sealed, key.as_bytes())
                    .map_err(|e| SecureStorageError::with_key(e.code, e.message, key))?;
                Ok(Some(plaintext))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> SecureStorageResult<()> {
        self.modify(|entries| Ok(entries.remove(key).is_some()))
    }

    fn list_keys(&self) -> SecureStorageResult<Vec<String>> {
        Ok(read_vault(&self.path)?.entries.into_keys().collect())
    }
}
