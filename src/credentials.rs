use argon2::Argon2;
use async_trait::async_trait;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::path::PathBuf;
use std::sync::Arc;

use crate::{
    error::CredentialError,
    models::User,
    storage::read_json,
};

/// CredentialStore
///
/// Read-only lookup of user records by username. Consulted only during login.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Returns the user named `username`.
    ///
    /// `CredentialError::NotFound` means the lookup worked and there is no such user;
    /// `CredentialError::StorageUnavailable` means the lookup itself could not be made.
    async fn find_by_username(&self, username: &str) -> Result<User, CredentialError>;
}

/// CredentialState
pub type CredentialState = Arc<dyn CredentialStore>;

/// FileCredentialStore
///
/// Reads the users file on every lookup, so users provisioned out-of-band are visible
/// without a restart.
#[derive(Clone, Debug)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialStore for FileCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<User, CredentialError> {
        let users: Vec<User> = read_json(&self.path)
            .await
            .map_err(CredentialError::StorageUnavailable)?;

        users
            .into_iter()
            .find(|u| u.username == username)
            .ok_or(CredentialError::NotFound)
    }
}

/// MemoryCredentialStore
///
/// Fixed user list held in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryCredentialStore {
    users: Vec<User>,
}

impl MemoryCredentialStore {
    pub fn new(users: Vec<User>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<User, CredentialError> {
        self.users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(CredentialError::NotFound)
    }
}

// --- Password hashing (Argon2, PHC string format) ---

/// hash_password
///
/// Hashes `password` with Argon2 defaults and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, String> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| e.to_string())?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| e.to_string())?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| e.to_string())
}

/// verify_password
///
/// True only if `hash` is a well-formed PHC string and `password` matches it.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is not a valid PHC string");
            false
        }
    }
}
