/// Password Hashing and Verification
///
/// Argon2id with the crate's default parameters. The produced PHC string
/// carries algorithm, version, memory/time/parallelism costs and salt, so
/// verification needs nothing but the stored hash.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::error::{AppError, AuthError};

/// Hash a password with Argon2id and a fresh random salt
///
/// # Errors
/// Returns error if Argon2 rejects the input (e.g. absurdly long password)
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash
///
/// Comparison of the derived key is constant-time.
///
/// # Errors
/// Returns `AuthError::HashFormat` if `hash` is not an Argon2 PHC string
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| AuthError::HashFormat(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::HashFormat(e.to_string()).into()),
    }
}

/// Syntactically valid Argon2id PHC string that no password matches.
///
/// Verified against when a login names an unknown user, so the miss costs as
/// much Argon2 work as a wrong password. Parameters match `Argon2::default()`.
pub const UNKNOWN_USER_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Runs hashing off the async workers with a cap on concurrent jobs
///
/// Argon2 is memory-hard; an unbounded burst of logins would otherwise eat
/// every blocking thread and a lot of RAM. The permit is owned by the blocking
/// job, so dropping the caller's future does not free it before Argon2 ends.
#[derive(Clone)]
pub struct CredentialHasher {
    permits: Arc<Semaphore>,
}

impl CredentialHasher {
    pub fn new(max_concurrent: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub async fn hash(&self, password: String) -> Result<String, AppError> {
        self.run_blocking(move || hash_password(&password)).await
    }

    pub async fn verify(&self, password: String, hash: String) -> Result<bool, AppError> {
        self.run_blocking(move || verify_password(&password, &hash)).await
    }

    /// Burns one verification against [`UNKNOWN_USER_HASH`]
    pub async fn verify_unknown_user(&self, password: String) -> Result<(), AppError> {
        self.verify(password, UNKNOWN_USER_HASH.to_string())
            .await
            .map(|_| ())
    }

    async fn run_blocking<T, F>(&self, job: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Result<T, AppError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| AppError::Internal(format!("Hasher closed: {}", e)))?;

        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
    }

    #[cfg(test)]
    pub(crate) fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }
}
