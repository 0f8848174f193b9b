/// Storage collaborator
///
/// The authentication core only ever talks to persistence through these
/// traits. `PgStore` backs the running service; `InMemoryStore` backs tests
/// and local runs without a database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StorageError;

mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// A persisted refresh token row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// What login needs to know about a user
#[derive(Debug, Clone)]
pub struct UserCredential {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Returns `Ok(None)` when the token was never stored.
    async fn lookup_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError>;

    async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError>;

    /// Marks the token revoked. An already revoked token keeps its original
    /// revocation time. Returns `false` if the token is unknown.
    async fn revoke_refresh_token(&self, token: &str) -> Result<bool, StorageError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn lookup_user_credential(
        &self,
        email: &str,
    ) -> Result<Option<UserCredential>, StorageError>;

    /// Sets the upgrade flag. Returns `false` if the user is unknown.
    async fn upgrade_user(&self, user_id: Uuid) -> Result<bool, StorageError>;
}

/// Everything the HTTP layer needs from persistence
pub trait Store: RefreshTokenStore + UserStore {}

impl<T: RefreshTokenStore + UserStore> Store for T {}
