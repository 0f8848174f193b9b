use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{RefreshTokenRecord, RefreshTokenStore, UserCredential, UserStore};
use crate::error::StorageError;

#[derive(Debug, Clone)]
struct UserRow {
    credential: UserCredential,
    is_chirpy_red: bool,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    refresh_tokens: HashMap<String, RefreshTokenRecord>,
}

/// Process-local store used by the test suite and database-less runs
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, StorageError> {
        self.tables
            .lock()
            .map_err(|_| StorageError::Unavailable("in-memory store lock poisoned".to_string()))
    }

    /// Adds a user with an already hashed password and returns its id.
    pub fn insert_user(&self, email: &str, password_hash: &str) -> Result<Uuid, StorageError> {
        let user_id = Uuid::new_v4();
        self.tables()?.users.insert(
            user_id,
            UserRow {
                credential: UserCredential {
                    user_id,
                    email: email.to_string(),
                    password_hash: password_hash.to_string(),
                },
                is_chirpy_red: false,
            },
        );
        Ok(user_id)
    }

    pub fn is_upgraded(&self, user_id: Uuid) -> Result<bool, StorageError> {
        Ok(self
            .tables()?
            .users
            .get(&user_id)
            .map(|row| row.is_chirpy_red)
            .unwrap_or(false))
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryStore {
    async fn lookup_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StorageError> {
        Ok(self.tables()?.refresh_tokens.get(token).cloned())
    }

    async fn insert_refresh_token(
        &self,
        token: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StorageError> {
        let mut tables = self.tables()?;
        if tables.refresh_tokens.contains_key(token) {
            return Err(StorageError::QueryExecution(
                "duplicate refresh token".to_string(),
            ));
        }
        tables.refresh_tokens.insert(
            token.to_string(),
            RefreshTokenRecord {
                user_id,
                expires_at,
                revoked_at: None,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(&self, token: &str) -> Result<bool, StorageError> {
        match self.tables()?.refresh_tokens.get_mut(token) {
            Some(record) => {
                record.revoked_at.get_or_insert_with(Utc::now);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn lookup_user_credential(
        &self,
        email: &str,
    ) -> Result<Option<UserCredential>, StorageError> {
        Ok(self
            .tables()?
            .users
            .values()
            .find(|row| row.credential.email == email)
            .map(|row| row.credential.clone()))
    }

    async fn upgrade_user(&self, user_id: Uuid) -> Result<bool, StorageError> {
        match self.tables()?.users.get_mut(&user_id) {
            Some(row) => {
                row.is_chirpy_red = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_revoke_keeps_first_revocation_time() {
        let store = InMemoryStore::new();
        let user_id = Uuid::new_v4();
        store
            .insert_refresh_token("abc", user_id, Utc::now() + Duration::days(1))
            .await
            .expect("insert failed");

        assert!(store.revoke_refresh_token("abc").await.expect("revoke failed"));
        let first = store
            .lookup_refresh_token("abc")
            .await
            .expect("lookup failed")
            .and_then(|r| r.revoked_at);

        assert!(store.revoke_refresh_token("abc").await.expect("revoke failed"));
        let second = store
            .lookup_refresh_token("abc")
            .await
            .expect("lookup failed")
            .and_then(|r| r.revoked_at);

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_revoke_unknown_token() {
        let store = InMemoryStore::new();
        assert!(!store.revoke_refresh_token("missing").await.expect("revoke failed"));
    }

    #[tokio::test]
    async fn test_upgrade_user() {
        let store = InMemoryStore::new();
        let user_id = store.insert_user("a@example.com", "hash").expect("insert failed");

        assert!(!store.is_upgraded(user_id).expect("lookup failed"));
        assert!(store.upgrade_user(user_id).await.expect("upgrade failed"));
        assert!(store.is_upgraded(user_id).expect("lookup failed"));
        assert!(!store.upgrade_user(Uuid::new_v4()).await.expect("upgrade failed"));
    }
}
