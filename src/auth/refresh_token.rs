/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS random source, hex-encoded (64 chars)
/// - Persisted through the storage collaborator with owner and expiry
/// - Reusable until they expire or are explicitly revoked (no rotation)

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::{AppError, RefreshTokenError};
use crate::storage::RefreshTokenStore;

const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a new opaque refresh token
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Generate a refresh token for `user_id` and persist it
///
/// # Errors
/// Returns error if the storage write fails
pub async fn mint_refresh_token<S>(
    store: &S,
    user_id: Uuid,
    ttl: Duration,
) -> Result<String, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    let token = generate_refresh_token();
    let expires_at = Utc::now() + ttl;

    store.insert_refresh_token(&token, user_id, expires_at).await?;

    tracing::debug!(user_id = %user_id, expires_at = %expires_at, "Refresh token minted");
    Ok(token)
}

/// Resolve a refresh token to the user that owns it
///
/// # Errors
/// `NotFound`, `Expired` or `Revoked` for unusable tokens; storage errors
/// pass through unchanged
pub async fn redeem_refresh_token<S>(store: &S, token: &str) -> Result<Uuid, AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    let record = store
        .lookup_refresh_token(token)
        .await?
        .ok_or(RefreshTokenError::NotFound)?;

    if record.expires_at < Utc::now() {
        tracing::info!(user_id = %record.user_id, "Refresh token expired");
        return Err(RefreshTokenError::Expired.into());
    }

    if record.revoked_at.is_some() {
        tracing::warn!(user_id = %record.user_id, "Attempt to use revoked refresh token");
        return Err(RefreshTokenError::Revoked.into());
    }

    Ok(record.user_id)
}

/// Revoke a refresh token
///
/// Revoking an already revoked token succeeds and keeps the first
/// revocation time.
///
/// # Errors
/// `NotFound` if the token was never minted
pub async fn revoke_refresh_token<S>(store: &S, token: &str) -> Result<(), AppError>
where
    S: RefreshTokenStore + ?Sized,
{
    if !store.revoke_refresh_token(token).await? {
        return Err(RefreshTokenError::NotFound.into());
    }

    Ok(())
}
