/// Authentication Routes
///
/// Login, access token refresh, refresh token revocation and the current
/// user lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{
    access_token_ttl, issue_access_token, mint_refresh_token, parse_bearer, redeem_refresh_token,
    revoke_refresh_token, CredentialHasher, ACCESS_TOKEN_TTL_SECONDS,
};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError};
use crate::middleware::AuthenticatedUser;
use crate::storage::{Store, UserStore};

/// User login request
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with access and refresh tokens
#[derive(Serialize)]
pub struct AuthResponse {
    pub user_id: String,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// Refresh response; the refresh token itself is not rotated
#[derive(Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

#[derive(Serialize)]
pub struct CurrentUserResponse {
    pub user_id: String,
}

/// POST /api/login
///
/// Authenticate with email and password. Returns a one-hour access token and
/// a long-lived refresh token.
///
/// # Errors
/// - 401: unknown email or wrong password (indistinguishable)
/// - 500: storage failure
pub async fn login(
    form: web::Json<LoginRequest>,
    store: web::Data<dyn Store>,
    hasher: web::Data<CredentialHasher>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let LoginRequest { email, password } = form.into_inner();

    // Unknown email and wrong password cost the same Argon2 work and fail
    // with the same error
    let credential = match store.lookup_user_credential(email.trim()).await? {
        Some(credential) => credential,
        None => {
            hasher.verify_unknown_user(password).await?;
            return Err(AuthError::InvalidCredentials.into());
        }
    };

    if !hasher.verify(password, credential.password_hash).await? {
        return Err(AuthError::InvalidCredentials.into());
    }

    let access_token = issue_access_token(
        credential.user_id,
        &settings.token_secret,
        access_token_ttl(),
    )?;
    let refresh_token = mint_refresh_token(
        store.get_ref(),
        credential.user_id,
        chrono::Duration::seconds(settings.refresh_token_expiry),
    )
    .await?;

    tracing::info!(user_id = %credential.user_id, "User logged in successfully");

    Ok(HttpResponse::Ok().json(AuthResponse {
        user_id: credential.user_id.to_string(),
        email: credential.email,
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_TTL_SECONDS,
    }))
}

/// POST /api/refresh
///
/// Exchange a refresh token (`Authorization: Bearer <refresh token>`) for a
/// new access token. The refresh token stays valid.
///
/// # Errors
/// - 401: missing, unknown, expired or revoked refresh token
/// - 500: storage failure
pub async fn refresh(
    req: HttpRequest,
    store: web::Data<dyn Store>,
    settings: web::Data<AuthSettings>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = parse_bearer(req.headers())?;
    let user_id = redeem_refresh_token(store.get_ref(), &refresh_token).await?;
    let access_token = issue_access_token(user_id, &settings.token_secret, access_token_ttl())?;

    tracing::info!(user_id = %user_id, "Access token refreshed");

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: ACCESS_TOKEN_TTL_SECONDS,
    }))
}

/// POST /api/revoke
///
/// Revoke the refresh token in `Authorization: Bearer <refresh token>`.
///
/// # Errors
/// - 401: missing or unknown refresh token
/// - 500: storage failure
pub async fn revoke(
    req: HttpRequest,
    store: web::Data<dyn Store>,
) -> Result<HttpResponse, AppError> {
    let refresh_token = parse_bearer(req.headers())?;
    revoke_refresh_token(store.get_ref(), &refresh_token).await?;

    tracing::info!("Refresh token revoked");

    Ok(HttpResponse::NoContent().finish())
}

/// GET /api/me
///
/// Requires `Authorization: Bearer <access token>`; the identity is injected
/// by `RequireUser`.
pub async fn get_current_user(user: web::ReqData<AuthenticatedUser>) -> HttpResponse {
    HttpResponse::Ok().json(CurrentUserResponse {
        user_id: user.user_id.to_string(),
    })
}
