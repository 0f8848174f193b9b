/// Error Handling Module
///
/// Every failure in the service maps onto `AppError`. Authentication failures
/// carry a precise internal kind for logging but are rendered to the caller as
/// one uniform 401 response, so a client cannot tell which check rejected it.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use std::error::Error as StdError;
use std::fmt;

/// ============================================================================
/// 1. DOMAIN-SPECIFIC ERROR TYPES
/// ============================================================================

/// Authorization header parsing errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    MissingHeader,
    MalformedHeader,
    SchemeMismatch(String),
    EmptyCredential,
}

impl fmt::Display for HeaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderError::MissingHeader => write!(f, "authorization header not provided"),
            HeaderError::MalformedHeader => write!(f, "invalid authorization header format"),
            HeaderError::SchemeMismatch(scheme) => {
                write!(f, "invalid authorization scheme: {}", scheme)
            }
            HeaderError::EmptyCredential => write!(f, "credential is empty"),
        }
    }
}

impl StdError for HeaderError {}

/// Access token validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    SignatureInvalid,
    AlgorithmMismatch,
    TokenExpired,
    SubjectInvalid,
    MalformedToken(String),
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::SignatureInvalid => write!(f, "access token signature is invalid"),
            TokenError::AlgorithmMismatch => write!(f, "unexpected signing algorithm"),
            TokenError::TokenExpired => write!(f, "access token has expired"),
            TokenError::SubjectInvalid => write!(f, "access token subject is not a user id"),
            TokenError::MalformedToken(msg) => write!(f, "malformed access token: {}", msg),
        }
    }
}

impl StdError for TokenError {}

/// Refresh token redemption errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTokenError {
    NotFound,
    Expired,
    Revoked,
}

impl fmt::Display for RefreshTokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefreshTokenError::NotFound => write!(f, "refresh token not found"),
            RefreshTokenError::Expired => write!(f, "refresh token has expired"),
            RefreshTokenError::Revoked => write!(f, "refresh token has been revoked"),
        }
    }
}

impl StdError for RefreshTokenError {}

/// Authentication and authorization errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    Header(HeaderError),
    Token(TokenError),
    RefreshToken(RefreshTokenError),
    HashFormat(String),
    InvalidCredentials,
    ApiKeyMismatch,
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Header(e) => write!(f, "{}", e),
            AuthError::Token(e) => write!(f, "{}", e),
            AuthError::RefreshToken(e) => write!(f, "{}", e),
            AuthError::HashFormat(msg) => write!(f, "unrecognized password hash: {}", msg),
            AuthError::InvalidCredentials => write!(f, "incorrect email or password"),
            AuthError::ApiKeyMismatch => write!(f, "api key does not match"),
        }
    }
}

impl StdError for AuthError {}

/// Storage collaborator errors (infrastructure, not bad credentials)
#[derive(Debug)]
pub enum StorageError {
    ConnectionPool(String),
    QueryExecution(String),
    Unavailable(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::ConnectionPool(msg) => write!(f, "Database connection error: {}", msg),
            StorageError::QueryExecution(msg) => write!(f, "Query error: {}", msg),
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
        }
    }
}

impl StdError for StorageError {}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::ConnectionPool(err.to_string())
            }
            _ => StorageError::QueryExecution(err.to_string()),
        }
    }
}

/// ============================================================================
/// 2. UNIFIED APPLICATION ERROR TYPE
/// ============================================================================

#[derive(Debug)]
pub enum AppError {
    Auth(AuthError),
    Storage(StorageError),
    NotFound(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(e) => write!(f, "{}", e),
            AppError::Storage(e) => write!(f, "{}", e),
            AppError::NotFound(what) => write!(f, "Not found: {}", what),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl StdError for AppError {}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<HeaderError> for AppError {
    fn from(err: HeaderError) -> Self {
        AppError::Auth(AuthError::Header(err))
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Auth(AuthError::Token(err))
    }
}

impl From<RefreshTokenError> for AppError {
    fn from(err: RefreshTokenError) -> Self {
        AppError::Auth(AuthError::RefreshToken(err))
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Storage(err.into())
    }
}

// ============================================================================
// 3. HTTP RESPONSE MAPPING
// ============================================================================

/// Error response body
#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    /// Unique error ID for correlating with the server log
    pub error_id: String,
    pub message: String,
    pub code: String,
    pub status: u16,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_id: String, message: String, code: String, status: u16) -> Self {
        Self {
            error_id,
            message,
            code,
            status,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait ErrorHandler {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse);
    fn log_error(&self, request_id: &str);
}

impl ErrorHandler for AppError {
    fn error_response(&self, request_id: &str) -> (StatusCode, ErrorResponse) {
        let (status, code, message) = match self {
            // Every authentication failure looks the same from the outside
            AppError::Auth(_) => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED".to_string(),
                "Unauthorized".to_string(),
            ),
            AppError::Storage(StorageError::ConnectionPool(_)) => (
                StatusCode::SERVICE_UNAVAILABLE,
                "SERVICE_UNAVAILABLE".to_string(),
                "Database service temporarily unavailable".to_string(),
            ),
            AppError::Storage(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR".to_string(),
                "Database error occurred".to_string(),
            ),
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND".to_string(),
                format!("{} not found", what),
            ),
            AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR".to_string(),
                "Internal server error".to_string(),
            ),
        };

        let error_response = ErrorResponse::new(
            request_id.to_string(),
            message,
            code,
            status.as_u16(),
        );

        (status, error_response)
    }

    fn log_error(&self, request_id: &str) {
        match self {
            AppError::Auth(AuthError::InvalidCredentials) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %self,
                    "Invalid credentials attempt"
                );
            }
            AppError::Auth(e) => {
                tracing::warn!(
                    request_id = request_id,
                    error = %e,
                    "Authentication error"
                );
            }
            AppError::Storage(e) => {
                tracing::error!(
                    request_id = request_id,
                    error = %e,
                    "Storage error"
                );
            }
            AppError::NotFound(what) => {
                tracing::info!(
                    request_id = request_id,
                    resource = %what,
                    "Resource not found"
                );
            }
            AppError::Internal(msg) => {
                tracing::error!(
                    request_id = request_id,
                    error = %msg,
                    "Internal error"
                );
            }
        }
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let request_id = uuid::Uuid::new_v4().to_string();
        self.log_error(&request_id);

        let (status, error_response) = <Self as ErrorHandler>::error_response(self, &request_id);

        HttpResponse::build(status).json(error_response)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::Storage(StorageError::ConnectionPool(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
