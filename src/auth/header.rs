/// Authorization header parsing
///
/// `<Scheme> <credential>`. Only the first space splits; the credential is
/// trimmed but otherwise returned untouched.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};

use crate::error::HeaderError;

pub const BEARER_SCHEME: &str = "Bearer";
pub const API_KEY_SCHEME: &str = "ApiKey";

/// Extract a bearer token (access or refresh token)
pub fn parse_bearer(headers: &HeaderMap) -> Result<String, HeaderError> {
    parse_credential(headers, BEARER_SCHEME)
}

/// Extract a trusted caller's API key
pub fn parse_api_key(headers: &HeaderMap) -> Result<String, HeaderError> {
    parse_credential(headers, API_KEY_SCHEME)
}

fn parse_credential(headers: &HeaderMap, scheme: &str) -> Result<String, HeaderError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or(HeaderError::MissingHeader)?
        .to_str()
        .map_err(|_| HeaderError::MalformedHeader)?;

    if value.is_empty() {
        return Err(HeaderError::MissingHeader);
    }

    let (given_scheme, rest) = value
        .split_once(' ')
        .ok_or(HeaderError::MalformedHeader)?;

    if !given_scheme.eq_ignore_ascii_case(scheme) {
        return Err(HeaderError::SchemeMismatch(given_scheme.to_string()));
    }

    let credential = rest.trim();
    if credential.is_empty() {
        return Err(HeaderError::EmptyCredential);
    }

    Ok(credential.to_string())
}
