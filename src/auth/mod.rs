/// Authentication module
///
/// Password hashing, access token issue/validation, refresh token
/// management and Authorization header parsing.

mod claims;
mod header;
mod jwt;
mod password;
mod refresh_token;

pub use claims::{Claims, ISSUER};
pub use header::{parse_api_key, parse_bearer};
pub use jwt::{access_token_ttl, issue_access_token, validate_access_token, ACCESS_TOKEN_TTL_SECONDS};
pub use password::{hash_password, verify_password, CredentialHasher};
pub use refresh_token::{
    generate_refresh_token, mint_refresh_token, redeem_refresh_token, revoke_refresh_token,
};
