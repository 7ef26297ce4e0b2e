/// Session token signing and verification
///
/// Session tokens are JWTs signed with HS256 under a single shared secret
/// that the server loads from configuration at startup. A token carries the
/// user id as its subject and does not expire: a session ends only when its
/// token is revoked from the credential store (see [`super::session`]).
///
/// # Claims
///
/// - `sub`: User ID
/// - `iss`: Issuer, always [`ISSUER`]
/// - `iat`: Issued-at timestamp
/// - `jti`: Random token id, so two tokens issued in the same second for the
///   same user are still distinct strings
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let user_id = Uuid::new_v4();
/// let token = create_token(&Claims::new(user_id), "your-secret-key")?;
///
/// let validated = validate_token(&token, "your-secret-key")?;
/// assert_eq!(validated.sub, user_id);
/// # Ok(())
/// # }
/// ```

use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim placed in (and required of) every session token
pub const ISSUER: &str = "tasktrack";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Signature does not match the configured secret
    #[error("Invalid token signature")]
    InvalidSignature,

    /// Token was issued by someone else
    #[error("Invalid issuer")]
    InvalidIssuer,

    /// Token could not be decoded or its payload is malformed
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// Issuer - Always "tasktrack"
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Token ID
    pub jti: Uuid,
}

impl Claims {
    /// Creates claims for a user, issued now
    pub fn new(user_id: Uuid) -> Self {
        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: Utc::now().timestamp(),
            jti: Uuid::new_v4(),
        }
    }
}

/// Signs claims into a token string using HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies a token's signature and issuer and returns its claims
///
/// No expiry is checked. This does NOT consult the credential store, so a
/// revoked token still validates here; use
/// [`super::session::authenticate`] for request authentication.
///
/// # Errors
///
/// - `JwtError::InvalidSignature` if the signature does not verify
/// - `JwtError::InvalidIssuer` if `iss` is not [`ISSUER`]
/// - `JwtError::Malformed` for anything else (bad encoding, missing claims)
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.set_required_spec_claims(&["sub", "iss"]);
    validation.validate_exp = false;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::Malformed(e.to_string()),
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.iss, ISSUER);
        assert!(claims.iat <= Utc::now().timestamp());
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id);

        let token = create_token(&claims, SECRET).expect("Should create token");
        let validated = validate_token(&token, SECRET).expect("Should validate token");

        assert_eq!(validated, claims);
    }

    #[test]
    fn test_tokens_for_same_user_are_distinct() {
        let user_id = Uuid::new_v4();

        let first = create_token(&Claims::new(user_id), SECRET).unwrap();
        let second = create_token(&Claims::new(user_id), SECRET).unwrap();

        assert_ne!(first, second);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let token = create_token(&Claims::new(Uuid::new_v4()), SECRET).unwrap();

        let result = validate_token(&token, "some-other-secret-also-32-bytes-long");
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_validate_wrong_issuer() {
        let mut claims = Claims::new(Uuid::new_v4());
        claims.iss = "someone-else".to_string();
        let token = create_token(&claims, SECRET).unwrap();

        let result = validate_token(&token, SECRET);
        assert!(matches!(result, Err(JwtError::InvalidIssuer)));
    }

    #[test]
    fn test_validate_garbage() {
        for garbage in ["", "not-a-token", "a.b.c"] {
            let result = validate_token(garbage, SECRET);
            assert!(matches!(result, Err(JwtError::Malformed(_))), "{:?}", garbage);
        }
    }

    #[test]
    fn test_old_tokens_never_expire() {
        let mut claims = Claims::new(Uuid::new_v4());
        claims.iat -= 10 * 365 * 24 * 3600;
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_token(&token, SECRET).is_ok());
    }
}
