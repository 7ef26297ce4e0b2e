/// Authentication utilities
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and password policy
/// - [`jwt`]: Session token signing and verification
/// - [`session`]: Token issuance, revocation and request authentication
///   against the credential store
/// - [`middleware`]: The authenticated session extractor for handlers
///
/// # Example
///
/// ```no_run
/// use tasktrack_shared::auth::password::{hash_password, verify_password};
/// use tasktrack_shared::auth::jwt::{create_token, validate_token, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("correct horse battery")?;
/// assert!(verify_password("correct horse battery", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4());
/// let token = create_token(&claims, "secret-key")?;
/// let verified = validate_token(&token, "secret-key")?;
/// assert_eq!(verified.sub, claims.sub);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod session;
