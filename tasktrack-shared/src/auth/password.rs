/// Password hashing module using Argon2id
///
/// Passwords are hashed with a random 16-byte salt and a fixed cost. The
/// resulting PHC string embeds the algorithm, parameters and salt, so
/// verification never needs the cost settings passed in.
///
/// # Parameters
///
/// - **Algorithm**: Argon2id, version 0x13
/// - **Memory**: 19 MiB (19456 KiB)
/// - **Iterations**: 2 passes
/// - **Parallelism**: 1 lane
/// - **Output**: 32-byte hash
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("red-fox-jumps")?;
/// assert!(verify_password("red-fox-jumps", &hash)?);
/// assert!(!verify_password("blue-fox-jumps", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Minimum password length, counted in characters after trimming
pub const MIN_PASSWORD_LENGTH: usize = 7;

/// Substring a password may not contain (case-insensitive)
pub const FORBIDDEN_PASSWORD_SUBSTRING: &str = "password";

const M_COST_KIB: u32 = 19456;
const T_COST: u32 = 2;
const P_COST: u32 = 1;
const OUTPUT_LEN: usize = 32;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = ParamsBuilder::new()
        .m_cost(M_COST_KIB)
        .t_cost(T_COST)
        .p_cost(P_COST)
        .output_len(OUTPUT_LEN)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    Ok(Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a plaintext password
///
/// Returns the PHC string, e.g. `$argon2id$v=19$m=19456,t=2,p=1$<salt>$<hash>`.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a stored hash
///
/// Returns `Ok(false)` on mismatch. Only a malformed hash or an internal
/// failure produces an error.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters come from the hash itself
    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!("Verification failed: {}", e))),
    }
}

/// Checks a (trimmed) plaintext password against the account policy
///
/// - At least [`MIN_PASSWORD_LENGTH`] characters
/// - Does not contain "password" in any letter case
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::password::validate_password_policy;
///
/// assert!(validate_password_policy("red-fox-jumps").is_ok());
/// assert!(validate_password_policy("short").is_err());
/// assert!(validate_password_policy("MyPassWord1").is_err());
/// ```
pub fn validate_password_policy(password: &str) -> Result<(), String> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LENGTH
        ));
    }

    if password
        .to_lowercase()
        .contains(FORBIDDEN_PASSWORD_SUBSTRING)
    {
        return Err("Password must not contain 'password'".to_string());
    }

    Ok(())
}
