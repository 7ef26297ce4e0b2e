/// Session token lifecycle against the credential store
///
/// A session exists while its token is recorded for the user. Issuing a
/// token signs it and records it in one step; authenticating requires both a
/// valid signature and a recorded token, so a revoked token is rejected
/// immediately even though its signature still verifies.
///
/// # Example
///
/// ```
/// use tasktrack_shared::auth::session::{authenticate, issue_token, revoke};
/// use tasktrack_shared::models::user::CreateUser;
/// use tasktrack_shared::store::{MemoryStore, UserStore};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let secret = "a-signing-secret-that-is-long-enough";
/// let user = store
///     .create_user(CreateUser {
///         name: "Ada".into(),
///         email: "ada@example.com".into(),
///         password_hash: "hash".into(),
///         age: 0,
///     })
///     .await?;
///
/// let token = issue_token(&store, secret, user.id).await?;
/// let session = authenticate(&store, secret, &token).await?;
/// assert_eq!(session.user.id, user.id);
///
/// revoke(&store, &session).await?;
/// assert!(authenticate(&store, secret, &token).await.is_err());
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use super::jwt::{create_token, validate_token, Claims, JwtError};
use crate::models::user::User;
use crate::store::{StoreError, UserStore};

/// An authenticated request identity: the user and the exact token used
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Error type for session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No `Authorization: Bearer <token>` header
    #[error("Missing or malformed Authorization header")]
    MissingCredentials,

    /// Token failed to sign or verify
    #[error("Token error: {0}")]
    Token(#[from] JwtError),

    /// Signature is fine but the token is not an active session
    #[error("Token is not an active session")]
    Revoked,

    /// Credential store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Extracts the token from an `Authorization` header value
///
/// Only the `Bearer <token>` form is accepted.
pub fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Signs a new session token for a user and records it
///
/// Fails with `StoreError::UserNotFound` if the user is gone.
pub async fn issue_token<S>(store: &S, secret: &str, user_id: Uuid) -> Result<String, SessionError>
where
    S: UserStore + ?Sized,
{
    let token = create_token(&Claims::new(user_id), secret)?;
    store.add_token(user_id, &token).await?;

    Ok(token)
}

/// Resolves a raw token to its session
///
/// The signature must verify, and the user named by the token must still
/// hold exactly this token.
pub async fn authenticate<S>(store: &S, secret: &str, token: &str) -> Result<AuthSession, SessionError>
where
    S: UserStore + ?Sized,
{
    let claims = validate_token(token, secret)?;

    let user = store
        .find_user_by_token(claims.sub, token)
        .await?
        .ok_or(SessionError::Revoked)?;

    Ok(AuthSession {
        user,
        token: token.to_string(),
    })
}

/// Ends the session that `session` was authenticated with
///
/// Other sessions of the same user stay valid.
pub async fn revoke<S>(store: &S, session: &AuthSession) -> Result<(), SessionError>
where
    S: UserStore + ?Sized,
{
    store.remove_token(session.user.id, &session.token).await?;
    Ok(())
}

/// Ends every session of a user, returning how many were active
pub async fn revoke_all<S>(store: &S, user_id: Uuid) -> Result<u64, SessionError>
where
    S: UserStore + ?Sized,
{
    Ok(store.clear_tokens(user_id).await?)
}
