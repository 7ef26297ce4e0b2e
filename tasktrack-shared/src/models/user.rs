/// User model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,           -- unique, stored lower-cased
///     password_hash VARCHAR(255) NOT NULL,
///     age INTEGER NOT NULL DEFAULT 0 CHECK (age >= 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE user_tokens (
///     token TEXT PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// The issued tokens of a user live in `user_tokens`, one row per active
/// session. Appending, revoking and clearing tokens are single statements,
/// so concurrent logins and logouts for the same user never lose each
/// other's writes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, age, created_at, updated_at";

/// User account
///
/// Serializing a `User` yields its outward-facing form: the password hash
/// is skipped and tokens are not part of the struct at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name (trimmed, non-empty)
    pub name: String,

    /// Email address (trimmed, lower-cased, unique)
    pub email: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Age, never negative
    pub age: i32,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
///
/// Fields are expected to be validated and normalized already; the password
/// is hashed before it gets here.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub age: i32,
}

/// Changes to apply to an existing user
///
/// Only `Some` fields are written. `password_hash` is only ever set when the
/// caller supplied a new plaintext password, so an unchanged password is
/// never re-hashed.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub age: Option<i32>,
}

impl UpdateUser {
    /// True when no field would change
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.password_hash.is_none()
            && self.age.is_none()
    }
}

impl User {
    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation on `users_email_key` if the email is
    /// already taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (name, email, password_hash, age) \
             VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.age)
            .fetch_one(pool)
            .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by (already normalized) email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Finds the user with this ID only if `token` is one of its active
    /// session tokens
    pub async fn find_by_token(
        pool: &PgPool,
        id: Uuid,
        token: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.id, u.name, u.email, u.password_hash, u.age, u.created_at, u.updated_at
            FROM users u
            JOIN user_tokens t ON t.user_id = u.id
            WHERE u.id = $1 AND t.token = $2
            "#,
        )
        .bind(id)
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Applies the `Some` fields of `data` and bumps `updated_at`
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                email = COALESCE($3, email), \
                password_hash = COALESCE($4, password_hash), \
                age = COALESCE($5, age), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.email)
            .bind(data.password_hash)
            .bind(data.age)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a user and returns the record as it was before deletion
    ///
    /// Session tokens and tasks of the user are removed by cascade.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Records a newly issued session token for a user
    pub async fn add_token(pool: &PgPool, id: Uuid, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO user_tokens (token, user_id) VALUES ($1, $2)")
            .bind(token)
            .bind(id)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Revokes a single session token
    ///
    /// Returns false if the token was not active for this user.
    pub async fn remove_token(pool: &PgPool, id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1 AND token = $2")
            .bind(id)
            .bind(token)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revokes every session token of a user, returning how many were removed
    pub async fn clear_tokens(pool: &PgPool, id: Uuid) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Counts the active session tokens of a user
    pub async fn count_tokens(pool: &PgPool, id: Uuid) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_tokens WHERE user_id = $1")
            .bind(id)
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}
