/// Storage traits for users, session tokens and tasks
///
/// Handlers talk to storage only through these traits so the server can run
/// on PostgreSQL in production and on the in-memory backend in development
/// and tests.
///
/// # Backends
///
/// - [`postgres::PgStore`]: sqlx over a PostgreSQL pool
/// - [`memory::MemoryStore`]: process-local maps behind a single lock
///
/// # Token mutation
///
/// `add_token`, `remove_token` and `clear_tokens` are atomic in both
/// backends (one SQL statement, or one write-lock critical section), so two
/// concurrent logins or logouts for the same user cannot drop each other's
/// changes.

use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    task::{CreateTask, Task, TaskFilter, UpdateTask},
    user::{CreateUser, UpdateUser, User},
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Error type for storage operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another user already has this email
    #[error("Email already in use")]
    DuplicateEmail,

    /// The token string is already recorded
    #[error("Token already issued")]
    DuplicateToken,

    /// The referenced user does not exist
    #[error("User not found")]
    UserNotFound,

    /// Underlying database failure
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),
}

/// Credential store: user records and their active session tokens
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user with a fresh ID
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError>;

    /// Finds a user by ID
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Finds a user by normalized email
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Finds the user with this ID only if `token` is one of its active tokens
    async fn find_user_by_token(&self, id: Uuid, token: &str)
        -> Result<Option<User>, StoreError>;

    /// Applies changes, returning `None` if the user does not exist
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError>;

    /// Deletes a user (with its tokens and tasks), returning the old record
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Appends an active session token
    async fn add_token(&self, id: Uuid, token: &str) -> Result<(), StoreError>;

    /// Revokes one session token; false if it was not active
    async fn remove_token(&self, id: Uuid, token: &str) -> Result<bool, StoreError>;

    /// Revokes every session token of a user, returning how many
    async fn clear_tokens(&self, id: Uuid) -> Result<u64, StoreError>;

    /// Number of active session tokens of a user
    async fn count_tokens(&self, id: Uuid) -> Result<u64, StoreError>;
}

/// Task store; every operation is scoped to the owning author
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError>;

    async fn list_tasks(&self, author: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, StoreError>;

    async fn find_task(&self, author: Uuid, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn update_task(
        &self,
        author: Uuid,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Task>, StoreError>;

    async fn delete_task(&self, author: Uuid, id: Uuid) -> Result<Option<Task>, StoreError>;
}

/// A complete storage backend
#[async_trait]
pub trait Store: UserStore + TaskStore {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Checks that the backend is reachable
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Storage handle shared across request handlers
pub type SharedStore = Arc<dyn Store>;
