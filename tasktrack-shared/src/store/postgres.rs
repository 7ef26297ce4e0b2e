/// PostgreSQL storage backend
///
/// Thin adapter from the storage traits to the model operations in
/// [`crate::models`], translating constraint violations into
/// [`StoreError`] variants.

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, TaskStore, UserStore};
use crate::db::pool;
use crate::models::{
    task::{CreateTask, Task, TaskFilter, UpdateTask},
    user::{CreateUser, UpdateUser, User},
};

const EMAIL_CONSTRAINT: &str = "users_email_key";
const TOKEN_CONSTRAINT: &str = "user_tokens_pkey";
const TOKEN_OWNER_CONSTRAINT: &str = "user_tokens_user_id_fkey";
const TASK_AUTHOR_CONSTRAINT: &str = "tasks_author_fkey";

/// Storage backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Maps sqlx errors onto storage errors by constraint name
fn classify(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.constraint() {
            Some(EMAIL_CONSTRAINT) => return StoreError::DuplicateEmail,
            Some(TOKEN_CONSTRAINT) => return StoreError::DuplicateToken,
            Some(TOKEN_OWNER_CONSTRAINT) | Some(TASK_AUTHOR_CONSTRAINT) => {
                return StoreError::UserNotFound
            }
            Some(other) => debug!(constraint = other, "Unclassified constraint violation"),
            None => {}
        }
    }

    StoreError::Database(err)
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, data: CreateUser) -> Result<User, StoreError> {
        User::create(&self.pool, data).await.map_err(classify)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        User::find_by_id(&self.pool, id).await.map_err(classify)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        User::find_by_email(&self.pool, email).await.map_err(classify)
    }

    async fn find_user_by_token(
        &self,
        id: Uuid,
        token: &str,
    ) -> Result<Option<User>, StoreError> {
        User::find_by_token(&self.pool, id, token).await.map_err(classify)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> Result<Option<User>, StoreError> {
        User::update(&self.pool, id, data).await.map_err(classify)
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        User::delete(&self.pool, id).await.map_err(classify)
    }

    async fn add_token(&self, id: Uuid, token: &str) -> Result<(), StoreError> {
        User::add_token(&self.pool, id, token).await.map_err(classify)
    }

    async fn remove_token(&self, id: Uuid, token: &str) -> Result<bool, StoreError> {
        User::remove_token(&self.pool, id, token).await.map_err(classify)
    }

    async fn clear_tokens(&self, id: Uuid) -> Result<u64, StoreError> {
        User::clear_tokens(&self.pool, id).await.map_err(classify)
    }

    async fn count_tokens(&self, id: Uuid) -> Result<u64, StoreError> {
        let count = User::count_tokens(&self.pool, id).await.map_err(classify)?;
        Ok(count.max(0) as u64)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create_task(&self, data: CreateTask) -> Result<Task, StoreError> {
        Task::create(&self.pool, data).await.map_err(classify)
    }

    async fn list_tasks(&self, author: Uuid, filter: &TaskFilter) -> Result<Vec<Task>, StoreError> {
        Task::list_by_author(&self.pool, author, filter).await.map_err(classify)
    }

    async fn find_task(&self, author: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Task::find_for_author(&self.pool, author, id).await.map_err(classify)
    }

    async fn update_task(
        &self,
        author: Uuid,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Task>, StoreError> {
        Task::update_for_author(&self.pool, author, id, data)
            .await
            .map_err(classify)
    }

    async fn delete_task(&self, author: Uuid, id: Uuid) -> Result<Option<Task>, StoreError> {
        Task::delete_for_author(&self.pool, author, id).await.map_err(classify)
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        pool::health_check(&self.pool).await.map_err(StoreError::Database)
    }
}
