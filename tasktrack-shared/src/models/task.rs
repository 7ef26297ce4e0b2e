/// Task model and database operations
///
/// Tasks always belong to the user that created them (`author`). Every read
/// and write here is scoped by author: a task owned by somebody else behaves
/// exactly like a task that does not exist.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     description TEXT NOT NULL CHECK (length(description) > 0),
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     author UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

const TASK_COLUMNS: &str = "id, description, completed, author, created_at, updated_at";

/// Largest page size a listing may request
pub const MAX_PAGE_SIZE: i64 = 100;

/// A personal task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// What needs doing (trimmed, non-empty)
    pub description: String,

    /// Whether the task is done
    pub completed: bool,

    /// Owning user
    pub author: Uuid,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub description: String,
    pub completed: bool,
    pub author: Uuid,
}

/// Changes to apply to an existing task; only `Some` fields are written
#[derive(Debug, Clone, Default)]
pub struct UpdateTask {
    pub description: Option<String>,
    pub completed: Option<bool>,
}

/// Listing options for a user's tasks
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks with this completion state
    pub completed: Option<bool>,

    /// Page size, clamped to `1..=MAX_PAGE_SIZE`
    pub limit: Option<i64>,

    /// Number of tasks to skip
    pub skip: Option<i64>,
}

impl TaskFilter {
    /// Effective page size
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(MAX_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    /// Effective offset
    pub fn skip(&self) -> i64 {
        self.skip.unwrap_or(0).max(0)
    }

    /// Whether a task passes the completion filter
    pub fn matches(&self, task: &Task) -> bool {
        self.completed.map_or(true, |completed| task.completed == completed)
    }
}

impl Task {
    /// Inserts a new task
    pub async fn create(pool: &PgPool, data: CreateTask) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (description, completed, author) \
             VALUES ($1, $2, $3) \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(data.description)
            .bind(data.completed)
            .bind(data.author)
            .fetch_one(pool)
            .await
    }

    /// Lists an author's tasks, oldest first
    pub async fn list_by_author(
        pool: &PgPool,
        author: Uuid,
        filter: &TaskFilter,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {TASK_COLUMNS} FROM tasks \
             WHERE author = $1 AND ($2::BOOLEAN IS NULL OR completed = $2) \
             ORDER BY created_at ASC, id ASC \
             LIMIT $3 OFFSET $4"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(author)
            .bind(filter.completed)
            .bind(filter.limit())
            .bind(filter.skip())
            .fetch_all(pool)
            .await
    }

    /// Finds one of an author's tasks by ID
    pub async fn find_for_author(
        pool: &PgPool,
        author: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND author = $2");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(author)
            .fetch_optional(pool)
            .await
    }

    /// Applies the `Some` fields of `data` to one of an author's tasks
    pub async fn update_for_author(
        pool: &PgPool,
        author: Uuid,
        id: Uuid,
        data: UpdateTask,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks SET \
                description = COALESCE($3, description), \
                completed = COALESCE($4, completed), \
                updated_at = NOW() \
             WHERE id = $1 AND author = $2 \
             RETURNING {TASK_COLUMNS}"
        );

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(author)
            .bind(data.description)
            .bind(data.completed)
            .fetch_optional(pool)
            .await
    }

    /// Deletes one of an author's tasks, returning it as it was
    pub async fn delete_for_author(
        pool: &PgPool,
        author: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("DELETE FROM tasks WHERE id = $1 AND author = $2 RETURNING {TASK_COLUMNS}");

        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(author)
            .fetch_optional(pool)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(completed: bool) -> Task {
        Task {
            id: Uuid::new_v4(),
            description: "water the plants".to_string(),
            completed,
            author: Uuid::new_v4(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_defaults() {
        let filter = TaskFilter::default();
        assert_eq!(filter.limit(), MAX_PAGE_SIZE);
        assert_eq!(filter.skip(), 0);
        assert!(filter.matches(&task(true)));
        assert!(filter.matches(&task(false)));
    }

    #[test]
    fn test_filter_clamps_paging() {
        let filter = TaskFilter {
            completed: None,
            limit: Some(10_000),
            skip: Some(-5),
        };
        assert_eq!(filter.limit(), MAX_PAGE_SIZE);
        assert_eq!(filter.skip(), 0);

        let filter = TaskFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.limit(), 1);
    }

    #[test]
    fn test_filter_by_completion() {
        let filter = TaskFilter {
            completed: Some(false),
            ..Default::default()
        };
        assert!(filter.matches(&task(false)));
        assert!(!filter.matches(&task(true)));
    }
}
