/// Task endpoints
///
/// Every route requires a session and only ever sees the caller's own
/// tasks. Someone else's task id answers 404, exactly like a missing one.
///
/// # Endpoints
///
/// - `POST /tasks` - Create a task
/// - `GET /tasks?completed=true&limit=10&skip=20` - List own tasks, oldest first
/// - `GET /tasks/:id` - Fetch one task
/// - `PATCH /tasks/:id` - Update description and/or completed
/// - `DELETE /tasks/:id` - Delete one task

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tasktrack_shared::{
    auth::session::AuthSession,
    models::task::{CreateTask, Task, TaskFilter, UpdateTask},
};
use uuid::Uuid;
use validator::Validate;

/// Create task request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: String,

    #[serde(default)]
    pub completed: bool,
}

/// Task update request; `description` and `completed` are the only
/// updatable fields
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, message = "Description is required"))]
    pub description: Option<String>,

    pub completed: Option<bool>,
}

/// Listing query string
#[derive(Debug, Default, Deserialize)]
pub struct ListTasksQuery {
    pub completed: Option<bool>,
    pub limit: Option<i64>,
    pub skip: Option<i64>,
}

impl From<ListTasksQuery> for TaskFilter {
    fn from(query: ListTasksQuery) -> Self {
        TaskFilter {
            completed: query.completed,
            limit: query.limit,
            skip: query.skip,
        }
    }
}

fn task_not_found() -> ApiError {
    ApiError::NotFound("Task not found".to_string())
}

// Malformed ids can never name a task, so they are simply not found
fn parse_task_id(id: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(id).map_err(|_| task_not_found())
}

/// Create a task owned by the caller
pub async fn create_task(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<CreateTaskRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    let Json(mut req) = payload?;
    req.description = req.description.trim().to_string();
    req.validate()?;

    let task = state
        .store
        .create_task(CreateTask {
            description: req.description,
            completed: req.completed,
            author: session.user.id,
        })
        .await?;

    tracing::debug!(task_id = %task.id, author = %task.author, "Created task");

    Ok((StatusCode::CREATED, Json(task)))
}

/// List the caller's tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    session: AuthSession,
    query: Result<Query<ListTasksQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Task>>> {
    let Query(query) = query?;
    let filter = TaskFilter::from(query);

    let tasks = state.store.list_tasks(session.user.id, &filter).await?;

    Ok(Json(tasks))
}

/// Fetch one of the caller's tasks
pub async fn get_task(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;

    let task = state
        .store
        .find_task(session.user.id, id)
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// Update one of the caller's tasks
pub async fn update_task(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
    payload: Result<Json<UpdateTaskRequest>, JsonRejection>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;
    let Json(mut req) = payload.map_err(|rejection| ApiError::InvalidUpdate(rejection.body_text()))?;
    req.description = req.description.map(|description| description.trim().to_string());
    req.validate()?;

    let task = state
        .store
        .update_task(
            session.user.id,
            id,
            UpdateTask {
                description: req.description,
                completed: req.completed,
            },
        )
        .await?
        .ok_or_else(task_not_found)?;

    Ok(Json(task))
}

/// Delete one of the caller's tasks
pub async fn delete_task(
    State(state): State<AppState>,
    session: AuthSession,
    Path(id): Path<String>,
) -> ApiResult<Json<Task>> {
    let id = parse_task_id(&id)?;

    let task = state
        .store
        .delete_task(session.user.id, id)
        .await?
        .ok_or_else(task_not_found)?;

    tracing::debug!(task_id = %task.id, "Deleted task");

    Ok(Json(task))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_task_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_task_id(&id.to_string()).unwrap(), id);
        assert!(matches!(parse_task_id("123"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn test_update_allow_list() {
        let req: UpdateTaskRequest = serde_json::from_str(r#"{"completed": true}"#).unwrap();
        assert_eq!(req.completed, Some(true));

        let result: Result<UpdateTaskRequest, _> =
            serde_json::from_str(r#"{"completed": true, "author": "someone"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_create_defaults_to_incomplete() {
        let req: CreateTaskRequest = serde_json::from_str(r#"{"description": "Buy milk"}"#).unwrap();
        assert!(!req.completed);
    }

    #[test]
    fn test_query_into_filter() {
        let filter = TaskFilter::from(ListTasksQuery {
            completed: Some(false),
            limit: Some(500),
            skip: None,
        });
        assert_eq!(filter.completed, Some(false));
        assert_eq!(filter.limit(), 100);
        assert_eq!(filter.skip(), 0);
    }
}
