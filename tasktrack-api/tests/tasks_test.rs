/// Integration tests for the task surface
///
/// Tasks are private to their author: every route is authenticated and
/// someone else's task looks exactly like a missing one.

mod common;

use axum::http::StatusCode;
use common::TestContext;
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_task(ctx: &TestContext, token: &str, description: &str, completed: bool) -> Value {
    let (status, body) = ctx
        .post(
            "/tasks",
            Some(token),
            json!({ "description": description, "completed": completed }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
    body
}

#[tokio::test]
async fn test_task_routes_require_authentication() {
    let ctx = TestContext::new();
    let id = Uuid::new_v4();

    let (status, _) = ctx.post("/tasks", None, json!({ "description": "Buy milk" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get("/tasks", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.get(&format!("/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx
        .patch(&format!("/tasks/{}", id), None, json!({ "completed": true }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.delete(&format!("/tasks/{}", id), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_create_task() {
    let ctx = TestContext::new();
    let user = ctx.register("Andrew", "andrew@example.com").await;

    let (status, body) = ctx
        .post("/tasks", Some(&user.token), json!({ "description": "  Buy milk  " }))
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["description"], "Buy milk");
    assert_eq!(body["completed"], false);
    assert_eq!(body["author"], user.id);
}

#[tokio::test]
async fn test_create_task_validation() {
    let ctx = TestContext::new();
    let user = ctx.register("Andrew", "andrew@example.com").await;

    let (status, body) = ctx
        .post("/tasks", Some(&user.token), json!({ "description": "   " }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "description");

    let (status, _) = ctx.post("/tasks", Some(&user.token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // The author always comes from the session
    let (status, _) = ctx
        .post(
            "/tasks",
            Some(&user.token),
            json!({ "description": "Sneaky", "author": Uuid::new_v4() }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_tasks_filters_and_paginates() {
    let ctx = TestContext::new();
    let user = ctx.register("Andrew", "andrew@example.com").await;

    for i in 0..5 {
        create_task(&ctx, &user.token, &format!("Task {}", i), i % 2 == 0).await;
    }

    let (status, body) = ctx.get("/tasks", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    let descriptions: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|task| task["description"].as_str().unwrap())
        .collect();
    assert_eq!(descriptions, ["Task 0", "Task 1", "Task 2", "Task 3", "Task 4"]);

    let (_, body) = ctx.get("/tasks?completed=true", Some(&user.token)).await;
    assert_eq!(body.as_array().unwrap().len(), 3);

    let (_, body) = ctx.get("/tasks?completed=false", Some(&user.token)).await;
    assert_eq!(body.as_array().unwrap().len(), 2);

    let (_, body) = ctx.get("/tasks?limit=2&skip=1", Some(&user.token)).await;
    let page = body.as_array().unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0]["description"], "Task 1");
    assert_eq!(page[1]["description"], "Task 2");

    let (status, _) = ctx.get("/tasks?completed=maybe", Some(&user.token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_tasks_are_private_to_their_author() {
    let ctx = TestContext::new();
    let andrew = ctx.register("Andrew", "andrew@example.com").await;
    let jess = ctx.register("Jess", "jess@example.com").await;

    let task = create_task(&ctx, &andrew.token, "Andrew's task", false).await;
    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

    let (_, body) = ctx.get("/tasks", Some(&jess.token)).await;
    assert!(body.as_array().unwrap().is_empty());

    let (status, _) = ctx.get(&uri, Some(&jess.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx
        .patch(&uri, Some(&jess.token), json!({ "completed": true }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&uri, Some(&jess.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = ctx.get(&uri, Some(&andrew.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], false);
}

#[tokio::test]
async fn test_update_task() {
    let ctx = TestContext::new();
    let user = ctx.register("Andrew", "andrew@example.com").await;
    let task = create_task(&ctx, &user.token, "Buy milk", false).await;
    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = ctx
        .patch(&uri, Some(&user.token), json!({ "completed": true }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["completed"], true);
    assert_eq!(body["description"], "Buy milk");

    let (status, body) = ctx
        .patch(&uri, Some(&user.token), json!({ "author": Uuid::new_v4(), "completed": false }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_update");

    let (status, _) = ctx
        .patch(&uri, Some(&user.token), json!({ "description": "" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = ctx.get(&uri, Some(&user.token)).await;
    assert_eq!(body["completed"], true);
    assert_eq!(body["author"], user.id);
}

#[tokio::test]
async fn test_delete_task() {
    let ctx = TestContext::new();
    let user = ctx.register("Andrew", "andrew@example.com").await;
    let task = create_task(&ctx, &user.token, "Buy milk", false).await;
    let uri = format!("/tasks/{}", task["id"].as_str().unwrap());

    let (status, body) = ctx.delete(&uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], task["id"]);

    let (status, _) = ctx.get(&uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.delete(&uri, Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_task_id_is_not_found() {
    let ctx = TestContext::new();
    let user = ctx.register("Andrew", "andrew@example.com").await;

    let (status, body) = ctx.get("/tasks/not-an-id", Some(&user.token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_deleting_user_removes_their_tasks() {
    let ctx = TestContext::new();
    let user = ctx.register("Andrew", "andrew@example.com").await;
    create_task(&ctx, &user.token, "Buy milk", false).await;

    let (status, _) = ctx.delete("/users/me", Some(&user.token)).await;
    assert_eq!(status, StatusCode::OK);

    // Same email, new account, empty task list
    let again = ctx.register("Andrew", "andrew@example.com").await;
    let (_, body) = ctx.get("/tasks", Some(&again.token)).await;
    assert!(body.as_array().unwrap().is_empty());
}
