/// Application state and router builder
///
/// This module defines the shared application state and provides
/// a function to build the Axum router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use tasktrack_api::{app::{build_router, AppState}, config::Config};
/// use tasktrack_shared::store::MemoryStore;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let state = AppState::new(Arc::new(MemoryStore::new()), config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, routes};
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tasktrack_shared::{
    auth::middleware::{authenticate_request, AuthRejection},
    store::SharedStore,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Storage backend
    pub store: SharedStore,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(store: SharedStore, config: Config) -> Self {
        Self {
            store,
            config: Arc::new(config),
        }
    }

    /// Gets the secret session tokens are signed with
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// ```text
/// /
/// ├── GET    /health              # public
/// ├── POST   /users               # register (public)
/// ├── POST   /users/login         # public
/// ├── POST   /users/logout        # authenticated from here down
/// ├── POST   /users/logoutAll
/// ├── GET    /users/me
/// ├── PATCH  /users/me
/// ├── DELETE /users/me
/// ├── POST   /tasks
/// ├── GET    /tasks
/// ├── GET    /tasks/:id
/// ├── PATCH  /tasks/:id
/// └── DELETE /tasks/:id
/// ```
pub fn build_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users", post(routes::users::register))
        .route("/users/login", post(routes::users::login));

    // route_layer so unknown paths still 404 instead of 401
    let protected_routes = Router::new()
        .route("/users/logout", post(routes::users::logout))
        .route("/users/logoutAll", post(routes::users::logout_all))
        .route(
            "/users/me",
            get(routes::users::me)
                .patch(routes::users::update_me)
                .delete(routes::users::delete_me),
        )
        .route(
            "/tasks",
            post(routes::tasks::create_task).get(routes::tasks::list_tasks),
        )
        .route(
            "/tasks/:id",
            get(routes::tasks::get_task)
                .patch(routes::tasks::update_task)
                .delete(routes::tasks::delete_task),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let cors = if state.config.api.cors_origins.iter().any(|origin| origin == "*") {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// Session authentication middleware
///
/// Resolves the bearer token against the store and attaches the
/// `AuthSession` for handlers to extract.
async fn require_auth(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AuthRejection> {
    authenticate_request(&*state.store, state.jwt_secret(), req, next).await
}
