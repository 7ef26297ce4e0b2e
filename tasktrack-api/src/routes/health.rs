/// Health check endpoint
///
/// Reports whether the server is running and its storage backend answers.
///
/// # Endpoint
///
/// ```text
/// GET /health
/// ```
///
/// # Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "backend": "postgres",
///   "storage": "connected"
/// }
/// ```

use crate::{app::AppState, error::ApiResult};
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Application version
    pub version: String,

    /// Storage backend name
    pub backend: String,

    /// Storage status
    pub storage: String,
}

/// Health check handler
///
/// Always answers 200; a failing storage ping only downgrades the status.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let storage_status = match state.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            tracing::warn!(error = %e, "Storage health check failed");
            "disconnected"
        }
    };

    Ok(Json(HealthResponse {
        status: if storage_status == "connected" {
            "healthy".to_string()
        } else {
            "degraded".to_string()
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.store.backend().to_string(),
        storage: storage_status.to_string(),
    }))
}
