/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`; the error half renders as a JSON
/// body of the form `{"error", "message", "details"?}`. Authentication
/// failures are the exception and always render as
/// `401 {"error": "Please authenticate."}`.
///
/// # Example
///
/// ```
/// use tasktrack_api::error::{ApiError, ApiResult};
/// use axum::Json;
/// use serde_json::json;
///
/// async fn handler(found: bool) -> ApiResult<Json<serde_json::Value>> {
///     if !found {
///         return Err(ApiError::NotFound("Task not found".to_string()));
///     }
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tasktrack_shared::{
    auth::{
        jwt::JwtError,
        middleware::AuthRejection,
        password::PasswordError,
        session::SessionError,
    },
    store::StoreError,
};

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400): malformed body or query
    BadRequest(String),

    /// Validation failed (400)
    ValidationError(Vec<ValidationErrorDetail>),

    /// Update body names a field outside the allow-list (400)
    InvalidUpdate(String),

    /// Login with an unknown email or wrong password (400)
    InvalidCredentials,

    /// Missing, invalid or revoked session token (401)
    Unauthenticated,

    /// Not found (404)
    NotFound(String),

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

impl ValidationErrorDetail {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code (e.g., "bad_request", "invalid_update")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// Optional validation errors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::ValidationError(errors) => {
                write!(f, "Validation failed: {} errors", errors.len())
            }
            ApiError::InvalidUpdate(msg) => write!(f, "Invalid updates: {}", msg),
            ApiError::InvalidCredentials => write!(f, "Unable to login"),
            ApiError::Unauthenticated => write!(f, "Unauthenticated"),
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = match self {
            ApiError::Unauthenticated => return AuthRejection.into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg, None),
            ApiError::ValidationError(errors) => (
                StatusCode::BAD_REQUEST,
                "validation_error",
                "Request validation failed".to_string(),
                Some(errors),
            ),
            ApiError::InvalidUpdate(msg) => (
                StatusCode::BAD_REQUEST,
                "invalid_update",
                format!("Invalid updates! {}", msg).trim_end().to_string(),
                None,
            ),
            ApiError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                "invalid_credentials",
                "Unable to login".to_string(),
                None,
            ),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg, None),
            ApiError::InternalError(msg) => {
                // Log internal errors but don't expose details to clients
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

/// Convert validator errors to API errors
impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                    ValidationErrorDetail::new(field.to_string(), message)
                })
            })
            .collect();

        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::ValidationError(details)
    }
}

/// Convert storage errors to API errors
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => ApiError::ValidationError(vec![
                ValidationErrorDetail::new("email", "Email is already in use"),
            ]),
            StoreError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            StoreError::DuplicateToken | StoreError::Database(_) => {
                ApiError::InternalError(err.to_string())
            }
        }
    }
}

/// Convert password errors to API errors
impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        ApiError::InternalError(format!("Password operation failed: {}", err))
    }
}

/// Convert JWT errors to API errors
///
/// Only reachable while signing; verification failures go through the gate.
impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        ApiError::InternalError(format!("Token operation failed: {}", err))
    }
}

/// Convert session errors to API errors
impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Store(e) => e.into(),
            SessionError::Token(JwtError::CreateError(msg)) => {
                ApiError::InternalError(format!("Token operation failed: {}", msg))
            }
            SessionError::MissingCredentials | SessionError::Token(_) | SessionError::Revoked => {
                ApiError::Unauthenticated
            }
        }
    }
}

impl From<AuthRejection> for ApiError {
    fn from(_: AuthRejection) -> Self {
        ApiError::Unauthenticated
    }
}

/// Convert JSON body rejections to API errors
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Convert query string rejections to API errors
impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    async fn render(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::BadRequest("Invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: Invalid input");

        let err = ApiError::NotFound("Task not found".to_string());
        assert_eq!(err.to_string(), "Not found: Task not found");

        let err = ApiError::ValidationError(vec![
            ValidationErrorDetail::new("email", "Email is not valid"),
            ValidationErrorDetail::new("age", "Age must be a positive number"),
        ]);
        assert_eq!(err.to_string(), "Validation failed: 2 errors");
    }

    #[tokio::test]
    async fn test_unauthenticated_body() {
        let (status, body) = render(ApiError::Unauthenticated).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Please authenticate." }));
    }

    #[tokio::test]
    async fn test_client_errors_are_400() {
        let (status, body) = render(ApiError::InvalidUpdate(String::new())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_update");
        assert_eq!(body["message"], "Invalid updates!");

        let (status, body) = render(ApiError::InvalidCredentials).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_credentials");
        assert!(body.get("details").is_none());
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let (status, body) = render(ApiError::InternalError("pool timed out".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_validation_error() {
        let (status, body) = render(StoreError::DuplicateEmail.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["details"][0]["field"], "email");
    }

    #[test]
    fn test_session_errors() {
        assert!(matches!(
            ApiError::from(SessionError::Revoked),
            ApiError::Unauthenticated
        ));
        assert!(matches!(
            ApiError::from(SessionError::Token(JwtError::InvalidSignature)),
            ApiError::Unauthenticated
        ));
        assert!(matches!(
            ApiError::from(SessionError::Store(StoreError::UserNotFound)),
            ApiError::NotFound(_)
        ));
    }
}
