/// Authentication gate for Axum
///
/// [`authenticate_request`] is the body of the middleware placed in front of
/// every protected route. It reads `Authorization: Bearer <token>`, resolves
/// the token through [`super::session::authenticate`] and stores the
/// resulting [`AuthSession`] in the request extensions. Handlers then take
/// `AuthSession` as an extractor.
///
/// Every failure, whether a missing header, a bad signature, a revoked token
/// or a store error, produces the same `401 {"error": "Please authenticate."}`.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use axum::{extract::{Request, State}, middleware::{self, Next}, routing::get, Router};
/// use tasktrack_shared::auth::middleware::{authenticate_request, AuthRejection};
/// use tasktrack_shared::auth::session::AuthSession;
/// use tasktrack_shared::store::MemoryStore;
///
/// async fn me(session: AuthSession) -> String {
///     session.user.name
/// }
///
/// async fn gate(
///     State(store): State<Arc<MemoryStore>>,
///     req: Request,
///     next: Next,
/// ) -> Result<axum::response::Response, AuthRejection> {
///     authenticate_request(&*store, "signing-secret", req, next).await
/// }
///
/// let store = Arc::new(MemoryStore::new());
/// let app: Router = Router::new()
///     .route("/me", get(me))
///     .route_layer(middleware::from_fn_with_state(store.clone(), gate))
///     .with_state(store);
/// ```

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{debug, error};

use super::session::{authenticate, bearer_token, AuthSession, SessionError};
use crate::store::UserStore;

/// Body message of every authentication failure
pub const UNAUTHENTICATED_MESSAGE: &str = "Please authenticate.";

/// Rejection returned by the gate and by the `AuthSession` extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthRejection;

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": UNAUTHENTICATED_MESSAGE })),
        )
            .into_response()
    }
}

/// Authenticates a request and passes it on with its `AuthSession` attached
pub async fn authenticate_request<S>(
    store: &S,
    secret: &str,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthRejection>
where
    S: UserStore + ?Sized,
{
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(bearer_token)
        .map(str::to_owned);

    let result = match token {
        Some(token) => authenticate(store, secret, &token).await,
        None => Err(SessionError::MissingCredentials),
    };

    let session = match result {
        Ok(session) => session,
        Err(SessionError::Store(e)) => {
            error!(error = %e, "Credential store failed during authentication");
            return Err(AuthRejection);
        }
        Err(e) => {
            debug!(reason = %e, "Rejected unauthenticated request");
            return Err(AuthRejection);
        }
    };

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthSession
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthSession>()
            .cloned()
            .ok_or(AuthRejection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_rejection_response() {
        let response = AuthRejection.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({ "error": "Please authenticate." }));
    }

    #[tokio::test]
    async fn test_extractor_without_session() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();

        let result = AuthSession::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.err(), Some(AuthRejection));
    }
}
