/// User endpoints
///
/// # Endpoints
///
/// - `POST /users` - Register and receive a session token
/// - `POST /users/login` - Login and receive a session token
/// - `POST /users/logout` - End the current session
/// - `POST /users/logoutAll` - End every session of the caller
/// - `GET /users/me` - The caller's profile
/// - `PATCH /users/me` - Update name, email, password or age
/// - `DELETE /users/me` - Delete the caller's account
///
/// Everything except register and login sits behind the session gate and
/// acts only on the authenticated user.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{extract::rejection::JsonRejection, extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use tasktrack_shared::{
    auth::{
        password,
        session::{issue_token, revoke, revoke_all, AuthSession},
    },
    models::user::{CreateUser, UpdateUser, User},
};
use tracing::info;
use validator::{Validate, ValidationError};

/// Register request
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: String,

    /// Email address
    #[validate(
        email(message = "Email is not valid"),
        custom(function = "email_domain"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: String,

    /// Plaintext password, checked against the password policy
    #[validate(custom(function = "password_policy"))]
    pub password: String,

    /// Age (defaults to 0)
    #[serde(default)]
    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: i32,
}

impl RegisterRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password.trim().to_string(),
            age: self.age,
        }
    }
}

/// Login request
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Profile update request
///
/// Only these four fields may be changed; any other key rejects the whole
/// request.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct UpdateMeRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    pub name: Option<String>,

    #[validate(
        email(message = "Email is not valid"),
        custom(function = "email_domain"),
        length(max = 255, message = "Email must be at most 255 characters")
    )]
    pub email: Option<String>,

    #[validate(custom(function = "password_policy"))]
    pub password: Option<String>,

    #[validate(range(min = 0, message = "Age must be a positive number"))]
    pub age: Option<i32>,
}

impl UpdateMeRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self.email.as_deref().map(normalize_email),
            password: self.password.map(|password| password.trim().to_string()),
            age: self.age,
        }
    }
}

/// Register and login response
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// The user, without credentials
    pub user: User,

    /// Newly issued session token
    pub token: String,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Requires a dotted domain ending in an alphabetic TLD of two or more
/// letters, which the HTML5 `email` rule alone lets through (`a@b`)
fn email_domain(email: &str) -> Result<(), ValidationError> {
    // Missing `@` is reported by the `email` rule
    let Some((_, domain)) = email.rsplit_once('@') else {
        return Ok(());
    };

    let labels: Vec<&str> = domain.split('.').collect();
    let tld = labels.last().copied().unwrap_or_default();

    if labels.len() >= 2
        && labels.iter().all(|label| !label.is_empty())
        && (tld.starts_with("xn--")
            || (tld.chars().count() >= 2 && tld.chars().all(char::is_alphabetic)))
    {
        return Ok(());
    }

    let mut error = ValidationError::new("email_domain");
    error.message = Some(Cow::Borrowed("Email is not valid"));
    Err(error)
}

fn password_policy(password: &str) -> Result<(), ValidationError> {
    password::validate_password_policy(password).map_err(|message| {
        let mut error = ValidationError::new("password_policy");
        error.message = Some(Cow::Owned(message));
        error
    })
}

/// Register a new user
///
/// ```text
/// POST /users
/// {"name": "Andrew", "email": "andrew@example.com", "password": "Red12345!", "age": 27}
/// ```
///
/// Responds `201` with `{user, token}`. A taken email is a validation error
/// on `email`.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;
    let req = req.normalized();
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = state
        .store
        .create_user(CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            age: req.age,
        })
        .await?;

    let token = issue_token(&*state.store, state.jwt_secret(), user.id).await?;

    info!(user_id = %user.id, "Registered user");

    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Login with email and password
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;
    let email = normalize_email(&req.email);

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    if !password::verify_password(&req.password, &user.password_hash)? {
        return Err(ApiError::InvalidCredentials);
    }

    let token = issue_token(&*state.store, state.jwt_secret(), user.id).await?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(AuthResponse { user, token }))
}

/// End the session this request was authenticated with
pub async fn logout(State(state): State<AppState>, session: AuthSession) -> ApiResult<StatusCode> {
    revoke(&*state.store, &session).await?;

    info!(user_id = %session.user.id, "User logged out");

    Ok(StatusCode::OK)
}

/// End every session of the caller
pub async fn logout_all(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<StatusCode> {
    let revoked = revoke_all(&*state.store, session.user.id).await?;

    info!(user_id = %session.user.id, revoked, "User logged out everywhere");

    Ok(StatusCode::OK)
}

/// The caller's profile
pub async fn me(session: AuthSession) -> Json<User> {
    Json(session.user)
}

/// Update the caller's profile
///
/// The password is re-hashed only when a new one is supplied.
pub async fn update_me(
    State(state): State<AppState>,
    session: AuthSession,
    payload: Result<Json<UpdateMeRequest>, JsonRejection>,
) -> ApiResult<Json<User>> {
    let Json(req) = payload.map_err(|rejection| ApiError::InvalidUpdate(rejection.body_text()))?;
    let req = req.normalized();
    req.validate()?;

    let changes = UpdateUser {
        name: req.name,
        email: req.email,
        password_hash: req
            .password
            .as_deref()
            .map(password::hash_password)
            .transpose()?,
        age: req.age,
    };

    if changes.is_empty() {
        return Ok(Json(session.user));
    }

    let user = state
        .store
        .update_user(session.user.id, changes)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user))
}

/// Delete the caller's account, its sessions and its tasks
pub async fn delete_me(
    State(state): State<AppState>,
    session: AuthSession,
) -> ApiResult<Json<User>> {
    let user = state
        .store
        .delete_user(session.user.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    info!(user_id = %user.id, "Deleted user");

    Ok(Json(user))
}
