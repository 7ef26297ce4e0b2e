/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: Registration, login, logout and the `/users/me` surface
/// - `tasks`: The authenticated user's tasks

pub mod health;
pub mod tasks;
pub mod users;
