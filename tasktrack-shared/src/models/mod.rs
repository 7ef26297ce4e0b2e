/// Database models for tasktrack
///
/// # Models
///
/// - `user`: User accounts and their session tokens
/// - `task`: Personal tasks owned by a user
///
/// Each model carries its PostgreSQL operations as associated functions
/// taking a `&PgPool`; the [`crate::store`] backends build on these.

pub mod task;
pub mod user;
