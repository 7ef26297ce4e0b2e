//! # Tasktrack Shared Library
//!
//! Types, storage and authentication primitives used by the tasktrack API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: User and task records plus their create/update inputs
//! - `store`: Storage traits with PostgreSQL and in-memory backends
//! - `auth`: Password hashing, session tokens and the authentication gate
//! - `db`: PostgreSQL pool and migrations

pub mod auth;
pub mod db;
pub mod models;
pub mod store;

/// Current version of the tasktrack shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
