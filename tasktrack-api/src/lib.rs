//! # TaskTrack API Server Library
//!
//! HTTP surface of TaskTrack: user accounts with revocable session tokens
//! and per-user tasks.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod routes;
