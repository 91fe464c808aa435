//! # TaskDeck Shared Library
//!
//! Domain layer of the TaskDeck backend, used by the API server.
//!
//! ## Module Organization
//!
//! - `auth`: passwords, session tokens, the ownership gate, Google OAuth
//! - `db`: connection pool and migrations
//! - `models`: row types and their queries
//! - `mutation`: transactional create/update/move of tasks with history
//! - `storage`: object store for attachment bytes

pub mod auth;
pub mod db;
pub mod models;
pub mod mutation;
pub mod storage;

/// Current version of the TaskDeck shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
