//! # TaskDeck API Server Library
//!
//! HTTP surface of TaskDeck: users own projects, projects hold boards and
//! labels, boards hold tasks with comments, attachments and history.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validated JSON bodies and path ID parsing
//! - `middleware`: Response security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
