//! cyberblog - REST API for a personal cybersecurity blog
//!
//! Articles, categories, accounts, visitor comments and likes, a contact
//! inbox and file uploads, kept in an in-memory store.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;

pub use api::{build_router, AppState};
pub use config::Config;
