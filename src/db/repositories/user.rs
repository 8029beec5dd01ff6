//! User repository
//!
//! This module provides:
//! - `UserRepository` trait defining the interface for user data access
//! - `MemoryUserRepository` backed by a `Table`
//!
//! Emails are stored normalized and are unique across accounts. The
//! admin-count rules (first account becomes admin, the last admin keeps
//! the role) are decided under the same write lock as the mutation.

use crate::db::{Record, StoreError, Table};
use crate::models::{UpdateUserInput, User, UserRole};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;

impl Record for User {
    fn id(&self) -> i64 {
        self.id
    }

    fn set_id(&mut self, id: i64) {
        self.id = id;
    }
}

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user, rejecting an email already registered
    async fn create(&self, user: User) -> Result<User, StoreError>;

    /// Create a user, promoting it to admin while no admin exists
    async fn create_account(&self, user: User) -> Result<User, StoreError>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Option<User>;

    /// Get user by email (normalized before comparing)
    async fn get_by_email(&self, email: &str) -> Option<User>;

    /// List all users
    async fn list(&self) -> Vec<User>;

    /// Apply a profile update
    ///
    /// Rejects an email held by another account and demoting the last admin.
    async fn update(&self, id: i64, input: UpdateUserInput) -> Result<User, StoreError>;

    /// Store a new password hash
    async fn set_password_hash(&self, id: i64, password_hash: String) -> Option<User>;

    /// Stamp the last login time
    async fn record_login(&self, id: i64) -> Option<User>;

    /// Delete a user
    async fn delete(&self, id: i64) -> Result<User, StoreError>;

    /// Total number of accounts
    async fn count(&self) -> usize;
}

/// In-memory user repository
#[derive(Default)]
pub struct MemoryUserRepository {
    table: Table<User>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn UserRepository> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create(&self, user: User) -> Result<User, StoreError> {
        let email = user.email.clone();
        self.table
            .insert_unique(user, |u| u.has_email(&email), "Email is already registered")
            .await
    }

    async fn create_account(&self, mut user: User) -> Result<User, StoreError> {
        self.table
            .write(|rows| {
                if rows.iter().any(|u| u.has_email(&user.email)) {
                    return Err(StoreError::Conflict(
                        "Email is already registered".to_string(),
                    ));
                }
                if !rows.iter().any(User::is_admin) {
                    user.role = UserRole::Admin;
                }
                Ok(rows.push(user))
            })
            .await
    }

    async fn get_by_id(&self, id: i64) -> Option<User> {
        self.table.get(id).await
    }

    async fn get_by_email(&self, email: &str) -> Option<User> {
        self.table.find(|u| u.has_email(email)).await
    }

    async fn list(&self) -> Vec<User> {
        self.table.all().await
    }

    async fn update(&self, id: i64, input: UpdateUserInput) -> Result<User, StoreError> {
        self.table
            .modify(id, |user, rows| {
                let was_admin = user.is_admin();
                input.apply_to(user);
                if was_admin && !user.is_admin() && !rows.any_other(id, User::is_admin) {
                    return Err(StoreError::Rejected(
                        "Cannot demote the last administrator".to_string(),
                    ));
                }
                if rows.any_other(id, |u| u.has_email(&user.email)) {
                    return Err(StoreError::Conflict(
                        "Email is already registered".to_string(),
                    ));
                }
                Ok(())
            })
            .await
            .map(|(user, ())| user)
    }

    async fn set_password_hash(&self, id: i64, password_hash: String) -> Option<User> {
        self.table
            .update_with(id, |u| {
                u.password_hash = password_hash;
                u.updated_at = Utc::now();
            })
            .await
    }

    async fn record_login(&self, id: i64) -> Option<User> {
        self.table
            .update_with(id, |u| u.last_login_at = Some(Utc::now()))
            .await
    }

    async fn delete(&self, id: i64) -> Result<User, StoreError> {
        self.table.remove(id).await
    }

    async fn count(&self) -> usize {
        self.table.count(|_| true).await
    }
}
