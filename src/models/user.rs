//! User model
//!
//! This module defines the User entity and its role for the blog API.
//! Passwords are stored as argon2 hashes and never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address (unique, lower-case)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Short biography
    pub bio: Option<String>,
    /// Avatar image URL
    pub avatar_url: Option<String>,
    /// Personal website
    pub website: Option<String>,
    /// Last successful login
    pub last_login_at: Option<DateTime<Utc>>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User.
    ///
    /// The password must already be hashed, see `services::password::hash_password`.
    pub fn new(name: &str, email: &str, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            name: name.trim().to_string(),
            email: normalize_email(email),
            password_hash,
            role,
            bio: None,
            avatar_url: None,
            website: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Compare against an email without regard to case or surrounding space
    pub fn has_email(&self, email: &str) -> bool {
        self.email == normalize_email(email)
    }
}

/// Canonical form used for storage and uniqueness checks
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User role for authorization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Regular account
    #[default]
    User,
    /// Administrator - full access
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// Input for updating a user profile
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    pub name: Option<String>,
    pub email: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub website: Option<String>,
    pub role: Option<UserRole>,
}

impl UpdateUserInput {
    /// Apply to a user record. Empty optional profile fields are cleared.
    pub fn apply_to(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name.trim().to_string();
        }
        if let Some(email) = self.email {
            user.email = normalize_email(&email);
        }
        if let Some(bio) = self.bio {
            user.bio = Some(bio).filter(|b| !b.trim().is_empty());
        }
        if let Some(avatar_url) = self.avatar_url {
            user.avatar_url = Some(avatar_url).filter(|u| !u.trim().is_empty());
        }
        if let Some(website) = self.website {
            user.website = Some(website).filter(|w| !w.trim().is_empty());
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        user.updated_at = Utc::now();
    }
}

/// Sort keys for user listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum UserSort {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "email")]
    Email,
    #[default]
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl UserSort {
    /// Ascending comparison for this key, ties broken by id
    pub fn compare(&self, a: &User, b: &User) -> Ordering {
        let primary = match self {
            UserSort::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            UserSort::Email => a.email.cmp(&b.email),
            UserSort::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
