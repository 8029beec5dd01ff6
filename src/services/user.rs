//! User service
//!
//! Implements business logic for accounts:
//! - Registration (the first account becomes admin while no admin exists)
//! - Login with per-email failure limiting
//! - Profile reads and updates (self or admin; only admins change roles)
//! - Password changes and account deletion

use crate::db::repositories::UserRepository;
use crate::db::StoreError;
use crate::models::{
    ListParams, PagedResult, SortOrder, UpdateUserInput, User, UserRole, UserSort,
};
use crate::services::password::{hash_password, verify_password};
use crate::services::rate_limiter::LoginRateLimiter;
use crate::services::token::{AuthUser, TokenError, TokenService};
use serde::Serialize;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Duplicate(String),

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Too many failed login attempts, try again later")]
    RateLimited,

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for UserServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Conflict(msg) => Self::Duplicate(msg),
            StoreError::Rejected(msg) => Self::Validation(msg),
        }
    }
}

/// Input for registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Input for login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

/// Filters for the admin user listing
#[derive(Debug, Clone, Default)]
pub struct UserQuery {
    pub search: Option<String>,
    pub role: Option<UserRole>,
    pub sort: UserSort,
    pub order: Option<SortOrder>,
    pub params: ListParams,
}

/// A signed token together with the account it belongs to
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: User,
}

/// User service for managing accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    tokens: TokenService,
    limiter: LoginRateLimiter,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, tokens: TokenService) -> Self {
        Self::with_rate_limiter(user_repo, tokens, LoginRateLimiter::new())
    }

    pub fn with_rate_limiter(
        user_repo: Arc<dyn UserRepository>,
        tokens: TokenService,
        limiter: LoginRateLimiter,
    ) -> Self {
        Self {
            user_repo,
            tokens,
            limiter,
        }
    }

    /// Token verifier shared with the auth middleware
    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    /// Limiter handle for the periodic cleanup task
    pub fn rate_limiter(&self) -> LoginRateLimiter {
        self.limiter.clone()
    }

    /// Register a new account and sign a token for it
    ///
    /// A duplicate email fails before anything is stored.
    pub async fn register(&self, input: RegisterInput) -> Result<AuthSession, UserServiceError> {
        if self.user_repo.get_by_email(&input.email).await.is_some() {
            return Err(UserServiceError::Duplicate(
                "Email is already registered".to_string(),
            ));
        }

        let password_hash = hash_password(&input.password)?;
        let user = self
            .user_repo
            .create_account(User::new(&input.name, &input.email, password_hash, UserRole::User))
            .await?;

        tracing::info!(user_id = user.id, role = %user.role, "User registered");

        let token = self.tokens.issue(&user)?;
        Ok(AuthSession { token, user })
    }

    /// Check credentials and sign a token
    pub async fn login(&self, input: LoginInput) -> Result<AuthSession, UserServiceError> {
        if self.limiter.is_limited(&input.email).await {
            tracing::warn!(email = %input.email, "Login refused: too many failures");
            return Err(UserServiceError::RateLimited);
        }

        let user = match self.user_repo.get_by_email(&input.email).await {
            Some(user) => user,
            None => {
                self.limiter.record_failure(&input.email).await;
                return Err(UserServiceError::InvalidCredentials);
            }
        };

        if !verify_password(&input.password, &user.password_hash)? {
            self.limiter.record_failure(&input.email).await;
            tracing::info!(user_id = user.id, "Failed login");
            return Err(UserServiceError::InvalidCredentials);
        }

        self.limiter.clear(&input.email).await;
        let user = self.user_repo.record_login(user.id).await.unwrap_or(user);
        let token = self.tokens.issue(&user)?;

        tracing::info!(user_id = user.id, "User logged in");
        Ok(AuthSession { token, user })
    }

    /// Get a user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<User, UserServiceError> {
        self.user_repo
            .get_by_id(id)
            .await
            .ok_or(UserServiceError::NotFound(id))
    }

    /// Get a profile as seen by `actor` (self or admin)
    pub async fn get_for(&self, actor: &AuthUser, id: i64) -> Result<User, UserServiceError> {
        if !actor.can_modify(id) {
            return Err(UserServiceError::Forbidden(
                "You can only view your own profile".to_string(),
            ));
        }
        self.get_by_id(id).await
    }

    /// Filtered, sorted, paginated listing
    pub async fn list(&self, query: UserQuery) -> PagedResult<User> {
        let needle = query.search.as_deref().map(str::to_lowercase);
        let mut users: Vec<User> = self
            .user_repo
            .list()
            .await
            .into_iter()
            .filter(|u| query.role.map_or(true, |r| u.role == r))
            .filter(|u| match &needle {
                Some(n) => u.name.to_lowercase().contains(n) || u.email.contains(n),
                None => true,
            })
            .collect();

        let order = query.order.unwrap_or(match query.sort {
            UserSort::CreatedAt => SortOrder::Desc,
            _ => SortOrder::Asc,
        });
        users.sort_by(|a, b| order.apply(query.sort.compare(a, b)));

        PagedResult::paginate(users, &query.params)
    }

    /// Update a profile
    ///
    /// Users edit themselves; admins edit anyone and may change roles.
    /// The last admin cannot be demoted.
    pub async fn update(
        &self,
        actor: &AuthUser,
        id: i64,
        input: UpdateUserInput,
    ) -> Result<User, UserServiceError> {
        if !actor.can_modify(id) {
            return Err(UserServiceError::Forbidden(
                "You can only edit your own profile".to_string(),
            ));
        }
        if input.role.is_some() && !actor.is_admin() {
            return Err(UserServiceError::Forbidden(
                "Only administrators can change roles".to_string(),
            ));
        }

        let user = self.user_repo.update(id, input).await?;
        tracing::info!(user_id = user.id, actor = actor.id, "User updated");
        Ok(user)
    }

    /// Change the caller's password after checking the current one
    pub async fn change_password(
        &self,
        id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        let user = self.get_by_id(id).await?;
        if !verify_password(current_password, &user.password_hash)? {
            return Err(UserServiceError::InvalidCredentials);
        }

        let password_hash = hash_password(new_password)?;
        self.user_repo
            .set_password_hash(id, password_hash)
            .await
            .ok_or(UserServiceError::NotFound(id))?;

        tracing::info!(user_id = id, "Password changed");
        Ok(())
    }

    /// Delete an account. Admins cannot delete themselves.
    pub async fn delete(&self, actor: &AuthUser, id: i64) -> Result<(), UserServiceError> {
        if actor.id == id {
            return Err(UserServiceError::Validation(
                "You cannot delete your own account".to_string(),
            ));
        }
        let user = self.user_repo.delete(id).await?;
        tracing::info!(user_id = user.id, actor = actor.id, "User deleted");
        Ok(())
    }

    /// Create the configured admin account unless the email is taken
    pub async fn ensure_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, UserServiceError> {
        if let Some(existing) = self.user_repo.get_by_email(email).await {
            return Ok(existing);
        }
        let hash = hash_password(password)?;
        let user = self
            .user_repo
            .create(User::new(name, email, hash, UserRole::Admin))
            .await?;
        tracing::info!(user_id = user.id, "Admin account created");
        Ok(user)
    }

    pub async fn count(&self) -> usize {
        self.user_repo.count().await
    }
}
