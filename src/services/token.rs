//! Bearer tokens
//!
//! HS256 JSON Web Tokens carrying the user id, email and role. The service
//! signs on login/register and turns an incoming token into an `AuthUser`.
//!
//! Verification has three outcomes a client can tell apart: expired,
//! malformed (bad signature, garbage, wrong algorithm) and structurally
//! valid but carrying claims this API does not understand.

use crate::models::{User, UserRole};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried in every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    pub email: String,
    /// `user` or `admin`
    pub role: String,
    /// Issued at (Unix seconds)
    pub iat: i64,
    /// Expiration (Unix seconds)
    pub exp: i64,
}

/// Errors from token handling
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Authentication token is missing")]
    Missing,

    #[error("Token has expired")]
    Expired,

    #[error("Invalid token")]
    Malformed,

    #[error("Invalid token claims: {0}")]
    InvalidClaims(String),

    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Identity attached to an authenticated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Owner or admin
    pub fn can_modify(&self, owner_id: i64) -> bool {
        self.id == owner_id || self.is_admin()
    }
}

impl TryFrom<Claims> for AuthUser {
    type Error = TokenError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let id = claims
            .sub
            .parse::<i64>()
            .map_err(|_| TokenError::InvalidClaims("sub is not a user id".to_string()))?;
        let role = claims
            .role
            .parse::<UserRole>()
            .map_err(|_| TokenError::InvalidClaims(format!("unknown role '{}'", claims.role)))?;
        if claims.email.trim().is_empty() {
            return Err(TokenError::InvalidClaims("email is empty".to_string()));
        }
        Ok(Self {
            id,
            email: claims.email,
            role,
        })
    }
}

/// Signs and verifies tokens with one shared secret
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// Sign a token for the user with the configured lifetime
    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_with_ttl(user, self.ttl)
    }

    /// Sign a token with an explicit lifetime
    pub fn issue_with_ttl(&self, user: &User, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    /// Decode and check a token
    pub fn verify(&self, token: &str) -> Result<AuthUser, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                ErrorKind::MissingRequiredClaim(claim) => {
                    TokenError::InvalidClaims(format!("missing {}", claim))
                }
                _ => TokenError::Malformed,
            }
        })?;

        AuthUser::try_from(data.claims)
    }
}

/// Pull the token out of an `Authorization: Bearer <token>` header value
pub fn bearer_token(header: Option<&str>) -> Result<&str, TokenError> {
    let value = header.ok_or(TokenError::Missing)?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))
        .ok_or(TokenError::Malformed)?
        .trim();
    if token.is_empty() {
        return Err(TokenError::Missing);
    }
    Ok(token)
}
