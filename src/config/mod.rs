//! Configuration management
//!
//! Configuration is loaded from an optional `config.yml` file and then
//! overridden by environment variables. Missing values fall back to defaults,
//! so an empty or absent file yields a runnable development setup.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Fallback signing secret used when neither the file nor `JWT_SECRET` set one.
pub const DEFAULT_JWT_SECRET: &str = "cyberblog-development-secret-change-me";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Authentication configuration
    #[serde(default)]
    pub auth: AuthConfig,
    /// Upload configuration
    #[serde(default)]
    pub upload: UploadConfig,
    /// Seed default categories and a welcome article on start
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            auth: AuthConfig::default(),
            upload: UploadConfig::default(),
            seed_demo_data: default_seed_demo_data(),
        }
    }
}

fn default_seed_demo_data() -> bool {
    true
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin of the single-page front end, allowed by CORS
    #[serde(default = "default_frontend_url")]
    pub frontend_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            frontend_url: default_frontend_url(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// HMAC secret for bearer tokens
    #[serde(default = "default_jwt_secret")]
    pub jwt_secret: String,
    /// Token lifetime in hours
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: i64,
    /// Static key checked by the dashboard unlock endpoint
    #[serde(default)]
    pub admin_key: Option<String>,
    /// Email of the admin account created at startup
    #[serde(default)]
    pub admin_email: Option<String>,
    /// Password of the admin account created at startup
    #[serde(default)]
    pub admin_password: Option<String>,
    /// Display name of the admin account created at startup
    #[serde(default = "default_admin_name")]
    pub admin_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: default_jwt_secret(),
            token_ttl_hours: default_token_ttl_hours(),
            admin_key: None,
            admin_email: None,
            admin_password: None,
            admin_name: default_admin_name(),
        }
    }
}

impl AuthConfig {
    /// True when tokens are signed with the built-in fallback secret
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

fn default_jwt_secret() -> String {
    DEFAULT_JWT_SECRET.to_string()
}

fn default_token_ttl_hours() -> i64 {
    24 * 7
}

fn default_admin_name() -> String {
    "Administrator".to_string()
}

/// Upload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Upload directory path
    #[serde(default = "default_upload_path")]
    pub path: PathBuf,
    /// Maximum file size in bytes (default: 10MB)
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    /// Maximum number of files accepted by one request
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Allowed MIME types
    #[serde(default = "default_allowed_types")]
    pub allowed_types: Vec<String>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            path: default_upload_path(),
            max_file_size: default_max_file_size(),
            max_files: default_max_files(),
            allowed_types: default_allowed_types(),
        }
    }
}

fn default_upload_path() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_max_files() -> usize {
    5
}

fn default_allowed_types() -> Vec<String> {
    [
        "image/jpeg",
        "image/png",
        "image/gif",
        "image/webp",
        "image/svg+xml",
        "application/pdf",
        "text/plain",
        "text/markdown",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}

impl UploadConfig {
    /// Check if a MIME type is allowed
    pub fn is_type_allowed(&self, mime_type: &str) -> bool {
        self.allowed_types.iter().any(|t| t == mime_type)
    }

    /// Get file extension for a MIME type
    pub fn extension_for(mime_type: &str) -> &'static str {
        match mime_type {
            "image/jpeg" => "jpg",
            "image/png" => "png",
            "image/gif" => "gif",
            "image/webp" => "webp",
            "image/svg+xml" => "svg",
            "application/pdf" => "pdf",
            "text/plain" => "txt",
            "text/markdown" => "md",
            _ => "bin",
        }
    }

    /// Upper bound for a whole multipart request body
    pub fn body_limit(&self) -> usize {
        let files = self.max_files.max(1) as u64;
        (self.max_file_size.saturating_mul(files) + 64 * 1024) as usize
    }
}

/// Error type for configuration parsing
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    FileRead {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {message}")]
    ParseError { path: String, message: String },
}

impl Config {
    /// Load configuration from file
    ///
    /// A missing or empty file yields the default configuration.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            source: e,
        })?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.display().to_string(),
            message: format_yaml_error(&e),
        })
    }

    /// Load configuration from file, then apply environment overrides
    ///
    /// Recognised variables:
    /// - `PORT`, `FRONTEND_URL`, `JWT_SECRET`, `ADMIN_KEY`
    /// - `BLOG_HOST`, `BLOG_UPLOAD_DIR`, `BLOG_MAX_FILE_SIZE`
    /// - `BLOG_TOKEN_TTL_HOURS`, `BLOG_ADMIN_EMAIL`, `BLOG_ADMIN_PASSWORD`
    pub fn load_with_env(path: &std::path::Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(host) = std::env::var("BLOG_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(url) = std::env::var("FRONTEND_URL") {
            self.server.frontend_url = url;
        }

        if let Ok(secret) = std::env::var("JWT_SECRET") {
            if !secret.is_empty() {
                self.auth.jwt_secret = secret;
            }
        }
        if let Ok(ttl) = std::env::var("BLOG_TOKEN_TTL_HOURS") {
            if let Ok(ttl) = ttl.parse::<i64>() {
                if ttl > 0 {
                    self.auth.token_ttl_hours = ttl;
                }
            }
        }
        if let Ok(key) = std::env::var("ADMIN_KEY") {
            self.auth.admin_key = Some(key).filter(|k| !k.is_empty());
        }
        if let Ok(email) = std::env::var("BLOG_ADMIN_EMAIL") {
            self.auth.admin_email = Some(email);
        }
        if let Ok(password) = std::env::var("BLOG_ADMIN_PASSWORD") {
            self.auth.admin_password = Some(password);
        }

        if let Ok(dir) = std::env::var("BLOG_UPLOAD_DIR") {
            self.upload.path = PathBuf::from(dir);
        }
        if let Ok(size) = std::env::var("BLOG_MAX_FILE_SIZE") {
            if let Ok(size) = size.parse::<u64>() {
                self.upload.max_file_size = size;
            }
        }
    }

    /// Socket address string the server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Format YAML parsing error with location and context
fn format_yaml_error(e: &serde_yaml::Error) -> String {
    match e.location() {
        Some(location) => format!(
            "at line {}, column {}: {}",
            location.line(),
            location.column(),
            e
        ),
        None => e.to_string(),
    }
}

// Shared by every test that touches process environment variables.
#[cfg(test)]
static CONFIG_ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
