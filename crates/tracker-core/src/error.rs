//! Centralized error types for the issue tracker.
//!
//! Every failure that can reach the panel is one of these types, so the
//! presenter can always turn it into a message suitable for display while the
//! full error stays available for logging.

use thiserror::Error;

/// Top-level application error type.
///
/// Use `user_message()` to get a UI-appropriate message.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("GitHub API error: {0}")]
    GitHub(#[from] GitHubError),

    /// Service-level errors raised by a gateway that is not HTTP backed.
    #[error("Service error: {0}")]
    Service(String),
}

impl AppError {
    /// Returns a user-friendly message suitable for display in the UI.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Config(e) => e.user_message(),
            AppError::GitHub(e) => e.user_message(),
            AppError::Service(_) => "Something went wrong. Please try again.",
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Check your internet connection."
            }
            NetworkError::Timeout => "The request timed out. Please try again.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The server is experiencing issues. Please try again later."
            }
            NetworkError::ServerError { .. } => "The request failed. Please try again.",
            NetworkError::InvalidResponse(_) => {
                "Received an unexpected response. Please try again."
            }
        }
    }
}

/// Settings that make a gateway impossible to build.
///
/// File loading and parsing failures stay in `anyhow` at startup; these are
/// the ones that can surface later through a `Result<_, AppError>`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required setting: {0}")]
    MissingSetting(String),
}

impl ConfigError {
    pub fn user_message(&self) -> &'static str {
        match self {
            ConfigError::Invalid(_) => "Invalid configuration. Check your settings.",
            ConfigError::MissingSetting(_) => "A required setting is missing. Check your settings.",
        }
    }
}

/// GitHub API errors.
#[derive(Debug, Error)]
pub enum GitHubError {
    #[error("Rate limited (resets at {reset_time})")]
    RateLimited { reset_time: String },

    #[error("Repository not found: {owner}/{repo}")]
    RepoNotFound { owner: String, repo: String },

    #[error("Unauthorized - token may be invalid or expired")]
    Unauthorized,

    #[error("Forbidden - insufficient permissions")]
    Forbidden,

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },
}

impl GitHubError {
    /// Create a GitHubError from an arbitrary message.
    /// Uses status 0 to indicate non-HTTP origin.
    pub fn message(msg: impl Into<String>) -> Self {
        GitHubError::ApiError {
            status: 0,
            message: msg.into(),
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            GitHubError::RateLimited { .. } => {
                "GitHub rate limit exceeded. Please wait and try again."
            }
            GitHubError::RepoNotFound { .. } => {
                "Repository not found. Check the owner and repository settings."
            }
            GitHubError::Unauthorized => "GitHub rejected the token. Check your settings.",
            GitHubError::Forbidden => "You don't have permission to access this resource.",
            GitHubError::ApiError { status, .. } if *status >= 500 => {
                "GitHub is experiencing issues. Please try again later."
            }
            GitHubError::ApiError { .. } => "GitHub request failed. Please try again.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_connect() {
            NetworkError::ConnectionFailed(self.to_string())
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}
