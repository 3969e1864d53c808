//! Client configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use std::{path::PathBuf, time::Duration};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SESSION_FILE: &str = ".film_tickets/session.json";
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Complete client configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the ticketing API, including any path prefix
    pub api_url: String,
    /// Where the session is persisted; `None` keeps it in memory
    pub session_file: Option<PathBuf>,
    /// Films per catalog page
    pub page_size: u32,
    /// Per-request timeout; `None` waits as long as the transport allows
    pub request_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: Some(PathBuf::from(DEFAULT_SESSION_FILE)),
            page_size: DEFAULT_PAGE_SIZE,
            request_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `api_url_override` - API URL from the command line
    /// * `session_file_override` - Session file from the command line
    /// * `in_memory` - Do not persist the session at all
    ///
    /// # Errors
    ///
    /// Returns error if `FILMS_REQUEST_TIMEOUT_SECS` is set but not a number
    pub fn from_env(
        api_url_override: Option<String>,
        session_file_override: Option<PathBuf>,
        in_memory: bool,
    ) -> Result<Self, ConfigError> {
        let api_url = api_url_override
            .or_else(|| std::env::var("FILMS_API_URL").ok())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let session_file = if in_memory {
            None
        } else {
            Some(
                session_file_override
                    .or_else(|| std::env::var("FILMS_SESSION_FILE").ok().map(PathBuf::from))
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_FILE)),
            )
        };

        let request_timeout = match std::env::var("FILMS_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => {
                let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "FILMS_REQUEST_TIMEOUT_SECS".to_string(),
                    reason: format!("'{raw}' is not a number of seconds"),
                })?;
                Some(Duration::from_secs(secs))
            }
            Err(_) => None,
        };

        Ok(ClientConfig {
            api_url,
            session_file,
            page_size: parse_env_or("FILMS_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            request_timeout,
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(ConfigError::Invalid {
                var: "FILMS_API_URL".to_string(),
                reason: format!("'{}' must start with http:// or https://", self.api_url),
            });
        }

        if self.page_size == 0 || self.page_size > 100 {
            return Err(ConfigError::Invalid {
                var: "FILMS_PAGE_SIZE".to_string(),
                reason: "Must be between 1 and 100".to_string(),
            });
        }

        if self.request_timeout == Some(Duration::ZERO) {
            return Err(ConfigError::Invalid {
                var: "FILMS_REQUEST_TIMEOUT_SECS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback
fn parse_env_or<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
