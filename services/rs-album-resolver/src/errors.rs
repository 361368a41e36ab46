//!
//! src/errors.rs  Andrew Belles  Oct 18th, 2025
//!
//! Defines enums and methods of error conversion
//! for errors the resolver uses
//!
//!

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolverError {
    #[error("config error: {0}")]
    Config(String),
    #[error("http error: {0}")]
    Http(String),
    #[error("timed out: {0}")]
    Timeout(String),
    #[error("{service} returned status {status}")]
    Status { service: &'static str, status: u16 },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error)
}

impl ResolverError {
    /// Upstream failures a guarded boundary may swallow
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ResolverError::Http(_) | ResolverError::Timeout(_) |
            ResolverError::Status { .. } | ResolverError::Parse(_) |
            ResolverError::NotFound(_)
        )
    }
}

impl From<reqwest::Error> for ResolverError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ResolverError::Timeout(e.to_string())
        } else if e.is_decode() {
            ResolverError::Parse(e.to_string())
        } else {
            ResolverError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ResolverError {
    fn from(e: serde_json::Error) -> Self { ResolverError::Parse(e.to_string()) }
}

impl From<tokio::time::error::Elapsed> for ResolverError {
    fn from(e: tokio::time::error::Elapsed) -> Self { ResolverError::Timeout(e.to_string()) }
}
