//! Jobtrail: a resilient job-posting crawl orchestrator
//!
//! This crate implements the crawl engine for discovering job postings on
//! company career sites and boards, tolerating hostile pages (bot walls,
//! login gates, broken URLs) through a deterministic planner, bounded
//! adaptive retries, and human-in-the-loop escalation.

pub mod config;
pub mod crawler;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for Jobtrail operations
#[derive(Debug, Error)]
pub enum JobtrailError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    StorageError(#[from] storage::StorageError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Human handoff error: {0}")]
    Gate(#[from] GateError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised by the human-handoff gate
#[derive(Debug, Error)]
pub enum GateError {
    #[error("A human handoff is already pending on the {0} gate")]
    AlreadyPending(&'static str),

    #[error("No human handoff is pending on the {0} gate")]
    NothingPending(&'static str),

    #[error("Handoff cancelled: {0}")]
    Cancelled(String),

    #[error("Handoff channel closed before resolution")]
    ChannelClosed,
}

/// Result type alias for Jobtrail operations
pub type Result<T> = std::result::Result<T, JobtrailError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{plan, Action, Adaptation, CrawlState, Driver, HandoffGate, PageType};
pub use url::{estimate_priority, extract_host, generate_pagination_seeds, normalize_url};
