use crate::crawler::CrawlLimits;
use serde::Deserialize;

/// Main configuration structure for Jobtrail
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    #[serde(default, rename = "source")]
    pub sources: Vec<SourceEntry>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// Maximum link depth from each source seed
    #[serde(rename = "max-depth", default = "default_max_depth")]
    pub max_depth: u32,

    /// Maximum extraction retries per URL
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Maximum URL-correction attempts per source
    #[serde(
        rename = "max-url-correction-attempts",
        default = "default_max_url_correction_attempts"
    )]
    pub max_url_correction_attempts: u32,

    /// Consecutive zero-job visits before a cycle stops (0 disables)
    #[serde(
        rename = "max-consecutive-zero-job-visits",
        default = "default_max_consecutive_zero_job_visits"
    )]
    pub max_consecutive_zero_job_visits: u32,

    /// Pages seeded per listing URL, including page 1
    #[serde(rename = "max-pagination-pages", default = "default_max_pagination_pages")]
    pub max_pagination_pages: u32,

    /// Default wait before an extraction retry (milliseconds)
    #[serde(rename = "retry-wait-ms", default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_depth() -> u32 {
    3
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_url_correction_attempts() -> u32 {
    5
}

fn default_max_consecutive_zero_job_visits() -> u32 {
    15
}

fn default_max_pagination_pages() -> u32 {
    5
}

fn default_retry_wait_ms() -> u64 {
    10_000
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_retries: default_max_retries(),
            max_url_correction_attempts: default_max_url_correction_attempts(),
            max_consecutive_zero_job_visits: default_max_consecutive_zero_job_visits(),
            max_pagination_pages: default_max_pagination_pages(),
            retry_wait_ms: default_retry_wait_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl CrawlerConfig {
    /// Converts config fields into the limits the planner consults
    ///
    /// A zero `max-consecutive-zero-job-visits` disables the exhaustion
    /// stop and keeps the counter as telemetry only.
    pub fn limits(&self) -> CrawlLimits {
        CrawlLimits {
            max_depth: self.max_depth,
            max_retries: self.max_retries,
            max_url_correction_attempts: self.max_url_correction_attempts,
            max_consecutive_zero_job_visits: if self.max_consecutive_zero_job_visits == 0 {
                None
            } else {
                Some(self.max_consecutive_zero_job_visits)
            },
            max_pagination_pages: self.max_pagination_pages,
            default_retry_wait_ms: self.retry_wait_ms,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the User-Agent header string
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// A crawl source: one company career site or board
#[derive(Debug, Clone, Deserialize)]
pub struct SourceEntry {
    /// Display name for the source
    pub name: String,

    /// Seed URL where crawling starts
    pub url: String,
}
