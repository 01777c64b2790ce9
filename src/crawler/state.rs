//! Crawl state for one source
//!
//! This module defines the page-type and adaptation enums, the outcome of a
//! single visit, and `CrawlState`: the unit the planner operates on. One
//! `CrawlState` exists per source and is owned by exactly one driver loop;
//! nothing in it is shared across sources.

use crate::crawler::frontier::{Frontier, FrontierItem};
use crate::url::{
    extract_host, filter_links, generate_pagination_seeds, normalize_url, FilterContext,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Classifier label for a fetched page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageType {
    /// A page listing multiple job postings
    Listing,

    /// A company careers/overview page
    CompanyCareers,

    /// A single job posting
    Detail,

    /// A login form is blocking the content
    LoginWall,

    /// A CAPTCHA challenge is blocking the content
    CaptchaChallenge,

    /// An error page (404, 5xx splash, broken URL)
    Error,

    /// Anything else
    Other,
}

impl PageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::CompanyCareers => "company_careers",
            Self::Detail => "detail",
            Self::LoginWall => "login_wall",
            Self::CaptchaChallenge => "captcha_challenge",
            Self::Error => "error",
            Self::Other => "other",
        }
    }

    /// Parses a classifier label; unknown labels map to `Other`
    pub fn parse(s: &str) -> Self {
        match s {
            "listing" => Self::Listing,
            "company_careers" => Self::CompanyCareers,
            "detail" => Self::Detail,
            "login_wall" => Self::LoginWall,
            "captcha_challenge" => Self::CaptchaChallenge,
            "error" => Self::Error,
            _ => Self::Other,
        }
    }

    /// Returns true if this page type blocks automated crawling
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::LoginWall | Self::CaptchaChallenge)
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advisor hint instructing the planner to deviate from default exploration
///
/// This is a closed enum: advisor output is normalized at the ingestion
/// boundary and unrecognized tags become `None`, so the planner never sees
/// an invalid tag. A tag is consumed exactly once per planning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adaptation {
    /// Re-fetch the same URL after a wait
    RetryExtraction,

    /// The URL is wrong; try a corrected one
    TryNewUrl,

    /// A human must solve a CAPTCHA
    CaptchaHumanSolve,

    /// A human must log in
    LoginWallHuman,

    /// Not fatal; keep exploring the frontier
    RetryCycleSoon,
}

impl Adaptation {
    /// Parses a raw advisor tag; unrecognized input yields `None`
    ///
    /// Accepts both `snake_case` and `SCREAMING_CASE` spellings since the
    /// advisor side is free-form.
    pub fn from_tag(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "retry_extraction" => Some(Self::RetryExtraction),
            "try_new_url" => Some(Self::TryNewUrl),
            "captcha_human_solve" => Some(Self::CaptchaHumanSolve),
            "login_wall_human" => Some(Self::LoginWallHuman),
            "retry_cycle_soon" => Some(Self::RetryCycleSoon),
            _ => None,
        }
    }
}

/// Outcome of the most recently executed action
///
/// Produced once per executed action by the driver loop, consumed by exactly
/// one planner call, then discarded or replaced.
#[derive(Debug, Clone, Default)]
pub struct VisitOutcome {
    /// Sequential id of the capture within this cycle
    pub capture_id: u64,

    /// Classifier label, if the page was classified
    pub page_type: Option<PageType>,

    /// Number of job postings extracted from the page
    pub jobs_count: u32,

    /// Fetch/extraction error, if any
    pub error: Option<String>,

    /// Advisor hint for the next planning step
    pub adaptation: Option<Adaptation>,

    /// Advisor-suggested replacement URL (for `TryNewUrl`)
    pub suggested_url: Option<String>,

    /// Advisor-suggested wait before retrying (for `RetryExtraction`)
    pub wait_ms: Option<u64>,

    /// The URL that was actually visited
    pub visited_url: Option<String>,

    /// Depth of the visited URL
    pub visited_depth: Option<u32>,
}

/// Bounded counters and limits consulted by the planner
#[derive(Debug, Clone)]
pub struct CrawlLimits {
    /// Maximum crawl depth from the source seed
    pub max_depth: u32,

    /// Maximum `RetryExtraction` attempts per URL
    pub max_retries: u32,

    /// Maximum URL-correction attempts per source
    pub max_url_correction_attempts: u32,

    /// Consecutive zero-job visits before the cycle stops; `None` tracks the
    /// counter without enforcing it
    pub max_consecutive_zero_job_visits: Option<u32>,

    /// Pages to seed per listing URL (page 1 is the listing itself)
    pub max_pagination_pages: u32,

    /// Wait before a retry when the advisor does not suggest one
    pub default_retry_wait_ms: u64,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_depth: 3,
            max_retries: 3,
            max_url_correction_attempts: 5,
            max_consecutive_zero_job_visits: Some(15),
            max_pagination_pages: 5,
            default_retry_wait_ms: 10_000,
        }
    }
}

/// Shared cooperative-cancellation flag for one crawl
///
/// Cloned handles may be held by operator surfaces (CLI signal handler,
/// admin channel); the planner checks the flag first on every step. Setting
/// it never interrupts an action already in flight.
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Aggregated crawl state for one source
///
/// Owns the frontier, the seen-set, the bounded retry counters, and the last
/// visit's outcome. Invariants: `url_seen` only ever contains normalized
/// forms and grows monotonically; every accepted frontier pop adds exactly
/// one member to `url_seen` and resets `retry_count` to 0.
#[derive(Debug)]
pub struct CrawlState {
    /// Display name of the source (from config)
    pub source_name: String,

    /// The source's configured seed URL
    pub source_url: String,

    /// Domain of the source, used by the link filter
    pub source_domain: String,

    /// Pending work queue
    pub frontier: Frontier,

    /// Normalized URLs already visited in this cycle
    pub url_seen: HashSet<String>,

    /// URL-correction attempts made so far
    pub url_correction_attempts: u32,

    /// Retries for the current URL; reset on every accepted pop
    pub retry_count: u32,

    /// Consecutive visits that extracted zero jobs
    pub consecutive_zero_job_visits: u32,

    /// Outcome of the last executed action
    pub last_result: Option<VisitOutcome>,

    /// Bounded limits the planner consults
    pub limits: CrawlLimits,

    stop: StopHandle,
}

impl CrawlState {
    /// Creates the state for one source, seeding the frontier with the
    /// source URL at depth 0
    pub fn new(
        source_name: impl Into<String>,
        source_url: impl Into<String>,
        limits: CrawlLimits,
    ) -> crate::Result<Self> {
        let source_url = source_url.into();
        ::url::Url::parse(&source_url)?;
        let source_domain =
            extract_host(&source_url).ok_or(::url::ParseError::EmptyHost)?;

        let mut frontier = Frontier::new();
        frontier.push(FrontierItem::new(source_url.clone(), 0));

        Ok(Self {
            source_name: source_name.into(),
            source_url,
            source_domain,
            frontier,
            url_seen: HashSet::new(),
            url_correction_attempts: 0,
            retry_count: 0,
            consecutive_zero_job_visits: 0,
            last_result: None,
            limits,
            stop: StopHandle::new(),
        })
    }

    /// Replaces the stop handle with a shared one
    ///
    /// Lets an operator surface hold one handle that cancels whichever
    /// source is currently being crawled.
    pub fn with_stop_handle(mut self, handle: StopHandle) -> Self {
        self.stop = handle;
        self
    }

    /// Returns a clonable handle operator surfaces can use to cancel
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns whether cancellation has been requested
    pub fn stop_requested(&self) -> bool {
        self.stop.is_stopped()
    }

    /// Folds the outcome of an executed action back into state
    ///
    /// Updates the zero-job streak for real page visits and replaces
    /// `last_result` for the next planning step.
    pub fn record_outcome(&mut self, outcome: VisitOutcome) {
        if outcome.visited_url.is_some() {
            if outcome.jobs_count == 0 {
                self.consecutive_zero_job_visits += 1;
            } else {
                self.consecutive_zero_job_visits = 0;
            }
        }
        self.last_result = Some(outcome);
    }

    /// Runs discovered URLs through the link filter and queues survivors
    ///
    /// Returns the number of links admitted.
    pub fn admit_links(&mut self, candidates: &[String], current_depth: u32) -> usize {
        let frontier_urls = self.frontier.urls();
        let ctx = FilterContext {
            source_domain: &self.source_domain,
            url_seen: &self.url_seen,
            frontier_urls: &frontier_urls,
            current_depth,
            max_depth: self.limits.max_depth,
        };

        let links = filter_links(candidates, &ctx);
        let admitted = links.len();
        self.frontier
            .extend(links.into_iter().map(|l| FrontierItem::new(l.url, l.depth)));
        admitted
    }

    /// Seeds paginated variants of a listing URL into the frontier
    ///
    /// Seeds enter at the listing's own depth; already seen or queued pages
    /// are skipped. Returns the number of seeds queued.
    pub fn seed_pagination(&mut self, listing_url: &str, depth: u32) -> usize {
        let seeds = generate_pagination_seeds(listing_url, self.limits.max_pagination_pages);
        if seeds.is_empty() {
            return 0;
        }

        let queued: HashSet<String> = self
            .frontier
            .urls()
            .iter()
            .map(|u| normalize_url(u))
            .collect();

        let mut added = 0;
        for seed in seeds {
            let normalized = normalize_url(&seed);
            if self.url_seen.contains(&normalized) || queued.contains(&normalized) {
                continue;
            }
            self.frontier.push(FrontierItem::new(seed, depth));
            added += 1;
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_type_roundtrip() {
        for pt in [
            PageType::Listing,
            PageType::CompanyCareers,
            PageType::Detail,
            PageType::LoginWall,
            PageType::CaptchaChallenge,
            PageType::Error,
            PageType::Other,
        ] {
            assert_eq!(PageType::parse(pt.as_str()), pt);
        }
    }

    #[test]
    fn test_page_type_unknown_maps_to_other() {
        assert_eq!(PageType::parse("nonsense"), PageType::Other);
    }

    #[test]
    fn test_adaptation_from_tag() {
        assert_eq!(
            Adaptation::from_tag("retry_extraction"),
            Some(Adaptation::RetryExtraction)
        );
        assert_eq!(
            Adaptation::from_tag("RETRY_EXTRACTION"),
            Some(Adaptation::RetryExtraction)
        );
        assert_eq!(
            Adaptation::from_tag("  login_wall_human "),
            Some(Adaptation::LoginWallHuman)
        );
    }

    #[test]
    fn test_adaptation_unrecognized_is_none() {
        assert_eq!(Adaptation::from_tag("reboot_the_modem"), None);
        assert_eq!(Adaptation::from_tag(""), None);
    }

    #[test]
    fn test_new_state_seeds_frontier() {
        let state =
            CrawlState::new("acme", "https://careers.acme.com/jobs", CrawlLimits::default())
                .unwrap();

        assert_eq!(state.source_domain, "careers.acme.com");
        assert_eq!(state.frontier.len(), 1);
        assert!(state.url_seen.is_empty());
    }

    #[test]
    fn test_new_state_rejects_bad_url() {
        assert!(CrawlState::new("bad", "not a url", CrawlLimits::default()).is_err());
    }

    #[test]
    fn test_zero_job_streak() {
        let mut state =
            CrawlState::new("acme", "https://acme.com/jobs", CrawlLimits::default()).unwrap();

        for _ in 0..3 {
            state.record_outcome(VisitOutcome {
                visited_url: Some("https://acme.com/about".to_string()),
                jobs_count: 0,
                ..Default::default()
            });
        }
        assert_eq!(state.consecutive_zero_job_visits, 3);

        state.record_outcome(VisitOutcome {
            visited_url: Some("https://acme.com/jobs".to_string()),
            jobs_count: 7,
            ..Default::default()
        });
        assert_eq!(state.consecutive_zero_job_visits, 0);
    }

    #[test]
    fn test_non_visit_outcome_keeps_streak() {
        let mut state =
            CrawlState::new("acme", "https://acme.com/jobs", CrawlLimits::default()).unwrap();

        state.record_outcome(VisitOutcome {
            visited_url: Some("https://acme.com/about".to_string()),
            jobs_count: 0,
            ..Default::default()
        });
        // Gate resolution without a page visit attached
        state.record_outcome(VisitOutcome::default());

        assert_eq!(state.consecutive_zero_job_visits, 1);
    }

    #[test]
    fn test_admit_links_filters_and_queues() {
        let mut state =
            CrawlState::new("acme", "https://acme.com/jobs", CrawlLimits::default()).unwrap();

        let admitted = state.admit_links(
            &[
                "https://acme.com/jobs/123".to_string(),
                "https://elsewhere.io/jobs".to_string(),
                "https://acme.com/login".to_string(),
            ],
            0,
        );

        assert_eq!(admitted, 1);
        assert_eq!(state.frontier.len(), 2); // seed + one admitted link
    }

    #[test]
    fn test_seed_pagination_skips_queued() {
        let mut state =
            CrawlState::new("acme", "https://acme.com/jobs", CrawlLimits::default()).unwrap();

        let added = state.seed_pagination("https://acme.com/jobs", 0);
        assert_eq!(added, state.limits.max_pagination_pages as usize - 1);

        // Seeding again adds nothing: pages are already queued
        let again = state.seed_pagination("https://acme.com/jobs", 0);
        assert_eq!(again, 0);
    }

    #[test]
    fn test_stop_handle_is_shared() {
        let state =
            CrawlState::new("acme", "https://acme.com/jobs", CrawlLimits::default()).unwrap();
        let handle = state.stop_handle();

        assert!(!state.stop_requested());
        handle.request_stop();
        assert!(state.stop_requested());
    }
}
