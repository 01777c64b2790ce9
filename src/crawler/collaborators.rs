//! External collaborator interfaces
//!
//! The planner never talks to the network, a classifier, or an advisor; it
//! only reacts to their outputs. These traits are the boundary where the
//! driver plugs in real implementations (or scripted ones in tests).

use crate::crawler::state::{Adaptation, PageType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result of rendering one URL
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// The page rendered; `final_url` reflects any redirects
    Success { html: String, final_url: String },

    /// The fetch failed (network error, timeout, unresolvable host)
    Failed { error: String },
}

/// Renders a URL and returns raw HTML plus the final URL
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> FetchOutcome;
}

/// Labels fetched HTML with a page type
///
/// Any method goes (heuristics or a model); the planner only ever consumes
/// the label.
pub trait PageClassifier: Send + Sync {
    fn classify(&self, html: &str, url: &str) -> PageType;
}

/// A structured job posting pulled out of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    pub title: String,
    pub url: String,
    pub location: Option<String>,
}

/// Turns HTML into structured postings
///
/// Only the posting count feeds back into planning; the postings themselves
/// flow to storage.
#[async_trait]
pub trait JobExtractor: Send + Sync {
    async fn extract(&self, html: &str, url: &str) -> Vec<JobPosting>;
}

/// Summary of one visit handed to the advisor
#[derive(Debug, Clone, Serialize)]
pub struct VisitSummary<'a> {
    pub url: &'a str,
    pub page_type: PageType,
    pub jobs_count: u32,
    pub error: Option<&'a str>,
    pub retry_count: u32,
    pub url_correction_attempts: u32,
}

/// Raw advisor output, before ingestion normalization
///
/// The adaptation arrives as a free-form string (the advisor may be an LLM);
/// `normalize` is the single boundary that maps it into the closed
/// `Adaptation` enum. Unrecognized tags become no adaptation at all, so the
/// planner never sees an invalid tag.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawAdvice {
    pub adaptation: Option<String>,
    pub suggested_url: Option<String>,
    pub wait_ms: Option<u64>,
    pub cycle_delay_seconds: Option<u64>,
}

impl RawAdvice {
    pub fn normalize(self) -> AdvisorDecision {
        AdvisorDecision {
            adaptation: self.adaptation.as_deref().and_then(Adaptation::from_tag),
            suggested_url: self.suggested_url,
            wait_ms: self.wait_ms,
            cycle_delay_seconds: self.cycle_delay_seconds,
        }
    }
}

/// Normalized advisor output consumed by the driver
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvisorDecision {
    pub adaptation: Option<Adaptation>,
    pub suggested_url: Option<String>,
    pub wait_ms: Option<u64>,
    pub cycle_delay_seconds: Option<u64>,
}

/// Proposes a next-step hint from the outcome of one visit
#[async_trait]
pub trait Advisor: Send + Sync {
    async fn advise(&self, summary: &VisitSummary<'_>) -> RawAdvice;
}

/// Deterministic fallback advisor
///
/// Maps visit outcomes to adaptations with fixed rules so the engine runs
/// without a model in the loop: blocking pages escalate to a human, fetch
/// errors suggest a URL correction, and an empty extraction on a listing
/// page earns one retry hint.
#[derive(Debug, Default)]
pub struct RuleAdvisor;

#[async_trait]
impl Advisor for RuleAdvisor {
    async fn advise(&self, summary: &VisitSummary<'_>) -> RawAdvice {
        let adaptation = match summary.page_type {
            PageType::LoginWall => Some("login_wall_human"),
            PageType::CaptchaChallenge => Some("captcha_human_solve"),
            PageType::Error => Some("try_new_url"),
            PageType::Listing if summary.jobs_count == 0 && summary.error.is_none() => {
                Some("retry_extraction")
            }
            _ if summary.error.is_some() => Some("retry_cycle_soon"),
            _ => None,
        };

        RawAdvice {
            adaptation: adaptation.map(str::to_string),
            suggested_url: None,
            wait_ms: None,
            cycle_delay_seconds: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(page_type: PageType, jobs_count: u32) -> VisitSummary<'static> {
        VisitSummary {
            url: "https://acme.com/jobs",
            page_type,
            jobs_count,
            error: None,
            retry_count: 0,
            url_correction_attempts: 0,
        }
    }

    #[test]
    fn test_raw_advice_normalizes_known_tag() {
        let decision = RawAdvice {
            adaptation: Some("RETRY_EXTRACTION".to_string()),
            wait_ms: Some(2000),
            ..Default::default()
        }
        .normalize();

        assert_eq!(decision.adaptation, Some(Adaptation::RetryExtraction));
        assert_eq!(decision.wait_ms, Some(2000));
    }

    #[test]
    fn test_raw_advice_drops_unknown_tag() {
        let decision = RawAdvice {
            adaptation: Some("summon_wizard".to_string()),
            ..Default::default()
        }
        .normalize();

        assert_eq!(decision.adaptation, None);
    }

    #[tokio::test]
    async fn test_rule_advisor_escalates_blocking_pages() {
        let advisor = RuleAdvisor;

        let advice = advisor.advise(&summary(PageType::LoginWall, 0)).await;
        assert_eq!(
            advice.normalize().adaptation,
            Some(Adaptation::LoginWallHuman)
        );

        let advice = advisor.advise(&summary(PageType::CaptchaChallenge, 0)).await;
        assert_eq!(
            advice.normalize().adaptation,
            Some(Adaptation::CaptchaHumanSolve)
        );
    }

    #[tokio::test]
    async fn test_rule_advisor_retries_empty_listing() {
        let advisor = RuleAdvisor;
        let advice = advisor.advise(&summary(PageType::Listing, 0)).await;
        assert_eq!(
            advice.normalize().adaptation,
            Some(Adaptation::RetryExtraction)
        );
    }

    #[tokio::test]
    async fn test_rule_advisor_quiet_on_success() {
        let advisor = RuleAdvisor;
        let advice = advisor.advise(&summary(PageType::Listing, 12)).await;
        assert_eq!(advice.normalize().adaptation, None);
    }
}
